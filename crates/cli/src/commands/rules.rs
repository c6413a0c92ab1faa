use basket_core::config::{AppConfig, LoadOptions};
use basket_core::rules::{LoadReport, RuleSource, RuleStore};
use serde::Serialize;

use super::{CommandResult, EXIT_CONFIG, EXIT_INTERNAL, EXIT_OK, EXIT_STORE_UNAVAILABLE};

#[derive(Debug, Serialize)]
struct RulesSummary<'a> {
    available: bool,
    size: usize,
    unavailable_reason: Option<&'a str>,
    report: &'a LoadReport,
}

pub fn run(json_output: bool) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                "rules",
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let store = RuleStore::load(&RuleSource::File(config.rules.artifact_path));
    let summary = RulesSummary {
        available: store.is_available(),
        size: store.size(),
        unavailable_reason: store.unavailable_reason(),
        report: store.report(),
    };
    let exit_code = if summary.available { EXIT_OK } else { EXIT_STORE_UNAVAILABLE };

    if json_output {
        let message = match summary.unavailable_reason {
            None => format!("{} rules loaded", summary.size),
            Some(reason) => format!("rule store unavailable: {reason}"),
        };
        return match serde_json::to_value(&summary) {
            Ok(data) if summary.available => {
                CommandResult::success_with_data("rules", message, Some(data))
            }
            Ok(_) => CommandResult::failure("rules", "store_unavailable", message, exit_code),
            Err(error) => {
                CommandResult::failure("rules", "serialization", error.to_string(), EXIT_INTERNAL)
            }
        };
    }

    CommandResult::text(exit_code, render_human(&summary))
}

fn render_human(summary: &RulesSummary<'_>) -> String {
    let report = summary.report;
    let mut lines = vec![format!("rule artifact: {}", report.origin)];

    match summary.unavailable_reason {
        None => lines.push(format!("status: available ({} rules)", summary.size)),
        Some(reason) => lines.push(format!("status: unavailable ({reason})")),
    }
    lines.push(format!("rows read: {}", report.rows_read));
    lines.push(format!("rows accepted: {}", report.accepted));
    lines.push(format!("rows rejected: {}", report.rejected.len()));

    for rejection in &report.rejected {
        lines.push(format!("  - row {}: {}", rejection.row, rejection.reason));
    }

    lines.join("\n")
}
