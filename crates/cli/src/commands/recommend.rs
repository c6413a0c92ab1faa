use std::sync::Arc;

use basket_core::config::{AppConfig, LoadOptions};
use basket_core::errors::RecommendError;
use basket_core::recommend::{OptionOverrides, RecommendOptions, RecommendationEngine};
use basket_core::rules::{RuleSource, RuleStore};

use super::{
    CommandResult, EXIT_CONFIG, EXIT_INTERNAL, EXIT_INVALID_INPUT, EXIT_STORE_UNAVAILABLE,
};

const COMMAND: &str = "recommend";

pub fn run(items: &[String], overrides: OptionOverrides) -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::failure(
                COMMAND,
                "config_validation",
                error.to_string(),
                EXIT_CONFIG,
            );
        }
    };

    let store = RuleStore::load(&RuleSource::File(config.rules.artifact_path.clone()));
    let engine =
        RecommendationEngine::new(Arc::new(store), RecommendOptions::from(&config.recommend));

    match engine.recommend_with(items, &overrides) {
        Ok(result) => {
            let message = if result.fallback_applied {
                format!("{} popular items (no rule matched)", result.count)
            } else {
                format!("{} items from {} rules", result.count, result.rules_used)
            };
            match serde_json::to_value(&result) {
                Ok(data) => CommandResult::success_with_data(COMMAND, message, Some(data)),
                Err(error) => CommandResult::failure(
                    COMMAND,
                    "serialization",
                    error.to_string(),
                    EXIT_INTERNAL,
                ),
            }
        }
        Err(error) => {
            let exit_code = match error {
                RecommendError::InvalidInput(_) => EXIT_INVALID_INPUT,
                RecommendError::StoreUnavailable(_) => EXIT_STORE_UNAVAILABLE,
                RecommendError::Internal(_) => EXIT_INTERNAL,
            };
            CommandResult::failure(COMMAND, error.error_class(), error.to_string(), exit_code)
        }
    }
}
