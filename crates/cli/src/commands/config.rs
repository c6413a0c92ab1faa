use std::env;
use std::fs;
use std::path::Path;

use basket_core::config::{detect_config_path, AppConfig, LoadOptions};
use toml::Value;

use super::{CommandResult, EXIT_CONFIG, EXIT_OK};

pub fn run() -> CommandResult {
    let config = match AppConfig::load(LoadOptions::default()) {
        Ok(config) => config,
        Err(error) => {
            return CommandResult::text(EXIT_CONFIG, format!("config validation failed: {error}"))
        }
    };

    let config_file_path = detect_config_path();
    let config_file_doc = load_config_file_doc(config_file_path.as_deref());

    let fields = [
        field(
            "rules.artifact_path",
            config.rules.artifact_path.display().to_string(),
            &["BASKET_RULES_ARTIFACT_PATH"],
        ),
        field(
            "rules.require_available",
            config.rules.require_available.to_string(),
            &["BASKET_RULES_REQUIRE_AVAILABLE"],
        ),
        field(
            "recommend.min_confidence",
            config.recommend.min_confidence.to_string(),
            &["BASKET_RECOMMEND_MIN_CONFIDENCE"],
        ),
        field(
            "recommend.min_lift",
            config.recommend.min_lift.to_string(),
            &["BASKET_RECOMMEND_MIN_LIFT"],
        ),
        field(
            "recommend.max_results",
            config
                .recommend
                .max_results
                .map(|limit| limit.to_string())
                .unwrap_or_else(|| "<unset>".to_string()),
            &["BASKET_RECOMMEND_MAX_RESULTS"],
        ),
        field(
            "recommend.fallback_enabled",
            config.recommend.fallback_enabled.to_string(),
            &["BASKET_RECOMMEND_FALLBACK_ENABLED"],
        ),
        field(
            "recommend.fallback_items",
            format!("[{}]", config.recommend.fallback_items.join(", ")),
            &["BASKET_RECOMMEND_FALLBACK_ITEMS"],
        ),
        field(
            "server.bind_address",
            config.server.bind_address.clone(),
            &["BASKET_SERVER_BIND_ADDRESS"],
        ),
        field("server.port", config.server.port.to_string(), &["BASKET_SERVER_PORT"]),
        field(
            "server.graceful_shutdown_secs",
            config.server.graceful_shutdown_secs.to_string(),
            &["BASKET_SERVER_GRACEFUL_SHUTDOWN_SECS"],
        ),
        field(
            "logging.level",
            config.logging.level.clone(),
            &["BASKET_LOGGING_LEVEL", "BASKET_LOG_LEVEL"],
        ),
        field(
            "logging.format",
            format!("{:?}", config.logging.format),
            &["BASKET_LOGGING_FORMAT", "BASKET_LOG_FORMAT"],
        ),
    ];

    let mut lines = vec!["effective config (source precedence: env > file > default):".to_string()];
    for (key, value, env_keys) in fields {
        let source =
            field_source(key, env_keys, config_file_doc.as_ref(), config_file_path.as_deref());
        lines.push(render_line(key, &value, source));
    }

    CommandResult::text(EXIT_OK, lines.join("\n"))
}

fn field(
    key: &'static str,
    value: String,
    env_keys: &'static [&'static str],
) -> (&'static str, String, &'static [&'static str]) {
    (key, value, env_keys)
}

fn load_config_file_doc(path: Option<&Path>) -> Option<Value> {
    let path = path?;
    let raw = fs::read_to_string(path).ok()?;
    raw.parse::<Value>().ok()
}

fn field_source(
    key_path: &str,
    env_keys: &[&str],
    config_file_doc: Option<&Value>,
    config_file_path: Option<&Path>,
) -> String {
    if let Some(env_key) = env_keys.iter().find(|key| env::var_os(key).is_some()) {
        return format!("env ({env_key})");
    }

    if let Some(doc) = config_file_doc {
        if contains_path(doc, key_path) {
            let file_path = config_file_path
                .map(|path| path.display().to_string())
                .unwrap_or_else(|| "config file".to_string());
            return format!("file ({file_path})");
        }
    }

    "default".to_string()
}

fn contains_path(root: &Value, key_path: &str) -> bool {
    let mut current = root;
    for key in key_path.split('.') {
        let Some(next) = current.get(key) else {
            return false;
        };
        current = next;
    }
    true
}

fn render_line(key: &str, value: &str, source: String) -> String {
    format!("- {key} = {value} (source: {source})")
}

#[cfg(test)]
mod tests {
    use toml::Value;

    use super::{contains_path, field_source};

    #[test]
    fn file_source_is_reported_for_keys_present_in_document() {
        let doc: Value = "[recommend]\nmin_lift = 1.2\n".parse().expect("toml");

        assert!(contains_path(&doc, "recommend.min_lift"));
        assert!(!contains_path(&doc, "recommend.min_confidence"));
        assert_eq!(
            field_source("recommend.min_lift", &["BASKET_TEST_NEVER_SET"], Some(&doc), None),
            "file (config file)"
        );
        assert_eq!(
            field_source("server.port", &["BASKET_TEST_NEVER_SET"], Some(&doc), None),
            "default"
        );
    }
}
