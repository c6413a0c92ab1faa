use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq)]
pub struct AppConfig {
    pub rules: RulesConfig,
    pub recommend: RecommendConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RulesConfig {
    pub artifact_path: PathBuf,
    pub require_available: bool,
}

#[derive(Clone, Debug, PartialEq)]
pub struct RecommendConfig {
    pub min_confidence: f64,
    pub min_lift: f64,
    pub max_results: Option<usize>,
    pub fallback_enabled: bool,
    pub fallback_items: Vec<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_address: String,
    pub port: u16,
    pub graceful_shutdown_secs: u64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    pub artifact_path: Option<PathBuf>,
    pub require_available: Option<bool>,
    pub min_confidence: Option<f64>,
    pub min_lift: Option<f64>,
    pub max_results: Option<usize>,
    pub bind_address: Option<String>,
    pub port: Option<u16>,
    pub log_level: Option<String>,
    pub log_format: Option<LogFormat>,
}

#[derive(Clone, Debug, Default)]
pub struct LoadOptions {
    pub config_path: Option<PathBuf>,
    pub require_file: bool,
    pub overrides: ConfigOverrides,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file `{path}`: {source}")]
    ReadFile { path: PathBuf, source: std::io::Error },
    #[error("could not parse config file `{path}`: {source}")]
    ParseFile { path: PathBuf, source: toml::de::Error },
    #[error("required config file was not found: `{0}`")]
    MissingConfigFile(PathBuf),
    #[error("environment variable interpolation failed for `{var}`")]
    MissingEnvInterpolation { var: String },
    #[error("unterminated environment interpolation expression")]
    UnterminatedInterpolation,
    #[error("invalid environment override for `{key}`: `{value}`")]
    InvalidEnvOverride { key: String, value: String },
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            min_confidence: crate::recommend::DEFAULT_MIN_CONFIDENCE,
            min_lift: crate::recommend::DEFAULT_MIN_LIFT,
            max_results: None,
            fallback_enabled: false,
            fallback_items: Vec::new(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            rules: RulesConfig {
                artifact_path: PathBuf::from("models/association_rules.json"),
                require_available: false,
            },
            recommend: RecommendConfig::default(),
            server: ServerConfig {
                bind_address: "127.0.0.1".to_string(),
                port: 5000,
                graceful_shutdown_secs: 15,
            },
            logging: LoggingConfig { level: "info".to_string(), format: LogFormat::Compact },
        }
    }
}

impl std::str::FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "pretty" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(ConfigError::Validation(format!(
                "unsupported log format `{other}` (expected compact|pretty|json)"
            ))),
        }
    }
}

impl AppConfig {
    pub fn load(options: LoadOptions) -> Result<Self, ConfigError> {
        let mut config = Self::default();
        let maybe_path = resolve_config_path(options.config_path.as_deref());

        if let Some(path) = maybe_path {
            let patch = read_patch(&path)?;
            config.apply_patch(patch);
        } else if options.require_file {
            let expected = options.config_path.unwrap_or_else(|| PathBuf::from("basket.toml"));
            return Err(ConfigError::MissingConfigFile(expected));
        }

        config.apply_env_overrides()?;
        config.apply_overrides(options.overrides);
        config.validate()?;

        Ok(config)
    }

    fn apply_patch(&mut self, patch: ConfigPatch) {
        if let Some(rules) = patch.rules {
            if let Some(artifact_path) = rules.artifact_path {
                self.rules.artifact_path = artifact_path;
            }
            if let Some(require_available) = rules.require_available {
                self.rules.require_available = require_available;
            }
        }

        if let Some(recommend) = patch.recommend {
            if let Some(min_confidence) = recommend.min_confidence {
                self.recommend.min_confidence = min_confidence;
            }
            if let Some(min_lift) = recommend.min_lift {
                self.recommend.min_lift = min_lift;
            }
            if let Some(max_results) = recommend.max_results {
                self.recommend.max_results = Some(max_results);
            }
            if let Some(fallback_enabled) = recommend.fallback_enabled {
                self.recommend.fallback_enabled = fallback_enabled;
            }
            if let Some(fallback_items) = recommend.fallback_items {
                self.recommend.fallback_items = fallback_items;
            }
        }

        if let Some(server) = patch.server {
            if let Some(bind_address) = server.bind_address {
                self.server.bind_address = bind_address;
            }
            if let Some(port) = server.port {
                self.server.port = port;
            }
            if let Some(graceful_shutdown_secs) = server.graceful_shutdown_secs {
                self.server.graceful_shutdown_secs = graceful_shutdown_secs;
            }
        }

        if let Some(logging) = patch.logging {
            if let Some(level) = logging.level {
                self.logging.level = level;
            }
            if let Some(format) = logging.format {
                self.logging.format = format;
            }
        }
    }

    fn apply_env_overrides(&mut self) -> Result<(), ConfigError> {
        if let Some(value) = read_env("BASKET_RULES_ARTIFACT_PATH") {
            self.rules.artifact_path = PathBuf::from(value);
        }
        if let Some(value) = read_env("BASKET_RULES_REQUIRE_AVAILABLE") {
            self.rules.require_available = parse_bool("BASKET_RULES_REQUIRE_AVAILABLE", &value)?;
        }

        if let Some(value) = read_env("BASKET_RECOMMEND_MIN_CONFIDENCE") {
            self.recommend.min_confidence = parse_f64("BASKET_RECOMMEND_MIN_CONFIDENCE", &value)?;
        }
        if let Some(value) = read_env("BASKET_RECOMMEND_MIN_LIFT") {
            self.recommend.min_lift = parse_f64("BASKET_RECOMMEND_MIN_LIFT", &value)?;
        }
        if let Some(value) = read_env("BASKET_RECOMMEND_MAX_RESULTS") {
            self.recommend.max_results = Some(parse_usize("BASKET_RECOMMEND_MAX_RESULTS", &value)?);
        }
        if let Some(value) = read_env("BASKET_RECOMMEND_FALLBACK_ENABLED") {
            self.recommend.fallback_enabled =
                parse_bool("BASKET_RECOMMEND_FALLBACK_ENABLED", &value)?;
        }
        if let Some(value) = read_env("BASKET_RECOMMEND_FALLBACK_ITEMS") {
            self.recommend.fallback_items = value
                .split(',')
                .map(str::trim)
                .filter(|item| !item.is_empty())
                .map(str::to_string)
                .collect();
        }

        if let Some(value) = read_env("BASKET_SERVER_BIND_ADDRESS") {
            self.server.bind_address = value;
        }
        if let Some(value) = read_env("BASKET_SERVER_PORT") {
            self.server.port = parse_u16("BASKET_SERVER_PORT", &value)?;
        }
        if let Some(value) = read_env("BASKET_SERVER_GRACEFUL_SHUTDOWN_SECS") {
            self.server.graceful_shutdown_secs =
                parse_u64("BASKET_SERVER_GRACEFUL_SHUTDOWN_SECS", &value)?;
        }

        let log_level = read_env("BASKET_LOGGING_LEVEL").or_else(|| read_env("BASKET_LOG_LEVEL"));
        if let Some(value) = log_level {
            self.logging.level = value;
        }
        let log_format =
            read_env("BASKET_LOGGING_FORMAT").or_else(|| read_env("BASKET_LOG_FORMAT"));
        if let Some(value) = log_format {
            self.logging.format = value.parse()?;
        }

        Ok(())
    }

    fn apply_overrides(&mut self, overrides: ConfigOverrides) {
        if let Some(artifact_path) = overrides.artifact_path {
            self.rules.artifact_path = artifact_path;
        }
        if let Some(require_available) = overrides.require_available {
            self.rules.require_available = require_available;
        }
        if let Some(min_confidence) = overrides.min_confidence {
            self.recommend.min_confidence = min_confidence;
        }
        if let Some(min_lift) = overrides.min_lift {
            self.recommend.min_lift = min_lift;
        }
        if let Some(max_results) = overrides.max_results {
            self.recommend.max_results = Some(max_results);
        }
        if let Some(bind_address) = overrides.bind_address {
            self.server.bind_address = bind_address;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        if let Some(log_level) = overrides.log_level {
            self.logging.level = log_level;
        }
        if let Some(log_format) = overrides.log_format {
            self.logging.format = log_format;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_rules(&self.rules)?;
        validate_recommend(&self.recommend)?;
        validate_server(&self.server)?;
        validate_logging(&self.logging)?;
        Ok(())
    }
}

pub(crate) fn resolve_config_path(explicit_path: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit_path {
        return path.exists().then_some(path.to_path_buf());
    }

    [PathBuf::from("basket.toml"), PathBuf::from("config/basket.toml")]
        .into_iter()
        .find(|path| path.exists())
}

/// Config file the default load would pick up, if any.
pub fn detect_config_path() -> Option<PathBuf> {
    resolve_config_path(None)
}

fn read_patch(path: &Path) -> Result<ConfigPatch, ConfigError> {
    let raw = fs::read_to_string(path)
        .map_err(|source| ConfigError::ReadFile { path: path.to_path_buf(), source })?;

    let interpolated = interpolate_env_vars(&raw)?;
    toml::from_str::<ConfigPatch>(&interpolated)
        .map_err(|source| ConfigError::ParseFile { path: path.to_path_buf(), source })
}

fn interpolate_env_vars(input: &str) -> Result<String, ConfigError> {
    let mut output = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch == '$' && matches!(chars.peek(), Some('{')) {
            chars.next();
            let mut key = String::new();

            loop {
                match chars.next() {
                    Some('}') => break,
                    Some(next) => key.push(next),
                    None => return Err(ConfigError::UnterminatedInterpolation),
                }
            }

            let value = env::var(&key)
                .map_err(|_| ConfigError::MissingEnvInterpolation { var: key.clone() })?;
            output.push_str(&value);
            continue;
        }

        output.push(ch);
    }

    Ok(output)
}

fn validate_rules(rules: &RulesConfig) -> Result<(), ConfigError> {
    if rules.artifact_path.as_os_str().is_empty() {
        return Err(ConfigError::Validation("rules.artifact_path must not be empty".to_string()));
    }

    Ok(())
}

fn validate_recommend(recommend: &RecommendConfig) -> Result<(), ConfigError> {
    if !recommend.min_confidence.is_finite() || !(0.0..=1.0).contains(&recommend.min_confidence) {
        return Err(ConfigError::Validation(
            "recommend.min_confidence must be in range 0.0..=1.0".to_string(),
        ));
    }

    if !recommend.min_lift.is_finite() || recommend.min_lift < 0.0 {
        return Err(ConfigError::Validation(
            "recommend.min_lift must be a non-negative number".to_string(),
        ));
    }

    if recommend.max_results == Some(0) {
        return Err(ConfigError::Validation(
            "recommend.max_results must be greater than zero when set".to_string(),
        ));
    }

    if recommend.fallback_enabled
        && recommend.fallback_items.iter().all(|item| item.trim().is_empty())
    {
        return Err(ConfigError::Validation(
            "recommend.fallback_enabled is true but recommend.fallback_items is empty"
                .to_string(),
        ));
    }

    Ok(())
}

fn validate_server(server: &ServerConfig) -> Result<(), ConfigError> {
    if server.bind_address.trim().is_empty() {
        return Err(ConfigError::Validation("server.bind_address must not be empty".to_string()));
    }

    if server.port == 0 {
        return Err(ConfigError::Validation("server.port must be greater than zero".to_string()));
    }

    if server.graceful_shutdown_secs == 0 {
        return Err(ConfigError::Validation(
            "server.graceful_shutdown_secs must be greater than zero".to_string(),
        ));
    }

    Ok(())
}

fn validate_logging(logging: &LoggingConfig) -> Result<(), ConfigError> {
    let level = logging.level.trim().to_ascii_lowercase();
    match level.as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => Ok(()),
        _ => Err(ConfigError::Validation(
            "logging.level must be one of trace|debug|info|warn|error".to_string(),
        )),
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn parse_u16(key: &str, value: &str) -> Result<u16, ConfigError> {
    value.trim().parse::<u16>().map_err(|_| invalid_override(key, value))
}

fn parse_u64(key: &str, value: &str) -> Result<u64, ConfigError> {
    value.trim().parse::<u64>().map_err(|_| invalid_override(key, value))
}

fn parse_usize(key: &str, value: &str) -> Result<usize, ConfigError> {
    value.trim().parse::<usize>().map_err(|_| invalid_override(key, value))
}

fn parse_f64(key: &str, value: &str) -> Result<f64, ConfigError> {
    value.trim().parse::<f64>().map_err(|_| invalid_override(key, value))
}

fn parse_bool(key: &str, value: &str) -> Result<bool, ConfigError> {
    value.trim().parse::<bool>().map_err(|_| invalid_override(key, value))
}

fn invalid_override(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidEnvOverride { key: key.to_string(), value: value.to_string() }
}

#[derive(Debug, Default, Deserialize)]
struct ConfigPatch {
    rules: Option<RulesPatch>,
    recommend: Option<RecommendPatch>,
    server: Option<ServerPatch>,
    logging: Option<LoggingPatch>,
}

#[derive(Debug, Default, Deserialize)]
struct RulesPatch {
    artifact_path: Option<PathBuf>,
    require_available: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
struct RecommendPatch {
    min_confidence: Option<f64>,
    min_lift: Option<f64>,
    max_results: Option<usize>,
    fallback_enabled: Option<bool>,
    fallback_items: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize)]
struct ServerPatch {
    bind_address: Option<String>,
    port: Option<u16>,
    graceful_shutdown_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct LoggingPatch {
    level: Option<String>,
    format: Option<LogFormat>,
}
