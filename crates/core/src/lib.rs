pub mod config;
pub mod errors;
pub mod recommend;
pub mod rules;

pub use config::{AppConfig, ConfigError, ConfigOverrides, LoadOptions, LogFormat};
pub use errors::{InterfaceError, RecommendError};
pub use recommend::{
    recommend, FallbackPolicy, OptionOverrides, RecommendOptions, RecommendationEngine,
    RecommendationResult,
};
pub use rules::{LoadReport, Rule, RuleLoadError, RuleSource, RuleStore};
