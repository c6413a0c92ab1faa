use std::path::PathBuf;
use std::sync::Arc;

use axum::Router;
use basket_core::config::{AppConfig, ConfigError};
use basket_core::recommend::{RecommendOptions, RecommendationEngine};
use basket_core::rules::{RuleSource, RuleStore};
use thiserror::Error;
use tracing::{info, warn};

use crate::{api, health, web};

pub struct Application {
    pub config: AppConfig,
    pub engine: Arc<RecommendationEngine>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("rule store `{path}` is unavailable and rules.require_available is set: {reason}")]
    RulesUnavailable { path: PathBuf, reason: String },
}

impl Application {
    /// Every route the service exposes, sharing one engine.
    pub fn router(&self) -> Router {
        Router::new()
            .merge(health::router(self.engine.clone()))
            .merge(api::router(self.engine.clone()))
            .merge(web::router(self.engine.clone()))
    }
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        artifact_path = %config.rules.artifact_path.display(),
        "starting application bootstrap"
    );

    let store = RuleStore::load(&RuleSource::File(config.rules.artifact_path.clone()));
    if store.is_available() {
        info!(
            event_name = "system.bootstrap.rules_loaded",
            correlation_id = "bootstrap",
            rules = store.size(),
            rejected_rows = store.report().rejected.len(),
            "rule store ready"
        );
    } else {
        let reason = store.unavailable_reason().unwrap_or("unknown").to_string();
        if config.rules.require_available {
            return Err(BootstrapError::RulesUnavailable {
                path: config.rules.artifact_path.clone(),
                reason,
            });
        }
        warn!(
            event_name = "system.bootstrap.rules_degraded",
            correlation_id = "bootstrap",
            reason = %reason,
            "starting without rules; recommendation requests will report the store as unavailable"
        );
    }

    let engine = RecommendationEngine::new(Arc::new(store), RecommendOptions::from(&config.recommend));
    Ok(Application { config, engine: Arc::new(engine) })
}
