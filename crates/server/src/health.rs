use std::sync::Arc;

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use basket_core::recommend::RecommendationEngine;
use basket_core::rules::RuleStore;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    engine: Arc<RecommendationEngine>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthCheck {
    pub status: &'static str,
    pub detail: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct RulesCheck {
    pub status: &'static str,
    pub detail: String,
    pub size: usize,
    pub rejected_rows: usize,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub service: HealthCheck,
    pub rules: RulesCheck,
    pub checked_at: String,
}

pub fn router(engine: Arc<RecommendationEngine>) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { engine })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let rules = rules_check(state.engine.store());
    let ready = rules.status == "ready";

    let payload = HealthResponse {
        status: if ready { "ready" } else { "degraded" },
        service: HealthCheck {
            status: "ready",
            detail: "basket-server runtime initialized".to_string(),
        },
        rules,
        checked_at: Utc::now().to_rfc3339(),
    };

    let status_code = if ready { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status_code, Json(payload))
}

fn rules_check(store: &RuleStore) -> RulesCheck {
    let rejected_rows = store.report().rejected.len();
    match store.unavailable_reason() {
        None => RulesCheck {
            status: "ready",
            detail: format!("{} rules loaded from {}", store.size(), store.report().origin),
            size: store.size(),
            rejected_rows,
        },
        Some(reason) => RulesCheck {
            status: "degraded",
            detail: format!("rule store unavailable: {reason}"),
            size: store.size(),
            rejected_rows,
        },
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode, Json};
    use basket_core::recommend::{RecommendOptions, RecommendationEngine};
    use basket_core::rules::{Rule, RuleSource, RuleStore};

    use crate::health::{health, HealthState};

    fn state(store: RuleStore) -> State<HealthState> {
        State(HealthState {
            engine: Arc::new(RecommendationEngine::new(Arc::new(store), RecommendOptions::default())),
        })
    }

    #[tokio::test]
    async fn health_returns_ready_when_rules_are_loaded() {
        let store = RuleStore::from_rules(vec![Rule::new(["bread"], ["butter"], 0.8, 1.4)]);

        let (status, Json(payload)) = health(state(store)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.rules.status, "ready");
        assert_eq!(payload.rules.size, 1);
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_returns_service_unavailable_when_store_is_unavailable() {
        let (status, Json(payload)) = health(state(RuleStore::unavailable("artifact missing"))).await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload.status, "degraded");
        assert_eq!(payload.rules.status, "degraded");
        assert!(payload.rules.detail.contains("artifact missing"));
        assert_eq!(payload.service.status, "ready");
    }

    #[tokio::test]
    async fn health_counts_rejected_rows() {
        let store = RuleStore::load(&RuleSource::Inline(
            r#"[
                {"antecedents": ["bread"], "consequents": ["jam"], "confidence": 0.9, "lift": 2.0},
                {"antecedents": ["bread"], "consequents": ["jam"], "confidence": 1.7, "lift": 2.0}
            ]"#
            .to_string(),
        ));

        let (status, Json(payload)) = health(state(store)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.rules.size, 1);
        assert_eq!(payload.rules.rejected_rows, 1);
    }
}
