//! JSON recommendation API.
//!
//! - `POST /api/v1/recommendations` — body `{"product": "..."}` and/or
//!   `{"cart": ["...", ...]}`, with optional `min_confidence`, `min_lift`
//!   and `limit` overrides.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::{HeaderMap, StatusCode},
    routing::post,
    Json, Router,
};
use basket_core::errors::{InterfaceError, RecommendError};
use basket_core::recommend::{OptionOverrides, RecommendationEngine, RecommendationResult};
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{error, info, warn};
use uuid::Uuid;

pub const CORRELATION_HEADER: &str = "x-correlation-id";

#[derive(Clone)]
pub struct ApiState {
    engine: Arc<RecommendationEngine>,
}

#[derive(Debug, Default, Clone, PartialEq)]
pub struct RecommendationRequest {
    pub items: Vec<String>,
    pub overrides: OptionOverrides,
}

#[derive(Debug, Serialize)]
pub struct RecommendationResponse {
    #[serde(flatten)]
    pub result: RecommendationResult,
    pub correlation_id: String,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: &'static str,
    pub message: String,
    pub correlation_id: String,
}

type ApiFailure = (StatusCode, Json<ApiError>);

pub fn router(engine: Arc<RecommendationEngine>) -> Router {
    Router::new()
        .route("/api/v1/recommendations", post(create_recommendations))
        .with_state(ApiState { engine })
}

pub async fn create_recommendations(
    State(state): State<ApiState>,
    headers: HeaderMap,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<RecommendationResponse>, ApiFailure> {
    let correlation_id = correlation_id(&headers);

    let request = payload
        .map_err(|rejection| RecommendError::InvalidInput(rejection.body_text()))
        .and_then(|Json(body)| parse_request(&body))
        .map_err(|err| failure(err, &correlation_id))?;

    info!(
        event_name = "recommend.request.received",
        correlation_id = %correlation_id,
        input_items = request.items.len(),
        "recommendation request received"
    );

    let result = state
        .engine
        .recommend_with(&request.items, &request.overrides)
        .map_err(|err| failure(err, &correlation_id))?;

    Ok(Json(RecommendationResponse { result, correlation_id }))
}

/// Reuse the caller's correlation id when one is supplied.
pub fn correlation_id(headers: &HeaderMap) -> String {
    headers
        .get(CORRELATION_HEADER)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

/// Pull items and overrides out of a JSON body. `product` and `cart` are
/// merged; either may be absent but not both.
pub fn parse_request(body: &Value) -> Result<RecommendationRequest, RecommendError> {
    let Some(object) = body.as_object() else {
        return Err(invalid("request body must be a JSON object"));
    };

    let mut items = Vec::new();
    match object.get("product") {
        None | Some(Value::Null) => {}
        Some(Value::String(product)) => items.push(product.clone()),
        Some(_) => return Err(invalid("`product` must be a string")),
    }

    match object.get("cart") {
        None | Some(Value::Null) => {}
        Some(Value::Array(cart)) => {
            for (index, element) in cart.iter().enumerate() {
                match element {
                    Value::String(item) => items.push(item.clone()),
                    _ => return Err(invalid(format!("`cart` element {index} must be a string"))),
                }
            }
        }
        Some(_) => return Err(invalid("`cart` must be an array of strings")),
    }

    if items.is_empty() {
        return Err(invalid("request must include a `product` or a non-empty `cart`"));
    }

    let overrides = OptionOverrides {
        min_confidence: number_field(object, "min_confidence")?,
        min_lift: number_field(object, "min_lift")?,
        limit: limit_field(object)?,
    };

    Ok(RecommendationRequest { items, overrides })
}

fn number_field(object: &Map<String, Value>, key: &str) -> Result<Option<f64>, RecommendError> {
    match object.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => {
            value.as_f64().map(Some).ok_or_else(|| invalid(format!("`{key}` must be a number")))
        }
    }
}

fn limit_field(object: &Map<String, Value>) -> Result<Option<usize>, RecommendError> {
    match object.get("limit") {
        None | Some(Value::Null) => Ok(None),
        Some(value) => value
            .as_u64()
            .and_then(|limit| usize::try_from(limit).ok())
            .map(Some)
            .ok_or_else(|| invalid("`limit` must be a positive integer")),
    }
}

fn invalid(message: impl Into<String>) -> RecommendError {
    RecommendError::InvalidInput(message.into())
}

fn failure(err: RecommendError, correlation_id: &str) -> ApiFailure {
    let detail = err.to_string();
    let interface = err.into_interface(correlation_id);

    let (status, message) = match &interface {
        InterfaceError::BadRequest { message, .. } => (StatusCode::BAD_REQUEST, message.clone()),
        InterfaceError::ServiceUnavailable { .. } => {
            (StatusCode::SERVICE_UNAVAILABLE, interface.user_message().to_string())
        }
        InterfaceError::Internal { .. } => {
            (StatusCode::INTERNAL_SERVER_ERROR, interface.user_message().to_string())
        }
    };

    if status.is_server_error() {
        error!(
            event_name = "recommend.request.failed",
            correlation_id = %correlation_id,
            error_class = interface.error_class(),
            error = %detail,
            "recommendation request failed"
        );
    } else {
        warn!(
            event_name = "recommend.request.invalid",
            correlation_id = %correlation_id,
            error = %detail,
            "recommendation request rejected"
        );
    }

    (
        status,
        Json(ApiError {
            error: interface.error_class(),
            message,
            correlation_id: interface.correlation_id().to_string(),
        }),
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
    };
    use basket_core::errors::RecommendError;
    use basket_core::recommend::{RecommendOptions, RecommendationEngine};
    use basket_core::rules::{Rule, RuleStore};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use super::{parse_request, router, CORRELATION_HEADER};

    fn engine(store: RuleStore) -> Arc<RecommendationEngine> {
        Arc::new(RecommendationEngine::new(Arc::new(store), RecommendOptions::default()))
    }

    fn grocery_store() -> RuleStore {
        RuleStore::from_rules(vec![
            Rule::new(["bread", "butter"], ["jam"], 0.8, 1.5),
            Rule::new(["milk"], ["cereal", "cookies"], 0.7, 1.3),
            Rule::new(["milk"], ["eggs"], 0.4, 1.2),
        ])
    }

    async fn post_json(
        engine: Arc<RecommendationEngine>,
        body: &str,
        correlation: Option<&str>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/api/v1/recommendations")
            .header(header::CONTENT_TYPE, "application/json");
        if let Some(correlation) = correlation {
            builder = builder.header(CORRELATION_HEADER, correlation);
        }
        let request = builder.body(Body::from(body.to_string())).expect("request");

        let response = router(engine).oneshot(request).await.expect("response");
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let payload = serde_json::from_slice(&bytes).expect("json body");
        (status, payload)
    }

    #[test]
    fn product_and_cart_are_merged() {
        let request = parse_request(&json!({"product": "Milk", "cart": ["bread", "butter"]}))
            .expect("request should parse");

        assert_eq!(request.items, vec!["Milk", "bread", "butter"]);
    }

    #[test]
    fn malformed_bodies_are_invalid_input() {
        let cases = [
            json!({}),
            json!({"cart": []}),
            json!({"product": 7}),
            json!({"cart": ["bread", 3]}),
            json!({"cart": "bread"}),
            json!({"product": "bread", "min_confidence": "high"}),
            json!({"product": "bread", "limit": -1}),
            json!(["bread"]),
        ];

        for body in cases {
            assert!(
                matches!(parse_request(&body), Err(RecommendError::InvalidInput(_))),
                "{body} should be rejected"
            );
        }
    }

    #[test]
    fn overrides_are_read_when_present() {
        let request = parse_request(&json!({
            "product": "milk",
            "min_confidence": 0.6,
            "min_lift": 1.1,
            "limit": 2
        }))
        .expect("request should parse");

        assert_eq!(request.overrides.min_confidence, Some(0.6));
        assert_eq!(request.overrides.min_lift, Some(1.1));
        assert_eq!(request.overrides.limit, Some(2));
    }

    #[tokio::test]
    async fn cart_request_returns_sorted_recommendations() {
        let (status, payload) =
            post_json(engine(grocery_store()), r#"{"cart": ["Bread", "butter", "milk"]}"#, Some("req-7"))
                .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["recommendations"], json!(["cereal", "cookies", "jam"]));
        assert_eq!(payload["count"], 3);
        assert_eq!(payload["rules_used"], 2);
        assert_eq!(payload["correlation_id"], "req-7");
    }

    #[tokio::test]
    async fn no_match_is_a_successful_empty_result() {
        let (status, payload) =
            post_json(engine(grocery_store()), r#"{"product": "caviar"}"#, None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["recommendations"], json!([]));
        assert_eq!(payload["rules_used"], 0);
        assert!(payload["correlation_id"].as_str().is_some_and(|id| !id.is_empty()));
    }

    #[tokio::test]
    async fn non_string_cart_element_is_bad_request() {
        let (status, payload) =
            post_json(engine(grocery_store()), r#"{"cart": ["milk", 42]}"#, Some("req-8")).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["error"], "bad_request");
        assert_eq!(payload["correlation_id"], "req-8");
    }

    #[tokio::test]
    async fn blank_product_is_bad_request() {
        let (status, payload) =
            post_json(engine(grocery_store()), r#"{"product": "   "}"#, None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["error"], "bad_request");
    }

    #[tokio::test]
    async fn invalid_json_is_bad_request() {
        let (status, payload) = post_json(engine(grocery_store()), "{not json", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(payload["error"], "bad_request");
    }

    #[tokio::test]
    async fn unavailable_store_is_service_unavailable() {
        let (status, payload) = post_json(
            engine(RuleStore::unavailable("artifact missing")),
            r#"{"product": "milk"}"#,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(payload["error"], "service_unavailable");
    }

    #[tokio::test]
    async fn non_finite_rule_is_internal_error() {
        let store = RuleStore::from_rules(vec![Rule::new(["milk"], ["eggs"], 0.9, f64::NAN)]);
        let (status, payload) = post_json(engine(store), r#"{"product": "milk"}"#, None).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(payload["error"], "internal");
        assert_eq!(payload["message"], "An unexpected internal error occurred.");
    }

    #[tokio::test]
    async fn per_request_threshold_override_applies() {
        let (status, payload) = post_json(
            engine(grocery_store()),
            r#"{"product": "milk", "min_confidence": 0.3, "limit": 2}"#,
            None,
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload["recommendations"], json!(["cereal", "cookies"]));
        assert_eq!(payload["count"], 2);
    }
}
