//! Browser front-end.
//!
//! - `GET  /`          — product form
//! - `POST /recommend` — form post; renders the same page with results

use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::Html,
    routing::{get, post},
    Form, Router,
};
use basket_core::errors::{InterfaceError, RecommendError};
use basket_core::recommend::{RecommendationEngine, RecommendationResult};
use serde::{Deserialize, Serialize};
use tera::{Context, Tera};
use tracing::{error, info};
use uuid::Uuid;

const INDEX_TEMPLATE: &str = "index.html";

#[derive(Clone)]
pub struct WebState {
    engine: Arc<RecommendationEngine>,
    templates: Arc<Tera>,
}

#[derive(Debug, Default, Deserialize)]
pub struct RecommendForm {
    pub product: Option<String>,
    pub cart: Option<String>,
}

impl RecommendForm {
    /// The product followed by any comma-separated cart entries. Blank
    /// entries are skipped; a form with nothing left is rejected downstream.
    fn items(&self) -> Vec<String> {
        let mut items: Vec<String> = self
            .product
            .iter()
            .filter(|product| !product.trim().is_empty())
            .cloned()
            .collect();
        if let Some(cart) = &self.cart {
            items.extend(
                cart.split(',').map(str::trim).filter(|item| !item.is_empty()).map(str::to_string),
            );
        }
        items
    }
}

#[derive(Debug, Default, Serialize)]
struct PageView {
    product: String,
    cart: String,
    submitted: bool,
    recommendations: Vec<String>,
    rules_used: usize,
    fallback_applied: bool,
    error: String,
}

fn init_templates() -> Arc<Tera> {
    let mut tera = Tera::default();
    if let Err(error) =
        tera.add_raw_template(INDEX_TEMPLATE, include_str!("../../../templates/index.html"))
    {
        error!(
            event_name = "system.server.template_error",
            correlation_id = "bootstrap",
            error = %error,
            "embedded index template failed to parse"
        );
    }
    Arc::new(tera)
}

pub fn router(engine: Arc<RecommendationEngine>) -> Router {
    Router::new()
        .route("/", get(index_page))
        .route("/recommend", post(recommend_page))
        .with_state(WebState { engine, templates: init_templates() })
}

async fn index_page(State(state): State<WebState>) -> (StatusCode, Html<String>) {
    render(&state.templates, StatusCode::OK, &PageView::default())
}

async fn recommend_page(
    State(state): State<WebState>,
    Form(form): Form<RecommendForm>,
) -> (StatusCode, Html<String>) {
    let correlation_id = Uuid::new_v4().to_string();
    let items = form.items();

    info!(
        event_name = "recommend.request.received",
        correlation_id = %correlation_id,
        input_items = items.len(),
        channel = "web",
        "recommendation form submitted"
    );

    let mut view = PageView {
        product: form.product.clone().unwrap_or_default(),
        cart: form.cart.clone().unwrap_or_default(),
        submitted: true,
        ..PageView::default()
    };

    match state.engine.recommend(&items) {
        Ok(result) => {
            fill_result(&mut view, result);
            render(&state.templates, StatusCode::OK, &view)
        }
        Err(err) => {
            let (status, message) = page_error(err, &correlation_id);
            view.error = message;
            render(&state.templates, status, &view)
        }
    }
}

fn fill_result(view: &mut PageView, result: RecommendationResult) {
    view.rules_used = result.rules_used;
    view.fallback_applied = result.fallback_applied;
    view.recommendations = result.recommendations;
}

fn page_error(err: RecommendError, correlation_id: &str) -> (StatusCode, String) {
    let detail = err.to_string();
    let interface = err.into_interface(correlation_id);
    let status = match interface {
        InterfaceError::BadRequest { .. } => StatusCode::BAD_REQUEST,
        InterfaceError::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
        InterfaceError::Internal { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        error!(
            event_name = "recommend.request.failed",
            correlation_id = %correlation_id,
            error_class = interface.error_class(),
            error = %detail,
            channel = "web",
            "recommendation form failed"
        );
    }

    (status, interface.user_message().to_string())
}

fn render(templates: &Tera, status: StatusCode, view: &PageView) -> (StatusCode, Html<String>) {
    let rendered = Context::from_serialize(view)
        .and_then(|context| templates.render(INDEX_TEMPLATE, &context));

    match rendered {
        Ok(html) => (status, Html(html)),
        Err(err) => {
            error!(
                event_name = "system.server.template_error",
                error = %err,
                "failed to render index template"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Html("<h1>Template Error</h1><p>The page could not be rendered.</p>".to_string()),
            )
        }
    }
}
