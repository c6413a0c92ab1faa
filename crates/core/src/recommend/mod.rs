//! Association Rule Recommendation Engine
//!
//! Turns a product or a cart into the items other customers frequently
//! bought together with it, using the rules held by a [`RuleStore`].
//!
//! [`RuleStore`]: crate::rules::RuleStore

mod engine;
mod types;

pub use engine::{recommend, RecommendationEngine};
pub use types::*;

/// Rules below this confidence are ignored
pub const DEFAULT_MIN_CONFIDENCE: f64 = 0.5;

/// Rules must have a lift strictly above this value
pub const DEFAULT_MIN_LIFT: f64 = 1.0;
