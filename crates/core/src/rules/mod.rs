//! Association Rule Store
//!
//! Holds the immutable set of mined association rules loaded once at process
//! start. Identifiers are normalized on the way in so lookups compare
//! case-insensitively and whitespace-insensitively.

mod artifact;
mod normalize;
mod store;
mod types;

pub use artifact::{RuleLoadError, RuleSource};
pub use normalize::{normalize_item, normalize_items};
pub use store::RuleStore;
pub use types::{LoadReport, RowRejection, Rule, RuleViolation};
