//! Recommendation Engine implementation

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{debug, error};

use super::types::*;
use crate::errors::RecommendError;
use crate::rules::{normalize_item, normalize_items, RuleStore};

/// Validate raw caller input and fold it into the normalized item set.
fn normalize_input<S: AsRef<str>>(raw_inputs: &[S]) -> Result<BTreeSet<String>, RecommendError> {
    if raw_inputs.is_empty() {
        return Err(RecommendError::InvalidInput(
            "at least one product is required".to_string(),
        ));
    }

    let mut items = BTreeSet::new();
    for (index, raw) in raw_inputs.iter().enumerate() {
        let item = normalize_item(raw.as_ref());
        if item.is_empty() {
            return Err(RecommendError::InvalidInput(format!("product at position {index} is blank")));
        }
        items.insert(item);
    }

    Ok(items)
}

fn fallback_items(policy: &FallbackPolicy, input: &BTreeSet<String>) -> Vec<String> {
    match policy {
        FallbackPolicy::Disabled => Vec::new(),
        FallbackPolicy::PopularItems(items) => normalize_items(items)
            .into_iter()
            .filter(|item| !item.is_empty() && !input.contains(item))
            .collect(),
    }
}

/// Recommend items for `raw_inputs` from the rules in `store`.
///
/// A rule fires when its whole antecedent is present in the input, and
/// contributes when it clears the confidence and lift thresholds in
/// `options`. Consequents of contributing rules are merged, items the caller
/// already has are dropped, and the remainder is returned in ascending order.
/// An empty outcome is a success with `rules_used == 0`; the popular-items
/// fallback only applies when `options.fallback` asks for it.
pub fn recommend<S: AsRef<str>>(
    raw_inputs: &[S],
    store: &RuleStore,
    options: &RecommendOptions,
) -> Result<RecommendationResult, RecommendError> {
    let input = normalize_input(raw_inputs)?;
    options.validate()?;

    if !store.is_available() {
        let reason = store.unavailable_reason().unwrap_or("rule store is unavailable");
        return Err(RecommendError::StoreUnavailable(reason.to_string()));
    }

    let mut rules_matched = 0;
    let mut rules_used = 0;
    let mut candidates = BTreeSet::new();

    for rule in store.rules_matching(|rule| rule.is_covered_by(&input)) {
        if let Err(violation) = rule.validate() {
            error!(
                event_name = "recommend.internal_error",
                antecedent = ?rule.antecedent,
                consequent = ?rule.consequent,
                violation = %violation,
                "malformed rule reached the engine"
            );
            return Err(RecommendError::Internal(format!(
                "rule {:?} -> {:?} is malformed: {violation}",
                rule.antecedent, rule.consequent
            )));
        }

        rules_matched += 1;
        if !options.admits(rule) {
            continue;
        }

        rules_used += 1;
        candidates.extend(rule.consequent.iter().filter(|item| !input.contains(*item)).cloned());
    }

    if candidates.is_empty() {
        let fallback = fallback_items(&options.fallback, &input);
        if fallback.is_empty() {
            return Ok(RecommendationResult::new(Vec::new(), 0, rules_matched));
        }

        let mut result = RecommendationResult::new(truncate(fallback, options.limit), 0, rules_matched);
        result.fallback_applied = true;
        return Ok(result);
    }

    let ordered: Vec<String> = candidates.into_iter().collect();
    Ok(RecommendationResult::new(truncate(ordered, options.limit), rules_used, rules_matched))
}

fn truncate(mut items: Vec<String>, limit: Option<usize>) -> Vec<String> {
    if let Some(limit) = limit {
        items.truncate(limit);
    }
    items
}

/// A rule store paired with the default options request handlers use
#[derive(Debug, Clone)]
pub struct RecommendationEngine {
    store: Arc<RuleStore>,
    defaults: RecommendOptions,
}

impl RecommendationEngine {
    pub fn new(store: Arc<RuleStore>, defaults: RecommendOptions) -> Self {
        Self { store, defaults }
    }

    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    pub fn defaults(&self) -> &RecommendOptions {
        &self.defaults
    }

    /// Recommend with the default options
    pub fn recommend<S: AsRef<str>>(
        &self,
        raw_inputs: &[S],
    ) -> Result<RecommendationResult, RecommendError> {
        self.recommend_with(raw_inputs, &OptionOverrides::default())
    }

    /// Recommend with per-call threshold overrides
    pub fn recommend_with<S: AsRef<str>>(
        &self,
        raw_inputs: &[S],
        overrides: &OptionOverrides,
    ) -> Result<RecommendationResult, RecommendError> {
        let options = self.defaults.overridden_by(overrides);
        let outcome = recommend(raw_inputs, &self.store, &options);

        match &outcome {
            Ok(result) => debug!(
                event_name = "recommend.request.completed",
                input_items = raw_inputs.len(),
                count = result.count,
                rules_used = result.rules_used,
                rules_matched = result.rules_matched,
                fallback_applied = result.fallback_applied,
                "recommendation computed"
            ),
            Err(error) => debug!(
                event_name = "recommend.request.rejected",
                error_class = error.error_class(),
                error = %error,
                "recommendation request rejected"
            ),
        }

        outcome
    }
}
