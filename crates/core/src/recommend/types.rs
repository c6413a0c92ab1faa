//! Types for the Recommendation Engine

use serde::{Deserialize, Serialize};

use crate::config::RecommendConfig;
use crate::errors::RecommendError;
use crate::rules::Rule;

/// What to return when no rule yields a candidate
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Report the empty result as is
    #[default]
    Disabled,
    /// Substitute a fixed list of popular items
    PopularItems(Vec<String>),
}

/// Per-call tuning of the engine
#[derive(Debug, Clone, PartialEq)]
pub struct RecommendOptions {
    /// Minimum rule confidence, inclusive (default: 0.5)
    pub min_confidence: f64,
    /// Lift a rule must strictly exceed (default: 1.0)
    pub min_lift: f64,
    /// Keep at most this many items after ordering
    pub limit: Option<usize>,
    pub fallback: FallbackPolicy,
}

impl Default for RecommendOptions {
    fn default() -> Self {
        Self {
            min_confidence: super::DEFAULT_MIN_CONFIDENCE,
            min_lift: super::DEFAULT_MIN_LIFT,
            limit: None,
            fallback: FallbackPolicy::Disabled,
        }
    }
}

impl RecommendOptions {
    pub fn with_min_confidence(mut self, min_confidence: f64) -> Self {
        self.min_confidence = min_confidence;
        self
    }

    pub fn with_min_lift(mut self, min_lift: f64) -> Self {
        self.min_lift = min_lift;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn with_fallback(mut self, fallback: FallbackPolicy) -> Self {
        self.fallback = fallback;
        self
    }

    /// Layer caller-supplied overrides on top of these options.
    pub fn overridden_by(&self, overrides: &OptionOverrides) -> Self {
        Self {
            min_confidence: overrides.min_confidence.unwrap_or(self.min_confidence),
            min_lift: overrides.min_lift.unwrap_or(self.min_lift),
            limit: overrides.limit.or(self.limit),
            fallback: self.fallback.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), RecommendError> {
        if !self.min_confidence.is_finite() || !(0.0..=1.0).contains(&self.min_confidence) {
            return Err(RecommendError::InvalidInput(format!(
                "min_confidence must be within [0, 1], got {}",
                self.min_confidence
            )));
        }
        if !self.min_lift.is_finite() || self.min_lift < 0.0 {
            return Err(RecommendError::InvalidInput(format!(
                "min_lift must be a non-negative number, got {}",
                self.min_lift
            )));
        }
        if self.limit == Some(0) {
            return Err(RecommendError::InvalidInput(
                "limit must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// True when `rule` clears both statistical thresholds.
    pub fn admits(&self, rule: &Rule) -> bool {
        rule.confidence >= self.min_confidence && rule.lift > self.min_lift
    }
}

impl From<&RecommendConfig> for RecommendOptions {
    fn from(config: &RecommendConfig) -> Self {
        let fallback = if config.fallback_enabled {
            FallbackPolicy::PopularItems(config.fallback_items.clone())
        } else {
            FallbackPolicy::Disabled
        };

        Self {
            min_confidence: config.min_confidence,
            min_lift: config.min_lift,
            limit: config.max_results,
            fallback,
        }
    }
}

/// Thresholds a single request may change; `None` keeps the engine default
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct OptionOverrides {
    pub min_confidence: Option<f64>,
    pub min_lift: Option<f64>,
    pub limit: Option<usize>,
}

/// Ranked outcome of a recommendation call
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationResult {
    /// Recommended items, ascending, never overlapping the input
    pub recommendations: Vec<String>,
    /// Length of `recommendations`
    pub count: usize,
    /// Rules that cleared the thresholds and contributed a candidate
    pub rules_used: usize,
    /// Rules whose antecedent was covered by the input, before thresholds
    pub rules_matched: usize,
    /// Set when the configured popular-items list produced the result
    pub fallback_applied: bool,
}

impl RecommendationResult {
    pub(crate) fn new(recommendations: Vec<String>, rules_used: usize, rules_matched: usize) -> Self {
        Self {
            count: recommendations.len(),
            recommendations,
            rules_used,
            rules_matched,
            fallback_applied: false,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.recommendations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{FallbackPolicy, OptionOverrides, RecommendOptions};
    use crate::config::RecommendConfig;
    use crate::errors::RecommendError;
    use crate::rules::Rule;

    #[test]
    fn defaults_match_documented_thresholds() {
        let options = RecommendOptions::default();
        assert_eq!(options.min_confidence, 0.5);
        assert_eq!(options.min_lift, 1.0);
        assert_eq!(options.limit, None);
        assert_eq!(options.fallback, FallbackPolicy::Disabled);
    }

    #[test]
    fn admits_uses_inclusive_confidence_and_strict_lift() {
        let options = RecommendOptions::default();

        assert!(options.admits(&Rule::new(["a"], ["b"], 0.5, 1.01)));
        assert!(!options.admits(&Rule::new(["a"], ["b"], 0.49, 3.0)));
        assert!(!options.admits(&Rule::new(["a"], ["b"], 0.9, 1.0)));
    }

    #[test]
    fn overrides_replace_only_supplied_fields() {
        let base = RecommendOptions::default()
            .with_limit(3)
            .with_fallback(FallbackPolicy::PopularItems(vec!["milk".to_string()]));

        let merged = base.overridden_by(&OptionOverrides {
            min_lift: Some(1.4),
            ..OptionOverrides::default()
        });

        assert_eq!(merged.min_confidence, 0.5);
        assert_eq!(merged.min_lift, 1.4);
        assert_eq!(merged.limit, Some(3));
        assert_eq!(merged.fallback, base.fallback);
    }

    #[test]
    fn validate_rejects_out_of_range_thresholds() {
        let invalid = [
            RecommendOptions::default().with_min_confidence(1.5),
            RecommendOptions::default().with_min_confidence(f64::NAN),
            RecommendOptions::default().with_min_lift(-0.1),
            RecommendOptions::default().with_min_lift(f64::INFINITY),
            RecommendOptions::default().with_limit(0),
        ];

        for options in invalid {
            assert!(
                matches!(options.validate(), Err(RecommendError::InvalidInput(_))),
                "{options:?} should be rejected"
            );
        }
        assert_eq!(RecommendOptions::default().validate(), Ok(()));
    }

    #[test]
    fn config_fallback_is_opt_in() {
        let mut config = RecommendConfig {
            fallback_items: vec!["milk".to_string()],
            ..RecommendConfig::default()
        };
        assert_eq!(RecommendOptions::from(&config).fallback, FallbackPolicy::Disabled);

        config.fallback_enabled = true;
        assert_eq!(
            RecommendOptions::from(&config).fallback,
            FallbackPolicy::PopularItems(vec!["milk".to_string()])
        );
    }
}
