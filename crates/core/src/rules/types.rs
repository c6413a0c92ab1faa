//! Types for the Rule Store

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use super::normalize::normalize_items;

/// A mined association rule: when every antecedent item is present, the
/// consequent items are likely to be bought too.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rule {
    /// Items whose joint presence triggers the rule
    pub antecedent: BTreeSet<String>,
    /// Items the rule recommends
    pub consequent: BTreeSet<String>,
    /// P(consequent | antecedent), in [0, 1]
    pub confidence: f64,
    /// Observed co-occurrence over expected co-occurrence, > 0
    pub lift: f64,
    /// Frequency of the full itemset, diagnostics only
    pub support: Option<f64>,
}

impl Rule {
    /// Build a rule from raw identifiers. Identifiers are normalized; metrics
    /// are taken as given.
    pub fn new<A, C, S>(antecedent: A, consequent: C, confidence: f64, lift: f64) -> Self
    where
        A: IntoIterator<Item = S>,
        C: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            antecedent: normalize_items(antecedent),
            consequent: normalize_items(consequent),
            confidence,
            lift,
            support: None,
        }
    }

    /// Attach a support value
    pub fn with_support(mut self, support: f64) -> Self {
        self.support = Some(support);
        self
    }

    /// Re-normalize every identifier. Used when rules are handed over already
    /// built, so the store never holds un-normalized items.
    pub(crate) fn normalized(self) -> Self {
        Self {
            antecedent: normalize_items(&self.antecedent),
            consequent: normalize_items(&self.consequent),
            ..self
        }
    }

    /// True when every antecedent item is present in `items`.
    pub fn is_covered_by(&self, items: &BTreeSet<String>) -> bool {
        self.antecedent.is_subset(items)
    }

    /// Check the structural and statistical invariants of a loaded rule.
    pub fn validate(&self) -> Result<(), RuleViolation> {
        if self.antecedent.contains("") {
            return Err(RuleViolation::BlankItem { side: "antecedents" });
        }
        if self.consequent.contains("") {
            return Err(RuleViolation::BlankItem { side: "consequents" });
        }
        if self.antecedent.is_empty() {
            return Err(RuleViolation::EmptyAntecedent);
        }
        if self.consequent.is_empty() {
            return Err(RuleViolation::EmptyConsequent);
        }

        if !self.confidence.is_finite() {
            return Err(RuleViolation::NonFiniteMetric { metric: "confidence" });
        }
        if !self.lift.is_finite() {
            return Err(RuleViolation::NonFiniteMetric { metric: "lift" });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(RuleViolation::ConfidenceOutOfRange(self.confidence));
        }
        if self.lift <= 0.0 {
            return Err(RuleViolation::NonPositiveLift(self.lift));
        }
        if let Some(support) = self.support {
            if !support.is_finite() {
                return Err(RuleViolation::NonFiniteMetric { metric: "support" });
            }
            if !(0.0..=1.0).contains(&support) {
                return Err(RuleViolation::SupportOutOfRange(support));
            }
        }

        let overlap: Vec<String> =
            self.antecedent.intersection(&self.consequent).cloned().collect();
        if !overlap.is_empty() {
            return Err(RuleViolation::OverlappingItems(overlap));
        }

        Ok(())
    }
}

/// Reason a single artifact row was refused at load time
#[derive(Clone, Debug, Error, PartialEq)]
pub enum RuleViolation {
    #[error("antecedents must contain at least one item")]
    EmptyAntecedent,
    #[error("consequents must contain at least one item")]
    EmptyConsequent,
    #[error("{side} contains a blank item identifier")]
    BlankItem { side: &'static str },
    #[error("{metric} must be a finite number")]
    NonFiniteMetric { metric: &'static str },
    #[error("confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(f64),
    #[error("lift {0} must be greater than zero")]
    NonPositiveLift(f64),
    #[error("support {0} is outside [0, 1]")]
    SupportOutOfRange(f64),
    #[error("items appear on both sides of the rule: {}", .0.join(", "))]
    OverlappingItems(Vec<String>),
}

/// A row that was read from the artifact but refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowRejection {
    /// Zero-based row index in the artifact
    pub row: usize,
    pub reason: String,
}

/// Outcome of a single artifact load
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LoadReport {
    /// Where the rules came from (file path or `inline`)
    pub origin: String,
    pub rows_read: usize,
    pub accepted: usize,
    pub rejected: Vec<RowRejection>,
}

impl LoadReport {
    pub fn new(origin: impl Into<String>) -> Self {
        Self { origin: origin.into(), ..Self::default() }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{Rule, RuleViolation};

    fn items(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn new_normalizes_identifiers() {
        let rule = Rule::new([" Bread", "BUTTER "], ["Jam"], 0.8, 1.5);
        assert_eq!(rule.antecedent, items(&["bread", "butter"]));
        assert_eq!(rule.consequent, items(&["jam"]));
        assert_eq!(rule.support, None);
    }

    #[test]
    fn coverage_is_a_subset_test() {
        let rule = Rule::new(["bread", "butter"], ["jam"], 0.8, 1.5);

        assert!(rule.is_covered_by(&items(&["bread", "butter"])));
        assert!(rule.is_covered_by(&items(&["bread", "butter", "milk"])));
        assert!(!rule.is_covered_by(&items(&["bread"])));
        assert!(!rule.is_covered_by(&items(&["butter", "milk"])));
    }

    #[test]
    fn validate_accepts_well_formed_rule() {
        let rule = Rule::new(["bread"], ["jam"], 1.0, 0.01).with_support(0.2);
        assert_eq!(rule.validate(), Ok(()));
    }

    #[test]
    fn validate_rejects_each_violation() {
        let cases = [
            (Rule::new(Vec::<&str>::new(), vec!["jam"], 0.8, 1.5), "antecedents must"),
            (Rule::new(vec!["bread"], Vec::<&str>::new(), 0.8, 1.5), "consequents must"),
            (Rule::new(vec!["bread", "  "], vec!["jam"], 0.8, 1.5), "antecedents contains a blank"),
            (Rule::new(vec!["bread"], vec!["jam"], 1.2, 1.5), "confidence 1.2"),
            (Rule::new(vec!["bread"], vec!["jam"], 0.8, 0.0), "lift 0"),
            (Rule::new(vec!["bread"], vec!["jam"], f64::NAN, 1.5), "confidence must be a finite number"),
            (Rule::new(vec!["bread"], vec!["jam"], 0.8, 1.5).with_support(2.0), "support 2"),
            (Rule::new(vec!["bread", "jam"], vec!["Jam"], 0.8, 1.5), "both sides"),
        ];

        for (rule, expected) in cases {
            let message = match rule.validate() {
                Ok(()) => panic!("expected violation containing `{expected}`"),
                Err(violation) => violation.to_string(),
            };
            assert!(message.contains(expected), "`{message}` should contain `{expected}`");
        }
    }

    #[test]
    fn overlap_lists_shared_items() {
        let rule = Rule::new(["a", "b"], ["b", "a", "c"], 0.9, 2.0);
        assert_eq!(
            rule.validate(),
            Err(RuleViolation::OverlappingItems(vec!["a".to_string(), "b".to_string()]))
        );
    }
}
