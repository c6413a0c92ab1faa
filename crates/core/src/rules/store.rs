use tracing::{info, warn};

use super::artifact::{parse_rules, read_source, RuleLoadError, RuleSource};
use super::types::{LoadReport, Rule};

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreState {
    Loaded,
    Unavailable(String),
}

/// Immutable collection of association rules.
///
/// Built once at startup and shared read-only (typically behind an `Arc`).
/// A failed load does not error out: the store comes back unavailable and
/// carries the reason, so request paths can report "store unavailable"
/// separately from "no rule matched".
#[derive(Debug, Clone)]
pub struct RuleStore {
    rules: Vec<Rule>,
    state: StoreState,
    report: LoadReport,
}

impl RuleStore {
    /// Load rules from `source`, failing closed.
    pub fn load(source: &RuleSource) -> Self {
        match Self::try_load(source) {
            Ok(store) => store,
            Err(error) => {
                let reason = error.to_string();
                warn!(
                    event_name = "rules.store.unavailable",
                    correlation_id = "bootstrap",
                    origin = %source.origin(),
                    error = %reason,
                    "rule artifact could not be loaded; store is unavailable"
                );
                Self {
                    rules: Vec::new(),
                    state: StoreState::Unavailable(reason),
                    report: LoadReport::new(source.origin()),
                }
            }
        }
    }

    /// Load rules from `source`, returning the artifact-level failure instead
    /// of degrading. Rejected rows still only show up in the report.
    pub fn try_load(source: &RuleSource) -> Result<Self, RuleLoadError> {
        let document = read_source(source)?;
        let (rules, report) = parse_rules(&document, source.origin())?;

        for rejection in &report.rejected {
            warn!(
                event_name = "rules.store.row_rejected",
                correlation_id = "bootstrap",
                origin = %report.origin,
                row = rejection.row,
                reason = %rejection.reason,
                "rule artifact row rejected"
            );
        }
        info!(
            event_name = "rules.store.loaded",
            correlation_id = "bootstrap",
            origin = %report.origin,
            rows_read = report.rows_read,
            accepted = report.accepted,
            rejected = report.rejected.len(),
            "rule store loaded"
        );

        Ok(Self { rules, state: StoreState::Loaded, report })
    }

    /// Build a store from rules constructed in memory. Identifiers are
    /// normalized; rules are not validated here, the engine refuses a
    /// malformed one when it matches.
    pub fn from_rules(rules: Vec<Rule>) -> Self {
        let rules: Vec<Rule> = rules.into_iter().map(Rule::normalized).collect();
        let report = LoadReport {
            origin: "in-memory".to_string(),
            rows_read: rules.len(),
            accepted: rules.len(),
            rejected: Vec::new(),
        };
        Self { rules, state: StoreState::Loaded, report }
    }

    /// A store that failed to load for `reason`.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            rules: Vec::new(),
            state: StoreState::Unavailable(reason.into()),
            report: LoadReport::new("unavailable"),
        }
    }

    /// True iff the artifact loaded and produced at least one rule.
    pub fn is_available(&self) -> bool {
        self.state == StoreState::Loaded && !self.rules.is_empty()
    }

    pub fn size(&self) -> usize {
        self.rules.len()
    }

    /// Why the store cannot serve recommendations, if it cannot.
    pub fn unavailable_reason(&self) -> Option<&str> {
        match &self.state {
            StoreState::Unavailable(reason) => Some(reason.as_str()),
            StoreState::Loaded if self.rules.is_empty() => Some("rule store holds no rules"),
            StoreState::Loaded => None,
        }
    }

    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Rule> {
        self.rules.iter()
    }

    /// Lazily yield the rules satisfying `predicate`, in store order. The
    /// returned iterator can be cloned to walk the same rules again.
    pub fn rules_matching<'a, P>(
        &'a self,
        predicate: P,
    ) -> impl Iterator<Item = &'a Rule> + Clone + 'a
    where
        P: Fn(&Rule) -> bool + Clone + 'a,
    {
        self.rules.iter().filter(move |rule| predicate(*rule))
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use tempfile::TempDir;

    use super::RuleStore;
    use crate::rules::{Rule, RuleSource};

    fn sample_store() -> RuleStore {
        RuleStore::from_rules(vec![
            Rule::new(["Bread", "Butter"], ["Jam"], 0.8, 1.5),
            Rule::new(["milk"], ["cereal"], 0.6, 1.2),
            Rule::new(["milk"], ["cookies"], 0.4, 1.1),
        ])
    }

    #[test]
    fn from_rules_normalizes_and_reports_size() {
        let store = sample_store();

        assert!(store.is_available());
        assert_eq!(store.size(), 3);
        assert_eq!(store.unavailable_reason(), None);
        let first = store.iter().next().expect("first rule");
        assert!(first.antecedent.contains("bread"));
        assert!(first.consequent.contains("jam"));
    }

    #[test]
    fn rules_matching_is_lazy_and_restartable() {
        let store = sample_store();
        let milk_rules = store.rules_matching(|rule| rule.antecedent.contains("milk"));

        let first_pass: Vec<_> = milk_rules.clone().collect();
        let second_pass: Vec<_> = milk_rules.collect();
        assert_eq!(first_pass.len(), 2);
        assert_eq!(first_pass, second_pass);

        let again: Vec<_> = store.rules_matching(|rule| rule.antecedent.contains("milk")).collect();
        assert_eq!(first_pass, again);
    }

    #[test]
    fn missing_file_yields_unavailable_store() {
        let dir = TempDir::new().expect("temp dir");
        let store = RuleStore::load(&RuleSource::File(dir.path().join("missing.json")));

        assert!(!store.is_available());
        assert_eq!(store.size(), 0);
        let reason = store.unavailable_reason().expect("reason");
        assert!(reason.contains("could not read rule artifact"), "{reason}");
    }

    #[test]
    fn structural_mismatch_yields_unavailable_store() {
        let store = RuleStore::load(&RuleSource::Inline(
            r#"[{"antecedents": ["bread"], "confidence": 0.8, "lift": 1.5}]"#.to_string(),
        ));

        assert!(!store.is_available());
        assert!(store.unavailable_reason().is_some_and(|reason| reason.contains("consequents")));
    }

    #[test]
    fn empty_artifact_loads_but_is_not_available() {
        let store = RuleStore::load(&RuleSource::Inline("[]".to_string()));

        assert!(!store.is_available());
        assert_eq!(store.unavailable_reason(), Some("rule store holds no rules"));
        assert_eq!(store.report().rows_read, 0);
    }

    #[test]
    fn file_load_keeps_valid_rows_and_reports_rejected_ones() {
        let dir = TempDir::new().expect("temp dir");
        let path = dir.path().join("rules.json");
        fs::write(
            &path,
            r#"{"rules": [
                {"antecedents": ["bread"], "consequents": ["jam"], "confidence": 0.8, "lift": 1.5, "support": 0.1},
                {"antecedents": ["bread"], "consequents": ["jam"], "confidence": 0.8, "lift": -1.0}
            ]}"#,
        )
        .expect("write artifact");

        let store = RuleStore::load(&RuleSource::File(path.clone()));

        assert!(store.is_available());
        assert_eq!(store.size(), 1);
        assert_eq!(store.report().origin, path.display().to_string());
        assert_eq!(store.report().rejected.len(), 1);
        assert_eq!(store.report().rejected[0].row, 1);
    }

    #[test]
    fn explicit_unavailable_store_keeps_reason() {
        let store = RuleStore::unavailable("model file corrupted");
        assert!(!store.is_available());
        assert_eq!(store.unavailable_reason(), Some("model file corrupted"));
        assert_eq!(store.report().origin, "unavailable");
    }
}
