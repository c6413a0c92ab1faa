use std::collections::BTreeSet;

/// Canonical form of an item identifier: surrounding whitespace trimmed,
/// lower-cased.
pub fn normalize_item(value: &str) -> String {
    value.trim().to_lowercase()
}

/// Normalize a collection of identifiers into a set. Duplicates that only
/// differ in case or padding collapse to one entry.
pub fn normalize_items<I, S>(values: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().map(|value| normalize_item(value.as_ref())).collect()
}

#[cfg(test)]
mod tests {
    use super::{normalize_item, normalize_items};

    #[test]
    fn trims_and_lowercases() {
        assert_eq!(normalize_item("  Peanut Butter\t"), "peanut butter");
        assert_eq!(normalize_item("MILK"), "milk");
    }

    #[test]
    fn normalization_is_idempotent() {
        for raw in ["  Bread ", "JAM", "whole milk", " Ça Va ", ""] {
            let once = normalize_item(raw);
            assert_eq!(normalize_item(&once), once, "normalizing `{raw}` twice changed it");
        }

        let once = normalize_items(["Eggs", " eggs", "Flour "]);
        let twice = normalize_items(once.iter());
        assert_eq!(once, twice);
    }

    #[test]
    fn collapses_case_and_padding_duplicates() {
        let items = normalize_items(["Bread", " bread ", "BREAD", "butter"]);
        assert_eq!(items.into_iter().collect::<Vec<_>>(), vec!["bread", "butter"]);
    }
}
