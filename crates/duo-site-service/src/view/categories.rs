use std::collections::BTreeSet;

use crate::models::ContentRecord;

/// The filter token that matches every record.
pub const ALL_CATEGORIES: &str = "all";

/// Parsed form of a record's comma-joined `categories` cell: trimmed,
/// non-empty, de-duplicated labels.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySet(BTreeSet<String>);

impl CategorySet {
    pub fn parse(raw: &str) -> Self {
        Self(
            raw.split(',')
                .map(str::trim)
                .filter(|token| !token.is_empty())
                .map(ToString::to_string)
                .collect(),
        )
    }

    pub fn of(record: &ContentRecord) -> Self {
        record
            .categories
            .as_deref()
            .map(Self::parse)
            .unwrap_or_default()
    }

    pub fn contains(&self, token: &str) -> bool {
        self.0.contains(token)
    }

    /// Case-insensitive lookup, for markers typed by hand in the sheet.
    pub fn contains_ignore_case(&self, token: &str) -> bool {
        self.0.iter().any(|label| label.eq_ignore_ascii_case(token))
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Union of every set, alphabetically ordered.
pub fn distinct_categories<'a>(sets: impl IntoIterator<Item = &'a CategorySet>) -> BTreeSet<String> {
    sets.into_iter()
        .flat_map(|set| set.0.iter().cloned())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_empty_tokens() {
        let set = CategorySet::parse(" Roma, ,Estate 2024 ,, Roma ");
        assert_eq!(set.iter().collect::<Vec<_>>(), vec!["Estate 2024", "Roma"]);
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_blank_cell_is_empty() {
        assert!(CategorySet::parse(" , ").is_empty());
    }

    #[test]
    fn test_contains_matches_whole_tokens_only() {
        let set = CategorySet::parse("Milano, Teatro alla Scala");
        assert!(set.contains("Milano"));
        assert!(!set.contains("Teatro"));
        assert!(!set.contains("milano"));
        assert!(set.contains_ignore_case("milano"));
    }

    #[test]
    fn test_distinct_categories_is_sorted_union() {
        let sets = [
            CategorySet::parse("Roma, Estate"),
            CategorySet::default(),
            CategorySet::parse("Autunno,Roma"),
        ];
        let all: Vec<_> = distinct_categories(&sets).into_iter().collect();
        assert_eq!(all, vec!["Autunno", "Estate", "Roma"]);
    }
}
