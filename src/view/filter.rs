//! Search + categorical filters, combined into one predicate.

use std::collections::{BTreeMap, BTreeSet};

use crate::record::{FieldValue, Record};

/// Which fields each filter dimension reads. Fixed per screen.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterRules {
    /// Human-facing name fields, concatenated with spaces for search.
    pub search_fields: Vec<String>,
    /// Single-select dimension -> id field compared by equality.
    pub equality: BTreeMap<String, String>,
    /// Multi-select dimension -> display field compared by set membership.
    pub multi: BTreeMap<String, String>,
}

/// Current search text and filter selections.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub equality: BTreeMap<String, String>,
    pub multi: BTreeMap<String, BTreeSet<String>>,
}

impl FilterState {
    pub fn is_empty(&self) -> bool {
        self.search.is_empty()
            && self.equality.is_empty()
            && self.multi.values().all(BTreeSet::is_empty)
    }

    /// Set or clear (`""`) a single-select filter.
    pub fn set_equality(&mut self, dimension: &str, value: &str) {
        if value.is_empty() {
            self.equality.remove(dimension);
        } else {
            self.equality.insert(dimension.to_string(), value.to_string());
        }
    }

    /// Add `value` to the dimension's selection, or remove it if present.
    pub fn toggle_multi(&mut self, dimension: &str, value: &str) {
        let selected = self.multi.entry(dimension.to_string()).or_default();
        if !selected.remove(value) {
            selected.insert(value.to_string());
        }
        if selected.is_empty() {
            self.multi.remove(dimension);
        }
    }
}

/// Predicate for one derivation pass. Holds the lowered search term so
/// each record costs one allocation at most.
pub struct FilterPredicate<'a> {
    rules: &'a FilterRules,
    state: &'a FilterState,
    needle: String,
}

impl<'a> FilterPredicate<'a> {
    pub fn new(rules: &'a FilterRules, state: &'a FilterState) -> Self {
        Self {
            rules,
            state,
            needle: state.search.to_lowercase(),
        }
    }

    pub fn matches(&self, record: &Record) -> bool {
        self.matches_search(record) && self.matches_equality(record) && self.matches_multi(record)
    }

    fn matches_search(&self, record: &Record) -> bool {
        if self.needle.is_empty() {
            return true;
        }
        let haystack = self
            .rules
            .search_fields
            .iter()
            .map(|f| record.text(f))
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase();
        haystack.contains(&self.needle)
    }

    fn matches_equality(&self, record: &Record) -> bool {
        self.state.equality.iter().all(|(dimension, selected)| {
            // Selections on undeclared dimensions are never stored; the
            // engine rejects them before they reach the state.
            let Some(field) = self.rules.equality.get(dimension) else {
                return true;
            };
            record.get(field).and_then(FieldValue::as_key).as_deref() == Some(selected.as_str())
        })
    }

    fn matches_multi(&self, record: &Record) -> bool {
        self.state.multi.iter().all(|(dimension, selected)| {
            if selected.is_empty() {
                return true;
            }
            let Some(field) = self.rules.multi.get(dimension) else {
                return true;
            };
            selected.contains(&record.text(field))
        })
    }
}
