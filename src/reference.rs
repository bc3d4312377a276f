//! Reference (lookup) collections: roles, statuses, categories, geography
//! units. Each fetch builds a fresh, immutable collection; lookup maps are
//! derived from it per render pass and never cached across fetches.

use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::value_key;

const ID_KEYS: &[&str] = &["id", "code"];
const LABEL_KEYS: &[&str] = &["name", "label", "title"];

/// One `{id, label}` pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReferenceEntry {
    pub id: String,
    pub label: String,
}

impl ReferenceEntry {
    pub fn new(id: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReferenceCollection {
    dimension: String,
    entries: Arc<[ReferenceEntry]>,
}

impl ReferenceCollection {
    pub fn new(dimension: impl Into<String>, entries: Vec<ReferenceEntry>) -> Self {
        Self {
            dimension: dimension.into(),
            entries: entries.into(),
        }
    }

    pub fn empty(dimension: impl Into<String>) -> Self {
        Self::new(dimension, Vec::new())
    }

    /// Build from database rows.
    ///
    /// The id is read from `id`/`code` or `<dimension>_id`, the label from
    /// `name`/`label`/`title` or `<dimension>_name`. Rows without an id are
    /// skipped; rows without a label fall back to their id.
    pub fn from_json_rows(dimension: &str, rows: &[Value]) -> Self {
        let dim_id = format!("{dimension}_id");
        let dim_name = format!("{dimension}_name");
        let entries = rows
            .iter()
            .filter_map(|row| {
                let id = value_key(row, ID_KEYS).or_else(|| value_key(row, &[dim_id.as_str()]))?;
                let label = crate::value_str(row, LABEL_KEYS)
                    .or_else(|| crate::value_str(row, &[dim_name.as_str()]))
                    .unwrap_or_else(|| id.clone());
                Some(ReferenceEntry { id, label })
            })
            .collect();
        Self::new(dimension, entries)
    }

    pub fn dimension(&self) -> &str {
        &self.dimension
    }

    /// Entries in fetch order, for filter chips and dropdowns.
    pub fn options(&self) -> &[ReferenceEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// One-shot id -> label map for a single derivation pass.
    pub fn lookup(&self) -> LookupMap<'_> {
        LookupMap {
            by_id: self
                .entries
                .iter()
                .map(|e| (e.id.as_str(), e.label.as_str()))
                .collect(),
        }
    }
}

/// Borrowed id -> label map. Later duplicates win, matching a plain
/// object-literal build of the same rows.
#[derive(Debug)]
pub struct LookupMap<'a> {
    by_id: HashMap<&'a str, &'a str>,
}

impl<'a> LookupMap<'a> {
    pub fn resolve(&self, id: &str) -> Option<&'a str> {
        self.by_id.get(id).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_rows_with_aliases() {
        let rows = vec![
            json!({ "id": 1, "name": "Admin" }),
            json!({ "role_id": "2", "role_name": "Cashier" }),
            json!({ "name": "no id" }),
        ];
        let roles = ReferenceCollection::from_json_rows("role", &rows);
        assert_eq!(roles.len(), 2);
        assert_eq!(roles.options()[0], ReferenceEntry::new("1", "Admin"));
        assert_eq!(roles.options()[1], ReferenceEntry::new("2", "Cashier"));
    }

    #[test]
    fn test_label_falls_back_to_id() {
        let rows = vec![json!({ "code": "130000000" })];
        let regions = ReferenceCollection::from_json_rows("region", &rows);
        assert_eq!(regions.options()[0].label, "130000000");
    }

    #[test]
    fn test_lookup_resolves_and_misses() {
        let statuses = ReferenceCollection::new(
            "status",
            vec![
                ReferenceEntry::new("1", "Pending"),
                ReferenceEntry::new("2", "Verified"),
            ],
        );
        let lookup = statuses.lookup();
        assert_eq!(lookup.resolve("2"), Some("Verified"));
        assert_eq!(lookup.resolve("9"), None);
    }
}
