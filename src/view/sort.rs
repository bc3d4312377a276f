//! Column sorting.
//!
//! `slice::sort_by` is a stable merge sort, so records that compare equal
//! keep their fetch order in both directions.

use serde::Serialize;
use std::cmp::Ordering;

use crate::record::{FieldValue, Record};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SortState {
    pub field: String,
    pub direction: SortDirection,
}

/// What a header click did to the sort state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortChange {
    /// Same field clicked again; direction flipped.
    Flipped,
    /// A different field became active, ascending.
    Switched,
}

impl SortState {
    pub fn new(field: &str, direction: SortDirection) -> Self {
        Self {
            field: field.to_string(),
            direction,
        }
    }

    pub fn ascending(field: &str) -> Self {
        Self::new(field, SortDirection::Ascending)
    }

    /// Apply a column-header click.
    pub fn click(&mut self, field: &str) -> SortChange {
        if self.field == field {
            self.direction = self.direction.flipped();
            SortChange::Flipped
        } else {
            self.field = field.to_string();
            self.direction = SortDirection::Ascending;
            SortChange::Switched
        }
    }

    pub fn compare(&self, a: &Record, b: &Record) -> Ordering {
        let null = FieldValue::Null;
        let left = a.get(&self.field).unwrap_or(&null);
        let right = b.get(&self.field).unwrap_or(&null);
        let ordering = left.natural_cmp(right);
        match self.direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }

    pub fn apply(&self, records: &mut [Record]) {
        records.sort_by(|a, b| self.compare(a, b));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(records: &[Record]) -> Vec<String> {
        records.iter().map(|r| r.text("name")).collect()
    }

    #[test]
    fn test_click_same_field_flips() {
        let mut sort = SortState::ascending("last_name");
        assert_eq!(sort.click("last_name"), SortChange::Flipped);
        assert_eq!(sort.direction, SortDirection::Descending);
        assert_eq!(sort.click("last_name"), SortChange::Flipped);
        assert_eq!(sort.direction, SortDirection::Ascending);
    }

    #[test]
    fn test_click_other_field_resets_to_ascending() {
        let mut sort = SortState::new("last_name", SortDirection::Descending);
        assert_eq!(sort.click("hired_at"), SortChange::Switched);
        assert_eq!(sort, SortState::ascending("hired_at"));
    }

    #[test]
    fn test_stable_ties_in_both_directions() {
        let mut records = vec![
            Record::new().with("name", "b1").with("rank", 2i64),
            Record::new().with("name", "a1").with("rank", 1i64),
            Record::new().with("name", "b2").with("rank", 2i64),
            Record::new().with("name", "a2").with("rank", 1i64),
        ];
        SortState::ascending("rank").apply(&mut records);
        assert_eq!(names(&records), vec!["a1", "a2", "b1", "b2"]);

        SortState::new("rank", SortDirection::Descending).apply(&mut records);
        assert_eq!(names(&records), vec!["b1", "b2", "a1", "a2"]);
    }

    #[test]
    fn test_missing_field_sorts_first_ascending() {
        let mut records = vec![
            Record::new().with("name", "has").with("qty", 5i64),
            Record::new().with("name", "missing"),
        ];
        SortState::ascending("qty").apply(&mut records);
        assert_eq!(names(&records), vec!["missing", "has"]);
    }
}
