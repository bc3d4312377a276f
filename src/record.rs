//! Generic entity records.
//!
//! Employees, orders and inventory items all arrive from the managed
//! database as flat JSON rows. The view engine never needs to know which
//! kind it is holding, so every row becomes an ordered list of
//! `(field name, FieldValue)` pairs.

use chrono::{DateTime, Utc};
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use serde_json::Value;
use std::cmp::Ordering;

/// Field holding the unique id of every entity kind.
pub const ID_FIELD: &str = "id";

/// A single scalar field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FieldValue {
    Null,
    Integer(i64),
    Number(f64),
    Timestamp(DateTime<Utc>),
    Text(String),
}

impl FieldValue {
    pub fn text(s: impl Into<String>) -> Self {
        FieldValue::Text(s.into())
    }

    /// Decode a JSON scalar. RFC 3339 strings become timestamps.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => FieldValue::Null,
            Value::Bool(b) => FieldValue::Text(b.to_string()),
            Value::Number(n) => match n.as_i64() {
                Some(i) => FieldValue::Integer(i),
                None => n.as_f64().map(FieldValue::Number).unwrap_or(FieldValue::Null),
            },
            Value::String(s) => match DateTime::parse_from_rfc3339(s.trim()) {
                Ok(ts) => FieldValue::Timestamp(ts.with_timezone(&Utc)),
                Err(_) => FieldValue::Text(s.clone()),
            },
            other => FieldValue::Text(other.to_string()),
        }
    }

    /// Key form used for foreign-key lookups and equality filters.
    ///
    /// Integers print exactly. Integral floats print without a fractional
    /// part so `3.0` matches the reference id `"3"`.
    pub fn as_key(&self) -> Option<String> {
        match self {
            FieldValue::Null => None,
            FieldValue::Integer(i) => Some(i.to_string()),
            FieldValue::Number(n) if n.fract() == 0.0 && n.is_finite() => {
                Some(format!("{}", *n as i64))
            }
            FieldValue::Number(n) => Some(n.to_string()),
            FieldValue::Timestamp(ts) => Some(ts.to_rfc3339()),
            FieldValue::Text(s) => Some(s.trim().to_string()),
        }
    }

    /// Human-facing text; empty for `Null`.
    pub fn display(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            other => other.as_key().unwrap_or_default(),
        }
    }

    fn type_rank(&self) -> u8 {
        match self {
            FieldValue::Null => 0,
            FieldValue::Integer(_) | FieldValue::Number(_) => 1,
            FieldValue::Timestamp(_) => 2,
            FieldValue::Text(_) => 3,
        }
    }

    /// Natural ascending order: numeric for numbers (integers and floats
    /// compare with each other), chronological for timestamps,
    /// case-insensitive lexicographic for text. Values of different kinds
    /// order by kind, with `Null` first.
    pub fn natural_cmp(&self, other: &FieldValue) -> Ordering {
        match (self, other) {
            (FieldValue::Null, FieldValue::Null) => Ordering::Equal,
            (FieldValue::Integer(a), FieldValue::Integer(b)) => a.cmp(b),
            (FieldValue::Number(a), FieldValue::Number(b)) => a.total_cmp(b),
            (FieldValue::Integer(a), FieldValue::Number(b)) => (*a as f64).total_cmp(b),
            (FieldValue::Number(a), FieldValue::Integer(b)) => a.total_cmp(&(*b as f64)),
            (FieldValue::Timestamp(a), FieldValue::Timestamp(b)) => a.cmp(b),
            (FieldValue::Text(a), FieldValue::Text(b)) => cmp_ignore_case(a, b).then_with(|| a.cmp(b)),
            (a, b) => a.type_rank().cmp(&b.type_rank()),
        }
    }
}

pub(crate) fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.chars()
        .flat_map(char::to_lowercase)
        .cmp(b.chars().flat_map(char::to_lowercase))
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        FieldValue::Number(n)
    }
}

impl From<i64> for FieldValue {
    fn from(n: i64) -> Self {
        FieldValue::Integer(n)
    }
}

impl From<DateTime<Utc>> for FieldValue {
    fn from(ts: DateTime<Utc>) -> Self {
        FieldValue::Timestamp(ts)
    }
}

/// An entity record: field values in the order they were received.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, FieldValue)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert, used heavily by tests and screen fixtures.
    pub fn with(mut self, name: &str, value: impl Into<FieldValue>) -> Self {
        self.set(name, value.into());
        self
    }

    /// Convert one JSON object row. Returns `None` for non-object rows.
    pub fn from_json(row: &Value) -> Option<Self> {
        let obj = row.as_object()?;
        let fields = obj
            .iter()
            .map(|(k, v)| (k.clone(), FieldValue::from_json(v)))
            .collect();
        Some(Self { fields })
    }

    /// Convert a JSON array of rows, skipping anything that is not an object.
    pub fn from_json_rows(rows: &[Value]) -> Vec<Self> {
        rows.iter().filter_map(Self::from_json).collect()
    }

    pub fn get(&self, name: &str) -> Option<&FieldValue> {
        self.fields.iter().find(|(k, _)| k == name).map(|(_, v)| v)
    }

    /// Replace an existing field in place, or append a new one.
    pub fn set(&mut self, name: &str, value: FieldValue) {
        match self.fields.iter_mut().find(|(k, _)| k == name) {
            Some((_, slot)) => *slot = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    pub fn id(&self) -> Option<String> {
        self.get(ID_FIELD).and_then(FieldValue::as_key)
    }

    /// Display text of a field, empty when absent or null.
    pub fn text(&self, name: &str) -> String {
        self.get(name).map(FieldValue::display).unwrap_or_default()
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (k, v) in &self.fields {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}
