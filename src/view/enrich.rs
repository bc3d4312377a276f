//! Foreign-key enrichment.
//!
//! Each rule turns `X_id` into a companion `X_name` field resolved against a
//! reference collection. A miss is data, never an error: the companion field
//! gets the rule's fallback label.

use std::collections::HashMap;

use crate::record::{FieldValue, Record};
use crate::reference::{LookupMap, ReferenceCollection};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichmentRule {
    /// Field holding the foreign-key id, e.g. `role_id`.
    pub foreign_key: String,
    /// Companion field written with the resolved label, e.g. `role_name`.
    pub target: String,
    /// Reference collection to resolve against, e.g. `role`.
    pub dimension: String,
    pub fallback: String,
}

impl EnrichmentRule {
    pub fn new(foreign_key: &str, target: &str, dimension: &str) -> Self {
        Self {
            foreign_key: foreign_key.to_string(),
            target: target.to_string(),
            dimension: dimension.to_string(),
            fallback: default_fallback(dimension),
        }
    }

    pub fn with_fallback(mut self, fallback: &str) -> Self {
        self.fallback = fallback.to_string();
        self
    }
}

/// `"role"` -> `"Unknown Role"`, `"order_status"` -> `"Unknown Order Status"`.
pub fn default_fallback(dimension: &str) -> String {
    let words: Vec<String> = dimension
        .split(['_', ' ', '-'])
        .filter(|w| !w.is_empty())
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    format!("Unknown {}", words.join(" "))
}

/// Lookup maps for one derivation pass. Built from the latest references
/// and dropped with the pass.
pub struct Enricher<'a> {
    rules: Vec<(&'a EnrichmentRule, Option<LookupMap<'a>>)>,
}

impl<'a> Enricher<'a> {
    pub fn new(
        rules: &'a [EnrichmentRule],
        references: &'a HashMap<String, ReferenceCollection>,
    ) -> Self {
        let rules = rules
            .iter()
            .map(|rule| {
                let lookup = references.get(&rule.dimension).map(ReferenceCollection::lookup);
                (rule, lookup)
            })
            .collect();
        Self { rules }
    }

    pub fn enrich(&self, record: &Record) -> Record {
        let mut enriched = record.clone();
        for (rule, lookup) in &self.rules {
            let label = record
                .get(&rule.foreign_key)
                .and_then(FieldValue::as_key)
                .and_then(|id| lookup.as_ref().and_then(|l| l.resolve(&id)))
                .unwrap_or(rule.fallback.as_str());
            enriched.set(&rule.target, FieldValue::text(label));
        }
        enriched
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::ReferenceEntry;

    fn roles() -> HashMap<String, ReferenceCollection> {
        let mut refs = HashMap::new();
        refs.insert(
            "role".to_string(),
            ReferenceCollection::new(
                "role",
                vec![
                    ReferenceEntry::new("1", "Admin"),
                    ReferenceEntry::new("2", "Cashier"),
                ],
            ),
        );
        refs
    }

    #[test]
    fn test_default_fallback() {
        assert_eq!(default_fallback("role"), "Unknown Role");
        assert_eq!(default_fallback("order_status"), "Unknown Order Status");
    }

    #[test]
    fn test_enrich_resolves_numeric_fk() {
        let rules = vec![EnrichmentRule::new("role_id", "role_name", "role")];
        let refs = roles();
        let enricher = Enricher::new(&rules, &refs);
        let record = Record::new().with("id", 1i64).with("role_id", 2i64);
        let enriched = enricher.enrich(&record);
        assert_eq!(enriched.text("role_name"), "Cashier");
        assert_eq!(enriched.text("role_id"), "2");
    }

    #[test]
    fn test_enrich_miss_uses_fallback() {
        let rules = vec![EnrichmentRule::new("role_id", "role_name", "role")];
        let refs = roles();
        let enricher = Enricher::new(&rules, &refs);
        let missing = Record::new().with("role_id", "99");
        let null_fk = Record::new().with("role_id", FieldValue::Null);
        assert_eq!(enricher.enrich(&missing).text("role_name"), "Unknown Role");
        assert_eq!(enricher.enrich(&null_fk).text("role_name"), "Unknown Role");
    }

    #[test]
    fn test_enrich_without_reference_collection() {
        let rules = vec![EnrichmentRule::new("status_id", "status", "status").with_fallback("N/A")];
        let refs = HashMap::new();
        let enricher = Enricher::new(&rules, &refs);
        let record = Record::new().with("status_id", "1");
        assert_eq!(enricher.enrich(&record).text("status"), "N/A");
    }
}
