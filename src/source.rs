//! Remote reads feeding the data views: one entity collection per screen
//! plus the reference collections it enriches against.
//!
//! Writes (create/update/delete) belong to the surrounding UI; a view only
//! re-reads entities afterwards.

use reqwest::{Client, Url};
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

use crate::api::{get_json, http_client, rows_of, DEFAULT_TIMEOUT};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::record::Record;
use crate::reference::ReferenceCollection;

#[allow(async_fn_in_trait)]
pub trait EntitySource {
    /// Current full set of entities for the screen.
    async fn fetch_entities(&self) -> Result<Vec<Record>>;
}

#[allow(async_fn_in_trait)]
pub trait ReferenceSource {
    /// A fresh reference collection for `dimension` (roles, statuses, ...).
    async fn fetch_reference(&self, dimension: &str) -> Result<ReferenceCollection>;
}

// ---------------------------------------------------------------------------
// Supabase REST
// ---------------------------------------------------------------------------

/// Reads tables through the Supabase PostgREST endpoint with the anon key.
#[derive(Debug, Clone)]
pub struct SupabaseSource {
    base_url: String,
    anon_key: String,
    client: Client,
    entity_table: String,
    order: Option<String>,
    reference_tables: HashMap<String, String>,
}

impl SupabaseSource {
    pub fn new(config: &ServiceConfig, entity_table: &str) -> Result<Self> {
        Ok(Self {
            base_url: config.supabase_url.trim_end_matches('/').to_string(),
            anon_key: config.supabase_anon_key.clone(),
            client: http_client(DEFAULT_TIMEOUT)?,
            entity_table: entity_table.to_string(),
            order: None,
            reference_tables: HashMap::new(),
        })
    }

    /// Read `dimension` from `table`.
    pub fn reference_table(mut self, dimension: &str, table: &str) -> Self {
        self.reference_tables
            .insert(dimension.to_string(), table.to_string());
        self
    }

    /// Ask the server for a stable fetch order, e.g. `order_by("id")`.
    pub fn order_by(mut self, column: &str) -> Self {
        self.order = Some(format!("{column}.asc"));
        self
    }

    pub fn rows_url(&self, table: &str, order: Option<&str>) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/rest/v1/{table}", self.base_url))
            .map_err(|e| Error::Config(format!("Invalid Supabase URL: {e}")))?;
        {
            let mut qp = url.query_pairs_mut();
            qp.append_pair("select", "*");
            if let Some(order) = order {
                qp.append_pair("order", order);
            }
        }
        Ok(url)
    }

    async fn fetch_rows(&self, table: &str, order: Option<&str>, what: &str) -> Result<Vec<Value>> {
        let url = self.rows_url(table, order)?;
        let request = self
            .client
            .get(url.clone())
            .header("apikey", &self.anon_key)
            .header("Authorization", format!("Bearer {}", self.anon_key))
            .header("Content-Type", "application/json");
        let body = get_json(request, url.as_str(), what).await?;
        let rows = rows_of(body, what)?;
        debug!(table, count = rows.len(), "supabase rows fetched");
        Ok(rows)
    }
}

impl EntitySource for SupabaseSource {
    async fn fetch_entities(&self) -> Result<Vec<Record>> {
        let rows = self
            .fetch_rows(&self.entity_table, self.order.as_deref(), &self.entity_table)
            .await?;
        Ok(Record::from_json_rows(&rows))
    }
}

impl ReferenceSource for SupabaseSource {
    async fn fetch_reference(&self, dimension: &str) -> Result<ReferenceCollection> {
        let table = self.reference_tables.get(dimension).ok_or_else(|| {
            Error::unavailable(dimension, "no table configured for this reference")
        })?;
        let rows = self.fetch_rows(table, None, dimension).await?;
        Ok(ReferenceCollection::from_json_rows(dimension, &rows))
    }
}
