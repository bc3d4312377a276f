//! Philippine Standard Geographic Code (PSGC) API client.

use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use super::{GeoLevel, GeoOption, GeographySource};
use crate::api::{get_json, http_client, normalize_base_url, rows_of, DEFAULT_TIMEOUT};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::record::cmp_ignore_case;

pub const DEFAULT_PSGC_URL: &str = "https://psgc.gitlab.io/api";

#[derive(Debug, Clone)]
pub struct PsgcClient {
    base_url: String,
    client: Client,
}

impl PsgcClient {
    pub fn new(base_url: &str) -> Result<Self> {
        let base_url = normalize_base_url(base_url);
        if base_url.is_empty() {
            return Err(Error::Config("Geography API URL is empty".into()));
        }
        Ok(Self {
            base_url,
            client: http_client(DEFAULT_TIMEOUT)?,
        })
    }

    pub fn from_config(config: &ServiceConfig) -> Result<Self> {
        Self::new(&config.geography_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Endpoint listing `level` units under `parent_code`.
    pub fn url_for(&self, level: GeoLevel, parent_code: Option<&str>) -> Result<String> {
        let path = match (level, parent_code) {
            (GeoLevel::Region, _) => "/regions/".to_string(),
            (GeoLevel::Province, Some(code)) => format!("/regions/{code}/provinces/"),
            (GeoLevel::City, Some(code)) => format!("/provinces/{code}/cities-municipalities/"),
            (GeoLevel::Barangay, Some(code)) => {
                format!("/cities-municipalities/{code}/barangays/")
            }
            (level, None) => {
                return Err(Error::unavailable(
                    level.name(),
                    format!("a {} code is required", level.parent().map_or("parent", GeoLevel::name)),
                ))
            }
        };
        Ok(format!("{}{path}", self.base_url))
    }
}

/// Decode `{code, name}` rows, dropping rows without a code, sorted by name.
pub fn options_from_rows(rows: &[Value]) -> Vec<GeoOption> {
    let mut options: Vec<GeoOption> = rows
        .iter()
        .filter_map(|row| {
            let code = crate::value_key(row, &["code", "psgc_code"])?;
            let name = crate::value_str(row, &["name", "regionName"]).unwrap_or_else(|| code.clone());
            Some(GeoOption { code, name })
        })
        .collect();
    options.sort_by(|a, b| cmp_ignore_case(&a.name, &b.name).then_with(|| a.name.cmp(&b.name)));
    options
}

impl GeographySource for PsgcClient {
    async fn fetch_level(&self, level: GeoLevel, parent_code: Option<&str>) -> Result<Vec<GeoOption>> {
        let url = self.url_for(level, parent_code)?;
        debug!(level = level.name(), parent = ?parent_code, "fetching geography level");
        let body = get_json(self.client.get(&url), &url, level.name()).await?;
        let rows = rows_of(body, level.name())?;
        Ok(options_from_rows(&rows))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_url_for_each_level() {
        let client = PsgcClient::new("psgc.gitlab.io/api/").unwrap();
        assert_eq!(
            client.url_for(GeoLevel::Region, None).unwrap(),
            "https://psgc.gitlab.io/api/regions/"
        );
        assert_eq!(
            client.url_for(GeoLevel::Province, Some("070000000")).unwrap(),
            "https://psgc.gitlab.io/api/regions/070000000/provinces/"
        );
        assert_eq!(
            client.url_for(GeoLevel::City, Some("072200000")).unwrap(),
            "https://psgc.gitlab.io/api/provinces/072200000/cities-municipalities/"
        );
        assert_eq!(
            client.url_for(GeoLevel::Barangay, Some("072217000")).unwrap(),
            "https://psgc.gitlab.io/api/cities-municipalities/072217000/barangays/"
        );
    }

    #[test]
    fn test_from_config_uses_geography_url() {
        let config = ServiceConfig {
            supabase_url: "https://demo.supabase.co".into(),
            supabase_anon_key: "anon".into(),
            geography_url: "http://localhost:8080/api".into(),
        };
        let client = PsgcClient::from_config(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080/api");
        assert_eq!(
            client.url_for(GeoLevel::Region, None).unwrap(),
            "http://localhost:8080/api/regions/"
        );
    }

    #[test]
    fn test_url_for_child_without_parent_fails() {
        let client = PsgcClient::new(DEFAULT_PSGC_URL).unwrap();
        let err = client.url_for(GeoLevel::City, None).unwrap_err();
        assert!(err.is_data_unavailable());
        assert!(err.to_string().contains("province code"));
    }

    #[test]
    fn test_empty_base_url_is_config_error() {
        assert!(matches!(PsgcClient::new("  "), Err(Error::Config(_))));
    }

    #[test]
    fn test_options_from_rows_sorted_by_name() {
        let rows = vec![
            json!({ "code": "072217000", "name": "Cebu City" }),
            json!({ "code": "072201000", "name": "Alcantara" }),
            json!({ "name": "no code" }),
        ];
        let options = options_from_rows(&rows);
        assert_eq!(
            options,
            vec![
                GeoOption::new("072201000", "Alcantara"),
                GeoOption::new("072217000", "Cebu City"),
            ]
        );
    }

    #[test]
    fn test_options_sort_ignores_case() {
        let rows = vec![
            json!({ "code": "1", "name": "Magallanes" }),
            json!({ "code": "2", "name": "dumanjug" }),
            json!({ "code": "3", "name": "Barili" }),
        ];
        let names: Vec<String> = options_from_rows(&rows).into_iter().map(|o| o.name).collect();
        assert_eq!(names, vec!["Barili", "dumanjug", "Magallanes"]);
    }
}
