//! Service configuration: where the managed database and the geography
//! reference API live.
//!
//! Values come from environment variables first, then the OS credential
//! store. The Supabase URL and anon key may also arrive together as a
//! base64 JSON connection string (`{"url": ..., "key": ...}`).

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine as _;
use serde_json::Value;
use tracing::info;

use crate::api::normalize_base_url;
use crate::error::{Error, Result};
use crate::geo::psgc::DEFAULT_PSGC_URL;
use crate::storage::{
    self, KEY_GEOGRAPHY_URL, KEY_SUPABASE_ANON_KEY, KEY_SUPABASE_CONNECTION, KEY_SUPABASE_URL,
};

const ENV_SUPABASE_URL: &str = "SUPABASE_URL";
const ENV_SUPABASE_ANON_KEY: &str = "SUPABASE_ANON_KEY";
const ENV_SUPABASE_CONNECTION: &str = "SUPABASE_CONNECTION_STRING";
const ENV_GEOGRAPHY_URL: &str = "GEOGRAPHY_API_URL";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub geography_url: String,
}

impl ServiceConfig {
    /// Environment, then credential store.
    pub fn load() -> Result<Self> {
        let config = Self::resolve(|key| {
            let env_key = match key {
                KEY_SUPABASE_URL => ENV_SUPABASE_URL,
                KEY_SUPABASE_ANON_KEY => ENV_SUPABASE_ANON_KEY,
                KEY_SUPABASE_CONNECTION => ENV_SUPABASE_CONNECTION,
                KEY_GEOGRAPHY_URL => ENV_GEOGRAPHY_URL,
                _ => return storage::get_credential(key),
            };
            std::env::var(env_key)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .or_else(|| storage::get_credential(key))
        })?;
        info!(supabase_url = %config.supabase_url, geography_url = %config.geography_url, "service config loaded");
        Ok(config)
    }

    /// Build from a key lookup. Separate URL/key values win over a
    /// connection string.
    pub fn resolve(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let connection = lookup(KEY_SUPABASE_CONNECTION)
            .and_then(|raw| decode_connection_string(&raw));

        let supabase_url = lookup(KEY_SUPABASE_URL)
            .map(|u| normalize_base_url(&u))
            .or_else(|| connection.as_ref().map(|c| c.0.clone()))
            .filter(|u| !u.is_empty())
            .ok_or_else(|| Error::Config("Supabase not configured: missing URL".into()))?;
        let supabase_anon_key = lookup(KEY_SUPABASE_ANON_KEY)
            .map(|k| k.trim().to_string())
            .or_else(|| connection.as_ref().map(|c| c.1.clone()))
            .filter(|k| !k.is_empty())
            .ok_or_else(|| Error::Config("Supabase not configured: missing anon key".into()))?;
        let geography_url = lookup(KEY_GEOGRAPHY_URL)
            .map(|u| normalize_base_url(&u))
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| DEFAULT_PSGC_URL.to_string());

        Ok(Self {
            supabase_url,
            supabase_anon_key,
            geography_url,
        })
    }
}

fn decode_connection_string_payload(raw: &str) -> Option<Value> {
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        return serde_json::from_str::<Value>(trimmed).ok();
    }

    let compact: String = trimmed.chars().filter(|c| !c.is_whitespace()).collect();
    if compact.len() < 20 {
        return None;
    }

    // Accept url-safe alphabets and missing padding.
    let standard = compact.replace('-', "+").replace('_', "/");
    let padded = format!(
        "{}{}",
        standard,
        "=".repeat((4 - standard.len() % 4) % 4)
    );
    let decoded = BASE64_STANDARD.decode(padded).ok()?;
    serde_json::from_slice::<Value>(&decoded).ok()
}

/// `(normalized url, key)` from a connection string, if both are present.
pub fn decode_connection_string(raw: &str) -> Option<(String, String)> {
    let payload = decode_connection_string_payload(raw)?;
    let url = crate::value_str(&payload, &["url", "supabaseUrl", "supabase_url"])
        .map(|u| normalize_base_url(&u))?;
    let key = crate::value_str(&payload, &["key", "anonKey", "supabase_anon_key"])?;
    Some((url, key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn test_resolve_separate_values() {
        let config = ServiceConfig::resolve(lookup_from(&[
            (KEY_SUPABASE_URL, "demo.supabase.co/"),
            (KEY_SUPABASE_ANON_KEY, " anon-key "),
        ]))
        .unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon-key");
        assert_eq!(config.geography_url, DEFAULT_PSGC_URL);
    }

    #[test]
    fn test_resolve_from_connection_string() {
        let raw = BASE64_STANDARD.encode(r#"{"url":"https://demo.supabase.co","key":"anon-key"}"#);
        let config =
            ServiceConfig::resolve(lookup_from(&[(KEY_SUPABASE_CONNECTION, raw.as_str())])).unwrap();
        assert_eq!(config.supabase_url, "https://demo.supabase.co");
        assert_eq!(config.supabase_anon_key, "anon-key");
    }

    #[test]
    fn test_url_safe_unpadded_connection_string() {
        let raw = BASE64_STANDARD
            .encode(r#"{"url":"demo.supabase.co","key":"k?>"}"#)
            .replace('+', "-")
            .replace('/', "_")
            .trim_end_matches('=')
            .to_string();
        assert_eq!(
            decode_connection_string(&raw),
            Some(("https://demo.supabase.co".to_string(), "k?>".to_string()))
        );
    }

    #[test]
    fn test_plain_json_connection_string() {
        let decoded = decode_connection_string(r#"{"url":"localhost:54321","key":"abc"}"#);
        assert_eq!(
            decoded,
            Some(("http://localhost:54321".to_string(), "abc".to_string()))
        );
    }

    #[test]
    fn test_missing_key_is_config_error() {
        let err = ServiceConfig::resolve(lookup_from(&[(KEY_SUPABASE_URL, "demo.supabase.co")]))
            .unwrap_err();
        assert!(matches!(err, Error::Config(_)));
        assert!(err.to_string().contains("anon key"));
    }

    #[test]
    #[serial]
    fn test_load_prefers_environment() {
        std::env::set_var(ENV_SUPABASE_URL, "env.supabase.co");
        std::env::set_var(ENV_SUPABASE_ANON_KEY, "env-key");
        std::env::set_var(ENV_GEOGRAPHY_URL, "http://localhost:8080/api/");
        let config = ServiceConfig::load();
        std::env::remove_var(ENV_SUPABASE_URL);
        std::env::remove_var(ENV_SUPABASE_ANON_KEY);
        std::env::remove_var(ENV_GEOGRAPHY_URL);

        let config = config.unwrap();
        assert_eq!(config.supabase_url, "https://env.supabase.co");
        assert_eq!(config.supabase_anon_key, "env-key");
        assert_eq!(config.geography_url, "http://localhost:8080/api");
    }
}
