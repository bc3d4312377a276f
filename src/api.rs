//! HTTP plumbing shared by the remote sources.
//!
//! Every remote read goes through [`get_json`], which turns transport and
//! status failures into user-facing reasons wrapped in
//! [`Error::DataUnavailable`].

use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// Default timeout for remote reads (20 seconds).
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(20);

// ---------------------------------------------------------------------------
// URL normalisation
// ---------------------------------------------------------------------------

/// Normalise a service base URL:
/// - ensure a scheme is present (https, or http for localhost)
/// - strip trailing slashes
pub fn normalize_base_url(url: &str) -> String {
    let mut url = url.trim().to_string();
    if url.is_empty() {
        return url;
    }

    if !url.starts_with("http://") && !url.starts_with("https://") {
        if url.starts_with("localhost") || url.starts_with("127.0.0.1") {
            url = format!("http://{url}");
        } else {
            url = format!("https://{url}");
        }
    }

    while url.ends_with('/') {
        url.pop();
    }

    url
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// Convert a `reqwest::Error` into a user-friendly message.
fn friendly_error(url: &str, err: &reqwest::Error) -> String {
    if err.is_connect() {
        return format!("Cannot reach {url}");
    }
    if err.is_timeout() {
        return format!("Connection to {url} timed out");
    }
    if err.is_builder() {
        return format!("Invalid URL: {url}");
    }
    format!("Network error communicating with {url}: {err}")
}

/// Convert an HTTP status code into a user-friendly message.
pub(crate) fn status_error(status: StatusCode) -> String {
    match status.as_u16() {
        401 => "API key is invalid or expired".to_string(),
        403 => "Not authorized to read this data".to_string(),
        404 => "Endpoint not found".to_string(),
        s if s >= 500 => format!("Server error (HTTP {s})"),
        s => format!("Unexpected response (HTTP {s})"),
    }
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

pub fn http_client(timeout: Duration) -> Result<Client> {
    Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| Error::Config(format!("Failed to create HTTP client: {e}")))
}

/// Send a prepared GET and decode its JSON body.
///
/// `what` names the data being read ("employees", "province", ...) and ends
/// up in the error so the UI can say what is missing.
pub async fn get_json(request: RequestBuilder, url: &str, what: &str) -> Result<Value> {
    let start = Instant::now();
    let resp = request.send().await.map_err(|e| {
        warn!(what, url, error = %e, "request failed");
        Error::unavailable(what, friendly_error(url, &e))
    })?;

    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        warn!(what, url, status = status.as_u16(), "request rejected");
        let reason = match body.trim() {
            "" => status_error(status),
            detail => format!("{} (HTTP {}): {detail}", status_error(status), status.as_u16()),
        };
        return Err(Error::unavailable(what, reason));
    }

    let body = resp
        .text()
        .await
        .map_err(|e| Error::unavailable(what, friendly_error(url, &e)))?;
    debug!(what, latency_ms = start.elapsed().as_millis() as u64, "response received");
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&body)
        .map_err(|e| Error::InvalidPayload(format!("{what}: invalid JSON ({e})")))
}

/// Pull the row array out of a response body. Accepts a bare array or an
/// object wrapping it under `data`.
pub fn rows_of(body: Value, what: &str) -> Result<Vec<Value>> {
    match body {
        Value::Array(rows) => Ok(rows),
        Value::Object(mut obj) => match obj.remove("data") {
            Some(Value::Array(rows)) => Ok(rows),
            _ => Err(Error::InvalidPayload(format!("{what}: expected an array of rows"))),
        },
        Value::Null => Ok(Vec::new()),
        _ => Err(Error::InvalidPayload(format!("{what}: expected an array of rows"))),
    }
}
