//! The Small Admin - operational data views for the back office and
//! address selection for checkout.
//!
//! Two pieces of state logic shared by the storefront and admin screens:
//!
//! - [`view`]: filter / enrich / sort / paginate over a fully fetched entity
//!   collection (employees, orders, inventory), driven by per-screen
//!   [`view::ViewConfig`]s.
//! - [`geo`]: the region -> province -> city -> barangay cascading selector
//!   used in checkout address entry.
//!
//! Both consume remote reads through small traits ([`source`],
//! [`geo::GeographySource`]) with Supabase and PSGC HTTP implementations.

use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub mod api;
pub mod config;
pub mod error;
pub mod geo;
pub mod record;
pub mod reference;
pub mod screen;
pub mod source;
pub mod storage;
pub mod view;

pub use config::ServiceConfig;
pub use error::{Error, Result};
pub use geo::{AddressSelector, GeoLevel, GeoOption, GeographySource};
pub use record::{FieldValue, Record};
pub use reference::{ReferenceCollection, ReferenceEntry};
pub use screen::{MountReport, ScreenController};
pub use view::{DataView, DerivedView, SortDirection, ViewConfig};

const LOG_FILE_PREFIX: &str = "admin";

// ============================================================================
// JSON helpers
// ============================================================================

/// First non-empty, trimmed string among `keys`.
pub(crate) fn value_str(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        if let Some(s) = v.get(*key).and_then(|x| x.as_str()) {
            let trimmed = s.trim();
            if !trimmed.is_empty() {
                return Some(trimmed.to_string());
            }
        }
    }
    None
}

/// Like [`value_str`], but also accepts numeric ids (`7` -> `"7"`).
pub(crate) fn value_key(v: &Value, keys: &[&str]) -> Option<String> {
    for key in keys {
        match v.get(*key) {
            Some(Value::Number(n)) => return Some(n.to_string()),
            Some(Value::String(s)) if !s.trim().is_empty() => return Some(s.trim().to_string()),
            _ => {}
        }
    }
    None
}

// ============================================================================
// Logging
// ============================================================================

pub fn default_log_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                .join(".local")
                .join("share")
        });
    base.join("com.thesmall.admin").join("logs")
}

/// Install structured logging: console plus a daily rolling file in
/// `log_dir`.
///
/// Keep the returned guard alive for the lifetime of the process; dropping
/// it flushes and stops the file writer. Returns `None` when a global
/// subscriber is already installed.
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,the_small_admin_lib=debug"));

    std::fs::create_dir_all(log_dir).ok();
    let file_appender = tracing_appender::rolling::daily(log_dir, LOG_FILE_PREFIX);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true);
    let console_layer = fmt::layer().with_target(true);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .ok()?;

    info!("Starting The Small Admin v{}", env!("CARGO_PKG_VERSION"));
    Some(guard)
}
