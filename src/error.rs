//! Error types shared by the view engine, the address selector and the
//! remote sources that feed them.
//!
//! Only fetch boundaries and configuration produce errors. Lookup misses,
//! unknown sort fields and stale geography responses are handled as data.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// A remote read (entities, a reference collection, or one geography
    /// level) failed. The affected state keeps its last-known value.
    #[error("{what} unavailable: {reason}")]
    DataUnavailable { what: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(String),

    /// The remote answered, but not with a collection we can read.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl Error {
    pub fn unavailable(what: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::DataUnavailable {
            what: what.into(),
            reason: reason.into(),
        }
    }

    /// True for the "data unavailable" condition the surrounding UI turns
    /// into a notification.
    pub fn is_data_unavailable(&self) -> bool {
        matches!(self, Error::DataUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, Error>;
