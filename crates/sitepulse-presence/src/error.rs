//! Error types for the presence service.
//!
//! This module defines all errors that can occur while recording heartbeats,
//! visits, and reading visitor statistics.

use sitepulse_core::CountersId;
use thiserror::Error;

/// A result type using `PresenceError`.
pub type Result<T> = std::result::Result<T, PresenceError>;

/// Errors that can occur in presence operations.
#[derive(Debug, Error)]
pub enum PresenceError {
    /// The referenced counters row does not exist.
    #[error("visitor counters not found: {0}")]
    CountersNotFound(CountersId),

    /// Storage layer error.
    #[error("storage error: {0}")]
    Store(#[from] sitepulse_store::StoreError),

    /// Internal error.
    #[error("internal error: {0}")]
    Internal(String),
}

impl PresenceError {
    /// Returns the appropriate HTTP status code for this error.
    #[must_use]
    pub const fn http_status_code(&self) -> u16 {
        match self {
            Self::CountersNotFound(_) => 404,
            Self::Store(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns true if this error might be resolved by retrying.
    ///
    /// The service itself never retries; this is a hint for callers.
    #[must_use]
    pub const fn is_retriable(&self) -> bool {
        matches!(self, Self::Store(_) | Self::Internal(_))
    }
}
