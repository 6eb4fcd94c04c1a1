//! Engine error types.

use rankrent_core::CoreError;
use rankrent_store::StoreError;
use thiserror::Error;

/// Errors that abort an engine operation.
///
/// Upstream metrics and domain failures never appear here; they degrade to
/// fallback data or "unavailable" instead.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The search criteria failed validation.
    #[error("invalid search criteria: {0}")]
    InvalidCriteria(#[from] CoreError),

    /// The city or niche universe could not be loaded.
    #[error("failed to load {universe}: {source}")]
    Universe {
        /// Which universe failed ("cities" or "niches").
        universe: &'static str,
        /// Underlying store failure.
        #[source]
        source: StoreError,
    },

    /// A credit ledger operation failed.
    #[error("ledger error: {0}")]
    Ledger(#[from] StoreError),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
