//! Error types for rankrent.

use crate::ids::IdError;

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while validating core values.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CoreError {
    /// A search range is malformed.
    #[error("invalid {field} range: {reason}")]
    InvalidRange {
        /// Which criteria field was rejected.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },

    /// A city record failed validation.
    #[error("invalid city {name:?}: {reason}")]
    InvalidCity {
        /// The offending city name.
        name: String,
        /// Why it was rejected.
        reason: String,
    },

    /// A niche record failed validation.
    #[error("invalid niche: {0}")]
    InvalidNiche(String),

    /// Unknown checkout price.
    #[error("unknown price: {0}")]
    UnknownPrice(String),

    /// Invalid purchase quantity.
    #[error("invalid quantity: {0}")]
    InvalidQuantity(u32),

    /// Invalid identifier.
    #[error("invalid identifier: {0}")]
    InvalidId(#[from] IdError),
}
