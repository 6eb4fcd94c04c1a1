//! API handlers.

pub mod credits;
pub mod health;
pub mod purchases;
pub mod search;
pub mod universe;
pub mod webhooks;

/// Default page size for history endpoints.
pub(crate) const fn default_limit() -> usize {
    50
}

/// Largest page size accepted by history endpoints.
pub(crate) const MAX_LIMIT: usize = 100;
