//! Storage layer for rankrent.
//!
//! The engine reads its city/niche universes and the per-user credit balance
//! through the [`Store`] trait. Three backends implement it:
//!
//! - [`PgStore`]: PostgreSQL via `sqlx`, the production backend
//! - `RocksStore`: embedded `RocksDB` with CBOR values (feature `rocksdb-backend`)
//! - [`MemoryStore`]: in-process maps for tests and local development
//!
//! # Credit mutations
//!
//! A balance only ever changes through [`Store::debit`] or
//! [`Store::complete_purchase`]. Both are single atomic operations in every
//! backend, so two concurrent debits can never overdraw a balance.
//!
//! # Example
//!
//! ```no_run
//! use rankrent_core::UserId;
//! use rankrent_store::{MemoryStore, Store};
//!
//! # async fn example() -> rankrent_store::Result<()> {
//! let store = MemoryStore::new();
//! let user_id = UserId::generate();
//!
//! let balance = store.init_balance(&user_id).await?;
//! assert_eq!(balance.credits, 0);
//! assert_eq!(store.debit(&user_id, 1).await?, None);
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
#[cfg(feature = "rocksdb-backend")]
pub mod keys;
pub mod memory;
pub mod postgres;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
pub mod schema;

pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use postgres::PgStore;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

use async_trait::async_trait;
use rankrent_core::{
    City, CityId, CreditBalance, Niche, NicheId, Purchase, UsageRecord, UserId, ValueRange,
};

/// The storage trait defining all database operations.
#[async_trait]
pub trait Store: Send + Sync {
    // =========================================================================
    // Universe Operations
    // =========================================================================

    /// List cities ordered by descending population, then name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_cities(&self, population: Option<ValueRange<u64>>) -> Result<Vec<City>>;

    /// Get a single city.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_city(&self, city_id: &CityId) -> Result<Option<City>>;

    /// Replace every city with the given set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; the old set is kept.
    async fn replace_cities(&self, cities: &[City]) -> Result<()>;

    /// List niches ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_niches(&self) -> Result<Vec<Niche>>;

    /// Get a single niche.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_niche(&self, niche_id: &NicheId) -> Result<Option<Niche>>;

    /// Replace every niche with the given set.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails; the old set is kept.
    async fn replace_niches(&self, niches: &[Niche]) -> Result<()>;

    // =========================================================================
    // Credit Operations
    // =========================================================================

    /// Point read of a user's balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_balance(&self, user_id: &UserId) -> Result<Option<CreditBalance>>;

    /// Return the user's balance, inserting a zero row first if none exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn init_balance(&self, user_id: &UserId) -> Result<CreditBalance>;

    /// Subtract `amount` only if the balance covers it.
    ///
    /// Returns the new balance, or `None` when the balance is too low or the
    /// user has no balance row. Nothing is written in the `None` case.
    ///
    /// # Errors
    ///
    /// - `StoreError::InvalidAmount` if `amount` is negative.
    /// - `StoreError::Database` if the database operation fails.
    async fn debit(&self, user_id: &UserId, amount: i64) -> Result<Option<i64>>;

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    /// Insert a purchase record unless one already exists for its session.
    ///
    /// Returns `false`, leaving the stored purchase untouched, when the
    /// session was already recorded.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn put_purchase(&self, purchase: &Purchase) -> Result<bool>;

    /// Look up a purchase by its checkout session reference.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn get_purchase_by_session(&self, session_ref: &str) -> Result<Option<Purchase>>;

    /// List a user's purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_purchases_by_user(&self, user_id: &UserId, limit: usize)
        -> Result<Vec<Purchase>>;

    /// Mark a pending purchase completed and credit the buyer, atomically.
    ///
    /// Returns the buyer's new balance, or `None` if the purchase was already
    /// final (repeated webhook deliveries are no-ops).
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no purchase has this session reference.
    /// - `StoreError::Database` if the database operation fails.
    async fn complete_purchase(&self, session_ref: &str) -> Result<Option<i64>>;

    /// Mark a pending purchase failed. Returns `false` if it was already final.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no purchase has this session reference.
    /// - `StoreError::Database` if the database operation fails.
    async fn fail_purchase(&self, session_ref: &str) -> Result<bool>;

    // =========================================================================
    // Usage Operations
    // =========================================================================

    /// Append a usage record.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn append_usage(&self, record: &UsageRecord) -> Result<()>;

    /// List a user's usage records, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    async fn list_usage_by_user(&self, user_id: &UserId, limit: usize)
        -> Result<Vec<UsageRecord>>;
}

/// Canonical city order: descending population, then name.
pub fn sort_cities(cities: &mut [City]) {
    cities.sort_by(|a, b| {
        b.population
            .cmp(&a.population)
            .then_with(|| a.name.cmp(&b.name))
    });
}

/// Canonical niche order: by name.
pub fn sort_niches(niches: &mut [Niche]) {
    niches.sort_by(|a, b| a.name.cmp(&b.name));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn city(name: &str, population: u64) -> City {
        City {
            id: CityId::generate(),
            name: name.into(),
            state: "TX".into(),
            population,
        }
    }

    #[test]
    fn cities_sort_by_population_then_name() {
        let mut cities = vec![city("Waco", 140), city("Austin", 960), city("Abilene", 140)];
        sort_cities(&mut cities);
        let names: Vec<_> = cities.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Austin", "Abilene", "Waco"]);
    }
}
