//! Database schema definitions and column families.
//!
//! The PostgreSQL schema lives in `migrations/`; this module names the
//! `RocksDB` column families.

/// Column family names for the `RocksDB` database.
pub mod cf {
    /// City records, keyed by `city_id`.
    pub const CITIES: &str = "cities";

    /// Niche records, keyed by `niche_id`.
    pub const NICHES: &str = "niches";

    /// Balance records, keyed by `user_id`.
    pub const BALANCES: &str = "balances";

    /// Purchase records, keyed by `session_ref`.
    pub const PURCHASES: &str = "purchases";

    /// Index: purchases by user, keyed by `user_id || purchase_id`.
    /// Value is the session reference.
    pub const PURCHASES_BY_USER: &str = "purchases_by_user";

    /// Usage records, keyed by `user_id || usage_id`.
    pub const USAGE: &str = "usage";
}

/// Returns all column family names for database initialization.
#[must_use]
pub fn all_column_families() -> Vec<&'static str> {
    vec![
        cf::CITIES,
        cf::NICHES,
        cf::BALANCES,
        cf::PURCHASES,
        cf::PURCHASES_BY_USER,
        cf::USAGE,
    ]
}
