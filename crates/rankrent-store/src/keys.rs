//! Key encoding utilities for `RocksDB`.

use rankrent_core::{CityId, NicheId, PurchaseId, UsageId, UserId};

/// Create a city key from a city ID.
#[must_use]
pub fn city_key(city_id: &CityId) -> Vec<u8> {
    city_id.as_bytes().to_vec()
}

/// Create a niche key from a niche ID.
#[must_use]
pub fn niche_key(niche_id: &NicheId) -> Vec<u8> {
    niche_id.as_bytes().to_vec()
}

/// Create a balance key from a user ID.
#[must_use]
pub fn balance_key(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Create a purchase key from a checkout session reference.
#[must_use]
pub fn purchase_key(session_ref: &str) -> Vec<u8> {
    session_ref.as_bytes().to_vec()
}

/// Create a user-purchase index key.
///
/// Format: `user_id (16 bytes) || purchase_id (16 bytes)`
///
/// Since ULIDs are time-ordered, a user's purchases are sorted by time.
#[must_use]
pub fn user_purchase_key(user_id: &UserId, purchase_id: &PurchaseId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&purchase_id.to_bytes());
    key
}

/// Create a usage record key.
///
/// Format: `user_id (16 bytes) || usage_id (16 bytes)`
#[must_use]
pub fn usage_key(user_id: &UserId, usage_id: &UsageId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&usage_id.to_bytes());
    key
}

/// Create a prefix for iterating all records of a user.
#[must_use]
pub fn user_prefix(user_id: &UserId) -> Vec<u8> {
    user_id.as_bytes().to_vec()
}

/// Largest possible user-scoped key, for seeking to a user's newest record.
#[must_use]
pub fn user_prefix_end(user_id: &UserId) -> Vec<u8> {
    let mut key = Vec::with_capacity(32);
    key.extend_from_slice(user_id.as_bytes());
    key.extend_from_slice(&[0xFF; 16]);
    key
}
