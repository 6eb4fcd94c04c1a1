//! Credit balances, purchases, and the usage audit trail.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};
use crate::ids::{PurchaseId, UsageId, UserId};

/// Largest quantity accepted for a single checkout.
pub const MAX_CHECKOUT_QUANTITY: u32 = 100;

/// A user's credit balance. One row per user, created lazily at zero.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditBalance {
    /// Owner.
    pub user_id: UserId,
    /// Remaining credits; never negative.
    pub credits: i64,
    /// Last mutation time.
    pub updated_at: DateTime<Utc>,
}

impl CreditBalance {
    /// A fresh zero balance.
    #[must_use]
    pub fn zero(user_id: UserId) -> Self {
        Self {
            user_id,
            credits: 0,
            updated_at: Utc::now(),
        }
    }
}

/// Lifecycle of a purchase. Settling from `Pending` happens once; later
/// updates are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PurchaseStatus {
    /// Checkout started, payment not confirmed.
    Pending,
    /// Paid; credits granted.
    Completed,
    /// Payment failed or the checkout expired.
    Failed,
}

impl PurchaseStatus {
    /// Storage representation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }

    /// Whether the purchase can still change state.
    #[must_use]
    pub const fn is_final(&self) -> bool {
        !matches!(self, Self::Pending)
    }
}

impl fmt::Display for PurchaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PurchaseStatus {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            other => Err(format!("unknown purchase status: {other}")),
        }
    }
}

/// A credit purchase made through the external checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Purchase {
    /// Purchase ID.
    pub id: PurchaseId,
    /// Buyer.
    pub user_id: UserId,
    /// Amount charged, in cents.
    pub amount_cents: i64,
    /// Credits granted on completion.
    pub credits_purchased: i64,
    /// Checkout session reference from the payment provider.
    pub session_ref: String,
    /// Current status.
    pub status: PurchaseStatus,
    /// When checkout started.
    pub created_at: DateTime<Utc>,
    /// Last status change.
    pub updated_at: DateTime<Utc>,
}

impl Purchase {
    /// A new pending purchase for a checkout session.
    #[must_use]
    pub fn pending(
        user_id: UserId,
        amount_cents: i64,
        credits_purchased: i64,
        session_ref: impl Into<String>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: PurchaseId::generate(),
            user_id,
            amount_cents,
            credits_purchased,
            session_ref: session_ref.into(),
            status: PurchaseStatus::Pending,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Append-only audit record written after a charged search.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageRecord {
    /// Record ID.
    pub id: UsageId,
    /// Who searched.
    pub user_id: UserId,
    /// Human-readable description of the search.
    pub label: String,
    /// Results returned (and credits charged).
    pub result_count: u32,
    /// When the search ran.
    pub created_at: DateTime<Utc>,
}

impl UsageRecord {
    /// A record stamped now.
    #[must_use]
    pub fn new(user_id: UserId, label: impl Into<String>, result_count: u32) -> Self {
        Self {
            id: UsageId::generate(),
            user_id,
            label: label.into(),
            result_count,
            created_at: Utc::now(),
        }
    }
}

/// A purchasable bundle of credits, keyed by the payment provider's price ID.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreditPack {
    /// Payment provider price ID.
    pub price_id: String,
    /// Credits granted per unit.
    pub credits: i64,
    /// Price per unit in cents.
    pub amount_cents: i64,
}

impl CreditPack {
    /// Total `(amount_cents, credits)` for `quantity` units.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::InvalidQuantity` for zero or oversized quantities.
    pub fn quote(&self, quantity: u32) -> Result<(i64, i64)> {
        if quantity == 0 || quantity > MAX_CHECKOUT_QUANTITY {
            return Err(CoreError::InvalidQuantity(quantity));
        }
        let quantity = i64::from(quantity);
        Ok((self.amount_cents * quantity, self.credits * quantity))
    }

    /// Find the pack for a price ID.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::UnknownPrice` when no pack matches.
    pub fn find<'a>(packs: &'a [Self], price_id: &str) -> Result<&'a Self> {
        packs
            .iter()
            .find(|pack| pack.price_id == price_id)
            .ok_or_else(|| CoreError::UnknownPrice(price_id.to_string()))
    }
}
