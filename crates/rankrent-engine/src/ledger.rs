//! Credit ledger.

use std::sync::Arc;

use rankrent_core::{UsageRecord, UserId};
use rankrent_store::Store;

use crate::error::Result;

/// Reads and meters per-user credit balances.
#[derive(Clone)]
pub struct CreditLedger {
    store: Arc<dyn Store>,
}

impl CreditLedger {
    /// Create a ledger over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Current balance for `user_id`.
    ///
    /// A user without a balance row gets a zero row created. Any store
    /// failure reads as 0.
    pub async fn get_balance(&self, user_id: &UserId) -> i64 {
        let balance = match self.store.get_balance(user_id).await {
            Ok(Some(balance)) => Ok(balance),
            Ok(None) => self.store.init_balance(user_id).await,
            Err(e) => Err(e),
        };

        match balance {
            Ok(balance) => balance.credits,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to read credit balance");
                0
            }
        }
    }

    /// Debit `amount` credits if the balance covers it.
    ///
    /// Returns `false` without touching the balance when it does not.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `amount` is negative.
    pub async fn check_and_debit(&self, user_id: &UserId, amount: i64) -> Result<bool> {
        Ok(self.debit(user_id, amount).await?.is_some())
    }

    /// Debit `amount` credits if the balance covers it, returning the new
    /// balance. `None` means the balance was insufficient.
    ///
    /// The check and the decrement are one conditional store update.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails or `amount` is negative.
    pub async fn debit(&self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        let balance = self.store.debit(user_id, amount).await?;

        match balance {
            Some(balance) => {
                tracing::info!(user_id = %user_id, amount, balance, "Credits debited");
            }
            None => {
                tracing::info!(user_id = %user_id, amount, "Insufficient credits for debit");
            }
        }
        Ok(balance)
    }

    /// Append a usage record. Failures are logged and swallowed.
    pub async fn record_usage(&self, user_id: &UserId, label: &str, result_count: u32) {
        let record = UsageRecord::new(*user_id, label, result_count);

        if let Err(e) = self.store.append_usage(&record).await {
            tracing::warn!(
                user_id = %user_id,
                label = %label,
                error = %e,
                "Failed to record usage"
            );
        }
    }

    /// Most recent usage records for `user_id`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn usage_history(&self, user_id: &UserId, limit: usize) -> Result<Vec<UsageRecord>> {
        Ok(self.store.list_usage_by_user(user_id, limit).await?)
    }
}
