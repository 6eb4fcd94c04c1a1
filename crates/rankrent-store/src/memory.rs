//! In-memory storage implementation.
//!
//! Every operation takes one lock over the whole state, which makes the
//! conditional debit and purchase completion trivially atomic.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use rankrent_core::{
    City, CityId, CreditBalance, Niche, NicheId, Purchase, PurchaseStatus, UsageRecord, UserId,
    ValueRange,
};

use crate::error::{Result, StoreError};
use crate::{sort_cities, sort_niches, Store};

#[derive(Default)]
struct State {
    cities: Vec<City>,
    niches: Vec<Niche>,
    balances: HashMap<UserId, CreditBalance>,
    purchases: HashMap<String, Purchase>,
    usage: Vec<UsageRecord>,
}

/// Store backed by in-process maps. Contents are lost on drop.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_cities(&self, population: Option<ValueRange<u64>>) -> Result<Vec<City>> {
        let state = self.state.read().await;
        let mut cities: Vec<City> = state
            .cities
            .iter()
            .filter(|city| population.map_or(true, |range| range.contains(city.population)))
            .cloned()
            .collect();
        sort_cities(&mut cities);
        Ok(cities)
    }

    async fn get_city(&self, city_id: &CityId) -> Result<Option<City>> {
        let state = self.state.read().await;
        Ok(state.cities.iter().find(|c| c.id == *city_id).cloned())
    }

    async fn replace_cities(&self, cities: &[City]) -> Result<()> {
        self.state.write().await.cities = cities.to_vec();
        Ok(())
    }

    async fn list_niches(&self) -> Result<Vec<Niche>> {
        let mut niches = self.state.read().await.niches.clone();
        sort_niches(&mut niches);
        Ok(niches)
    }

    async fn get_niche(&self, niche_id: &NicheId) -> Result<Option<Niche>> {
        let state = self.state.read().await;
        Ok(state.niches.iter().find(|n| n.id == *niche_id).cloned())
    }

    async fn replace_niches(&self, niches: &[Niche]) -> Result<()> {
        self.state.write().await.niches = niches.to_vec();
        Ok(())
    }

    async fn get_balance(&self, user_id: &UserId) -> Result<Option<CreditBalance>> {
        Ok(self.state.read().await.balances.get(user_id).cloned())
    }

    async fn init_balance(&self, user_id: &UserId) -> Result<CreditBalance> {
        let mut state = self.state.write().await;
        Ok(state
            .balances
            .entry(*user_id)
            .or_insert_with(|| CreditBalance::zero(*user_id))
            .clone())
    }

    async fn debit(&self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        if amount < 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let mut state = self.state.write().await;
        let Some(balance) = state.balances.get_mut(user_id) else {
            return Ok(None);
        };
        if balance.credits < amount {
            return Ok(None);
        }

        balance.credits -= amount;
        balance.updated_at = Utc::now();
        Ok(Some(balance.credits))
    }

    async fn put_purchase(&self, purchase: &Purchase) -> Result<bool> {
        let mut state = self.state.write().await;
        if state.purchases.contains_key(&purchase.session_ref) {
            return Ok(false);
        }
        state
            .purchases
            .insert(purchase.session_ref.clone(), purchase.clone());
        Ok(true)
    }

    async fn get_purchase_by_session(&self, session_ref: &str) -> Result<Option<Purchase>> {
        Ok(self.state.read().await.purchases.get(session_ref).cloned())
    }

    async fn list_purchases_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Purchase>> {
        let state = self.state.read().await;
        let mut purchases: Vec<Purchase> = state
            .purchases
            .values()
            .filter(|p| p.user_id == *user_id)
            .cloned()
            .collect();
        purchases.sort_by(|a, b| b.id.cmp(&a.id));
        purchases.truncate(limit);
        Ok(purchases)
    }

    async fn complete_purchase(&self, session_ref: &str) -> Result<Option<i64>> {
        let mut state = self.state.write().await;
        let purchase = state
            .purchases
            .get_mut(session_ref)
            .ok_or_else(|| StoreError::NotFound {
                entity: "purchase",
                id: session_ref.to_string(),
            })?;

        if purchase.status.is_final() {
            return Ok(None);
        }

        let now = Utc::now();
        purchase.status = PurchaseStatus::Completed;
        purchase.updated_at = now;
        let (user_id, credits) = (purchase.user_id, purchase.credits_purchased);

        let balance = state
            .balances
            .entry(user_id)
            .or_insert_with(|| CreditBalance::zero(user_id));
        balance.credits += credits;
        balance.updated_at = now;
        Ok(Some(balance.credits))
    }

    async fn fail_purchase(&self, session_ref: &str) -> Result<bool> {
        let mut state = self.state.write().await;
        let purchase = state
            .purchases
            .get_mut(session_ref)
            .ok_or_else(|| StoreError::NotFound {
                entity: "purchase",
                id: session_ref.to_string(),
            })?;

        if purchase.status.is_final() {
            return Ok(false);
        }
        purchase.status = PurchaseStatus::Failed;
        purchase.updated_at = Utc::now();
        Ok(true)
    }

    async fn append_usage(&self, record: &UsageRecord) -> Result<()> {
        self.state.write().await.usage.push(record.clone());
        Ok(())
    }

    async fn list_usage_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<UsageRecord>> {
        let state = self.state.read().await;
        Ok(state
            .usage
            .iter()
            .rev()
            .filter(|r| r.user_id == *user_id)
            .take(limit)
            .cloned()
            .collect())
    }
}
