//! `RocksDB` storage implementation.
//!
//! `RocksDB` has no conditional update, so every balance mutation runs under
//! `balance_lock` and commits through a single `WriteBatch`.

use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use rocksdb::{
    BoundColumnFamily, ColumnFamilyDescriptor, DBWithThreadMode, Direction, IteratorMode,
    MultiThreaded, Options, WriteBatch,
};

use rankrent_core::{
    City, CityId, CreditBalance, Niche, NicheId, Purchase, PurchaseStatus, UsageRecord, UserId,
    ValueRange,
};

use crate::error::{Result, StoreError};
use crate::keys;
use crate::schema::{all_column_families, cf};
use crate::{sort_cities, sort_niches, Store};

/// RocksDB-backed storage implementation.
pub struct RocksStore {
    db: Arc<DBWithThreadMode<MultiThreaded>>,
    balance_lock: Mutex<()>,
}

impl RocksStore {
    /// Open or create a `RocksDB` database at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or created.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<_> = all_column_families()
            .into_iter()
            .map(|name| ColumnFamilyDescriptor::new(name, Options::default()))
            .collect();

        let db = DBWithThreadMode::open_cf_descriptors(&opts, path, cf_descriptors)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Self {
            db: Arc::new(db),
            balance_lock: Mutex::new(()),
        })
    }

    /// Get a column family handle.
    fn cf(&self, name: &str) -> Result<Arc<BoundColumnFamily<'_>>> {
        self.db
            .cf_handle(name)
            .ok_or_else(|| StoreError::Database(format!("column family not found: {name}")))
    }

    /// Serialize a value using CBOR.
    fn serialize<T: serde::Serialize>(value: &T) -> Result<Vec<u8>> {
        let mut buf = Vec::new();
        ciborium::into_writer(value, &mut buf)
            .map_err(|e| StoreError::Serialization(e.to_string()))?;
        Ok(buf)
    }

    /// Deserialize a value from CBOR.
    fn deserialize<T: serde::de::DeserializeOwned>(data: &[u8]) -> Result<T> {
        ciborium::from_reader(data).map_err(|e| StoreError::Serialization(e.to_string()))
    }

    fn get<T: serde::de::DeserializeOwned>(&self, cf_name: &str, key: &[u8]) -> Result<Option<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .get_cf(&cf, key)
            .map_err(|e| StoreError::Database(e.to_string()))?
            .map(|data| Self::deserialize(&data))
            .transpose()
    }

    /// Decode every value in a column family.
    fn scan_all<T: serde::de::DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>> {
        let cf = self.cf(cf_name)?;
        self.db
            .iterator_cf(&cf, IteratorMode::Start)
            .map(|item| {
                let (_, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
                Self::deserialize(&value)
            })
            .collect()
    }

    /// Newest-first scan of one user's keys, reading at most `limit` entries.
    fn scan_user_newest(
        &self,
        cf_name: &str,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<(Vec<u8>, Vec<u8>)>> {
        let cf = self.cf(cf_name)?;
        let prefix = keys::user_prefix(user_id);
        let end = keys::user_prefix_end(user_id);

        let mut entries = Vec::new();
        for item in self
            .db
            .iterator_cf(&cf, IteratorMode::From(&end, Direction::Reverse))
            .take(limit)
        {
            let (key, value) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            if !key.starts_with(&prefix) {
                break;
            }
            entries.push((key.to_vec(), value.to_vec()));
        }
        Ok(entries)
    }

    /// Replace the contents of a column family in one batch.
    fn replace_all<T: serde::Serialize>(
        &self,
        cf_name: &str,
        records: impl Iterator<Item = (Vec<u8>, T)>,
    ) -> Result<()> {
        let cf = self.cf(cf_name)?;
        let mut batch = WriteBatch::default();

        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (key, _) = item.map_err(|e| StoreError::Database(e.to_string()))?;
            batch.delete_cf(&cf, key);
        }
        for (key, record) in records {
            batch.put_cf(&cf, key, Self::serialize(&record)?);
        }

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    fn lock_balances(&self) -> Result<std::sync::MutexGuard<'_, ()>> {
        self.balance_lock
            .lock()
            .map_err(|_| StoreError::Database("balance lock poisoned".into()))
    }

    fn purchase_not_found(session_ref: &str) -> StoreError {
        StoreError::NotFound {
            entity: "purchase",
            id: session_ref.to_string(),
        }
    }
}

#[async_trait]
impl Store for RocksStore {
    // =========================================================================
    // Universe Operations
    // =========================================================================

    async fn list_cities(&self, population: Option<ValueRange<u64>>) -> Result<Vec<City>> {
        let mut cities: Vec<City> = self.scan_all(cf::CITIES)?;
        if let Some(range) = population {
            cities.retain(|city| range.contains(city.population));
        }
        sort_cities(&mut cities);
        Ok(cities)
    }

    async fn get_city(&self, city_id: &CityId) -> Result<Option<City>> {
        self.get(cf::CITIES, &keys::city_key(city_id))
    }

    async fn replace_cities(&self, cities: &[City]) -> Result<()> {
        self.replace_all(
            cf::CITIES,
            cities.iter().map(|city| (keys::city_key(&city.id), city)),
        )
    }

    async fn list_niches(&self) -> Result<Vec<Niche>> {
        let mut niches: Vec<Niche> = self.scan_all(cf::NICHES)?;
        sort_niches(&mut niches);
        Ok(niches)
    }

    async fn get_niche(&self, niche_id: &NicheId) -> Result<Option<Niche>> {
        self.get(cf::NICHES, &keys::niche_key(niche_id))
    }

    async fn replace_niches(&self, niches: &[Niche]) -> Result<()> {
        self.replace_all(
            cf::NICHES,
            niches.iter().map(|niche| (keys::niche_key(&niche.id), niche)),
        )
    }

    // =========================================================================
    // Credit Operations
    // =========================================================================

    async fn get_balance(&self, user_id: &UserId) -> Result<Option<CreditBalance>> {
        self.get(cf::BALANCES, &keys::balance_key(user_id))
    }

    async fn init_balance(&self, user_id: &UserId) -> Result<CreditBalance> {
        let _guard = self.lock_balances()?;
        let key = keys::balance_key(user_id);

        if let Some(existing) = self.get(cf::BALANCES, &key)? {
            return Ok(existing);
        }

        let balance = CreditBalance::zero(*user_id);
        let cf = self.cf(cf::BALANCES)?;
        self.db
            .put_cf(&cf, key, Self::serialize(&balance)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(balance)
    }

    async fn debit(&self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        if amount < 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let _guard = self.lock_balances()?;
        let key = keys::balance_key(user_id);
        let Some(mut balance) = self.get::<CreditBalance>(cf::BALANCES, &key)? else {
            return Ok(None);
        };
        if balance.credits < amount {
            return Ok(None);
        }

        balance.credits -= amount;
        balance.updated_at = Utc::now();

        let cf = self.cf(cf::BALANCES)?;
        self.db
            .put_cf(&cf, key, Self::serialize(&balance)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(Some(balance.credits))
    }

    // =========================================================================
    // Purchase Operations
    // =========================================================================

    async fn put_purchase(&self, purchase: &Purchase) -> Result<bool> {
        let _guard = self.lock_balances()?;

        let purchase_key = keys::purchase_key(&purchase.session_ref);
        if self.get::<Purchase>(cf::PURCHASES, &purchase_key)?.is_some() {
            return Ok(false);
        }

        let cf_purchases = self.cf(cf::PURCHASES)?;
        let cf_by_user = self.cf(cf::PURCHASES_BY_USER)?;

        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_purchases, purchase_key, Self::serialize(purchase)?);
        batch.put_cf(
            &cf_by_user,
            keys::user_purchase_key(&purchase.user_id, &purchase.id),
            purchase.session_ref.as_bytes(),
        );

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(true)
    }

    async fn get_purchase_by_session(&self, session_ref: &str) -> Result<Option<Purchase>> {
        self.get(cf::PURCHASES, &keys::purchase_key(session_ref))
    }

    async fn list_purchases_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Purchase>> {
        let entries = self.scan_user_newest(cf::PURCHASES_BY_USER, user_id, limit)?;

        let mut purchases = Vec::new();
        for (_, session_ref) in entries {
            if let Some(purchase) = self.get(cf::PURCHASES, &session_ref)? {
                purchases.push(purchase);
            }
        }
        Ok(purchases)
    }

    async fn complete_purchase(&self, session_ref: &str) -> Result<Option<i64>> {
        let _guard = self.lock_balances()?;

        let purchase_key = keys::purchase_key(session_ref);
        let mut purchase: Purchase = self
            .get(cf::PURCHASES, &purchase_key)?
            .ok_or_else(|| Self::purchase_not_found(session_ref))?;
        if purchase.status.is_final() {
            return Ok(None);
        }

        let now = Utc::now();
        purchase.status = PurchaseStatus::Completed;
        purchase.updated_at = now;

        let balance_key = keys::balance_key(&purchase.user_id);
        let mut balance = self
            .get::<CreditBalance>(cf::BALANCES, &balance_key)?
            .unwrap_or_else(|| CreditBalance::zero(purchase.user_id));
        balance.credits += purchase.credits_purchased;
        balance.updated_at = now;

        let cf_purchases = self.cf(cf::PURCHASES)?;
        let cf_balances = self.cf(cf::BALANCES)?;
        let mut batch = WriteBatch::default();
        batch.put_cf(&cf_purchases, &purchase_key, Self::serialize(&purchase)?);
        batch.put_cf(&cf_balances, &balance_key, Self::serialize(&balance)?);

        self.db
            .write(batch)
            .map_err(|e| StoreError::Database(e.to_string()))?;

        Ok(Some(balance.credits))
    }

    async fn fail_purchase(&self, session_ref: &str) -> Result<bool> {
        let _guard = self.lock_balances()?;

        let key = keys::purchase_key(session_ref);
        let mut purchase: Purchase = self
            .get(cf::PURCHASES, &key)?
            .ok_or_else(|| Self::purchase_not_found(session_ref))?;
        if purchase.status.is_final() {
            return Ok(false);
        }

        purchase.status = PurchaseStatus::Failed;
        purchase.updated_at = Utc::now();

        let cf = self.cf(cf::PURCHASES)?;
        self.db
            .put_cf(&cf, key, Self::serialize(&purchase)?)
            .map_err(|e| StoreError::Database(e.to_string()))?;
        Ok(true)
    }

    // =========================================================================
    // Usage Operations
    // =========================================================================

    async fn append_usage(&self, record: &UsageRecord) -> Result<()> {
        let cf = self.cf(cf::USAGE)?;
        self.db
            .put_cf(
                &cf,
                keys::usage_key(&record.user_id, &record.id),
                Self::serialize(record)?,
            )
            .map_err(|e| StoreError::Database(e.to_string()))
    }

    async fn list_usage_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<UsageRecord>> {
        self.scan_user_newest(cf::USAGE, user_id, limit)?
            .into_iter()
            .map(|(_, value)| Self::deserialize(&value))
            .collect()
    }
}
