//! PostgreSQL storage implementation.
//!
//! Balance mutations are single conditional statements so the database, not
//! the caller, decides whether a debit fits.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow};
use sqlx::Row;
use uuid::Uuid;

use rankrent_core::{
    City, CityId, CreditBalance, Niche, NicheId, Purchase, PurchaseStatus, UsageRecord, UserId,
    ValueRange,
};

use crate::error::{Result, StoreError};
use crate::Store;

/// PostgreSQL-backed storage implementation.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect to the database at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the pool cannot be established.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(url)
            .await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Apply pending migrations from `migrations/`.
    ///
    /// # Errors
    ///
    /// Returns an error if a migration fails.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

fn to_db_count(value: u64) -> i64 {
    i64::try_from(value).unwrap_or(i64::MAX)
}

fn from_db_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

fn city_from_row(row: &PgRow) -> Result<City> {
    Ok(City {
        id: CityId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
        state: row.try_get::<String, _>("state")?.trim().to_string(),
        population: from_db_count(row.try_get("population")?),
    })
}

fn niche_from_row(row: &PgRow) -> Result<Niche> {
    Ok(Niche {
        id: NicheId::from_uuid(row.try_get("id")?),
        name: row.try_get("name")?,
    })
}

fn balance_from_row(row: &PgRow) -> Result<CreditBalance> {
    Ok(CreditBalance {
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        credits: row.try_get("credits")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn purchase_from_row(row: &PgRow) -> Result<Purchase> {
    let id: String = row.try_get("id")?;
    let status: String = row.try_get("status")?;
    Ok(Purchase {
        id: id
            .parse()
            .map_err(|e| StoreError::Serialization(format!("purchase id {id}: {e}")))?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        amount_cents: row.try_get("amount_cents")?,
        credits_purchased: row.try_get("credits_purchased")?,
        session_ref: row.try_get("session_ref")?,
        status: status.parse().map_err(StoreError::Serialization)?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn usage_from_row(row: &PgRow) -> Result<UsageRecord> {
    let id: String = row.try_get("id")?;
    let count: i32 = row.try_get("result_count")?;
    Ok(UsageRecord {
        id: id
            .parse()
            .map_err(|e| StoreError::Serialization(format!("usage id {id}: {e}")))?,
        user_id: UserId::from_uuid(row.try_get("user_id")?),
        label: row.try_get("label")?,
        result_count: u32::try_from(count).unwrap_or(0),
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

#[async_trait]
impl Store for PgStore {
    async fn list_cities(&self, population: Option<ValueRange<u64>>) -> Result<Vec<City>> {
        let (min, max) = population.map_or((None, None), |range| {
            (Some(to_db_count(range.min)), Some(to_db_count(range.max)))
        });

        let rows = sqlx::query(
            "SELECT id, name, state, population FROM cities \
             WHERE ($1::BIGINT IS NULL OR population >= $1) \
               AND ($2::BIGINT IS NULL OR population <= $2) \
             ORDER BY population DESC, name ASC",
        )
        .bind(min)
        .bind(max)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(city_from_row).collect()
    }

    async fn get_city(&self, city_id: &CityId) -> Result<Option<City>> {
        let row = sqlx::query("SELECT id, name, state, population FROM cities WHERE id = $1")
            .bind(*city_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(city_from_row).transpose()
    }

    async fn replace_cities(&self, cities: &[City]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM cities").execute(&mut *tx).await?;
        for city in cities {
            sqlx::query("INSERT INTO cities (id, name, state, population) VALUES ($1, $2, $3, $4)")
                .bind(*city.id.as_uuid())
                .bind(&city.name)
                .bind(&city.state)
                .bind(to_db_count(city.population))
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!(count = cities.len(), "Replaced cities");
        Ok(())
    }

    async fn list_niches(&self) -> Result<Vec<Niche>> {
        let rows = sqlx::query("SELECT id, name FROM niches ORDER BY name ASC")
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(niche_from_row).collect()
    }

    async fn get_niche(&self, niche_id: &NicheId) -> Result<Option<Niche>> {
        let row = sqlx::query("SELECT id, name FROM niches WHERE id = $1")
            .bind(*niche_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(niche_from_row).transpose()
    }

    async fn replace_niches(&self, niches: &[Niche]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("DELETE FROM niches").execute(&mut *tx).await?;
        for niche in niches {
            sqlx::query("INSERT INTO niches (id, name) VALUES ($1, $2)")
                .bind(*niche.id.as_uuid())
                .bind(&niche.name)
                .execute(&mut *tx)
                .await?;
        }
        tx.commit().await?;
        tracing::info!(count = niches.len(), "Replaced niches");
        Ok(())
    }

    async fn get_balance(&self, user_id: &UserId) -> Result<Option<CreditBalance>> {
        let row = sqlx::query("SELECT user_id, credits, updated_at FROM user_credits WHERE user_id = $1")
            .bind(*user_id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(balance_from_row).transpose()
    }

    async fn init_balance(&self, user_id: &UserId) -> Result<CreditBalance> {
        // The no-op update makes RETURNING yield the existing row on conflict.
        let row = sqlx::query(
            "INSERT INTO user_credits (user_id, credits, updated_at) VALUES ($1, 0, now()) \
             ON CONFLICT (user_id) DO UPDATE SET user_id = EXCLUDED.user_id \
             RETURNING user_id, credits, updated_at",
        )
        .bind(*user_id.as_uuid())
        .fetch_one(&self.pool)
        .await?;
        balance_from_row(&row)
    }

    async fn debit(&self, user_id: &UserId, amount: i64) -> Result<Option<i64>> {
        if amount < 0 {
            return Err(StoreError::InvalidAmount(amount));
        }

        let row = sqlx::query(
            "UPDATE user_credits SET credits = credits - $2, updated_at = now() \
             WHERE user_id = $1 AND credits >= $2 \
             RETURNING credits",
        )
        .bind(*user_id.as_uuid())
        .bind(amount)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|r| r.try_get::<i64, _>("credits"))
            .transpose()
            .map_err(StoreError::from)
    }

    async fn put_purchase(&self, purchase: &Purchase) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO purchases \
             (id, user_id, amount_cents, credits_purchased, session_ref, status, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (session_ref) DO NOTHING",
        )
        .bind(purchase.id.to_string())
        .bind(*purchase.user_id.as_uuid())
        .bind(purchase.amount_cents)
        .bind(purchase.credits_purchased)
        .bind(&purchase.session_ref)
        .bind(purchase.status.as_str())
        .bind(purchase.created_at)
        .bind(purchase.updated_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_purchase_by_session(&self, session_ref: &str) -> Result<Option<Purchase>> {
        let row = sqlx::query("SELECT * FROM purchases WHERE session_ref = $1")
            .bind(session_ref)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(purchase_from_row).transpose()
    }

    async fn list_purchases_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<Purchase>> {
        let rows = sqlx::query(
            "SELECT * FROM purchases WHERE user_id = $1 ORDER BY created_at DESC LIMIT $2",
        )
        .bind(*user_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(purchase_from_row).collect()
    }

    async fn complete_purchase(&self, session_ref: &str) -> Result<Option<i64>> {
        let mut tx = self.pool.begin().await?;

        let claimed = sqlx::query(
            "UPDATE purchases SET status = 'completed', updated_at = now() \
             WHERE session_ref = $1 AND status = 'pending' \
             RETURNING user_id, credits_purchased",
        )
        .bind(session_ref)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(claimed) = claimed else {
            let exists = sqlx::query("SELECT 1 FROM purchases WHERE session_ref = $1")
                .bind(session_ref)
                .fetch_optional(&mut *tx)
                .await?
                .is_some();
            tx.rollback().await?;
            return if exists {
                Ok(None)
            } else {
                Err(StoreError::NotFound {
                    entity: "purchase",
                    id: session_ref.to_string(),
                })
            };
        };

        let user_id: Uuid = claimed.try_get("user_id")?;
        let credits: i64 = claimed.try_get("credits_purchased")?;

        let row = sqlx::query(
            "INSERT INTO user_credits (user_id, credits, updated_at) VALUES ($1, $2, now()) \
             ON CONFLICT (user_id) DO UPDATE \
             SET credits = user_credits.credits + EXCLUDED.credits, updated_at = now() \
             RETURNING credits",
        )
        .bind(user_id)
        .bind(credits)
        .fetch_one(&mut *tx)
        .await?;
        let balance: i64 = row.try_get("credits")?;

        tx.commit().await?;
        Ok(Some(balance))
    }

    async fn fail_purchase(&self, session_ref: &str) -> Result<bool> {
        let result = sqlx::query(
            "UPDATE purchases SET status = $2, updated_at = now() \
             WHERE session_ref = $1 AND status = 'pending'",
        )
        .bind(session_ref)
        .bind(PurchaseStatus::Failed.as_str())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(true);
        }

        match self.get_purchase_by_session(session_ref).await? {
            Some(_) => Ok(false),
            None => Err(StoreError::NotFound {
                entity: "purchase",
                id: session_ref.to_string(),
            }),
        }
    }

    async fn append_usage(&self, record: &UsageRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO usage_records (id, user_id, label, result_count, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(record.id.to_string())
        .bind(*record.user_id.as_uuid())
        .bind(&record.label)
        .bind(i32::try_from(record.result_count).unwrap_or(i32::MAX))
        .bind(record.created_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_usage_by_user(
        &self,
        user_id: &UserId,
        limit: usize,
    ) -> Result<Vec<UsageRecord>> {
        let rows = sqlx::query(
            "SELECT id, user_id, label, result_count, created_at FROM usage_records \
             WHERE user_id = $1 ORDER BY created_at DESC, id DESC LIMIT $2",
        )
        .bind(*user_id.as_uuid())
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(usage_from_row).collect()
    }
}
