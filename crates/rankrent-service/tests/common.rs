//! Common test utilities for rankrent service integration tests.

#![allow(dead_code)] // Some utilities are used by different test files

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::Router;
use axum_test::TestServer;
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::json;

use rankrent_core::{
    City, CityId, DomainAvailability, KeywordMetrics, Niche, NicheId, Purchase, PurchaseId, UserId,
};
use rankrent_engine::{DomainService, EngineConfig, MetricsService, RemoteError};
use rankrent_service::{create_router, AppState, ServiceConfig, StripeClient};
use rankrent_store::{MemoryStore, Store};

pub const JWT_SECRET: &str = "test-jwt-secret";
pub const ADMIN_KEY: &str = "test-admin-key";
pub const WEBHOOK_SECRET: &str = "whsec_test";

/// Every keyword gets the same metrics.
pub struct FixedMetrics {
    pub search_volume: u64,
    pub cpc: f64,
}

#[async_trait]
impl MetricsService for FixedMetrics {
    async fn keyword_metrics(&self, _keyword: &str) -> Result<KeywordMetrics, RemoteError> {
        Ok(KeywordMetrics {
            search_volume: self.search_volume,
            cpc: self.cpc,
            error_message: None,
        })
    }
}

/// Every `.com` is taken; every other extension is free.
pub struct ComTaken;

#[async_trait]
impl DomainService for ComTaken {
    async fn check_domain(&self, domain: &str) -> Result<DomainAvailability, RemoteError> {
        Ok(DomainAvailability {
            available: !domain.ends_with(".com"),
            ..DomainAvailability::default()
        })
    }
}

/// Test harness containing everything needed for integration tests.
pub struct TestHarness {
    /// The test server for making HTTP requests.
    pub server: TestServer,
    /// The backing store, for seeding and assertions.
    pub store: Arc<MemoryStore>,
    /// A test user ID for authenticated requests.
    pub test_user_id: UserId,
    /// Seeded cities, largest first.
    pub cities: Vec<City>,
    /// Seeded niches, by name.
    pub niches: Vec<Niche>,
}

impl TestHarness {
    /// Harness with two cities, three niches and no Stripe client.
    pub async fn new() -> Self {
        Self::build(test_config(), None).await
    }

    /// Harness whose Stripe client points at `stripe_base_url`.
    pub async fn with_stripe(stripe_base_url: &str) -> Self {
        let mut config = test_config();
        config.stripe_api_key = Some("sk_test_xxx".into());
        config.stripe_webhook_secret = Some(WEBHOOK_SECRET.into());

        let stripe = StripeClient::new("sk_test_xxx")
            .expect("Failed to create Stripe client")
            .with_base_url(stripe_base_url);
        Self::build(config, Some(stripe)).await
    }

    async fn build(config: ServiceConfig, stripe: Option<StripeClient>) -> Self {
        let store = Arc::new(MemoryStore::new());

        let cities = vec![
            city("Austin", "TX", 960_000),
            city("Boise", "ID", 235_000),
        ];
        let niches = vec![niche("Electrician"), niche("Plumber"), niche("Roofing")];
        store.replace_cities(&cities).await.expect("seed cities");
        store.replace_niches(&niches).await.expect("seed niches");

        let mut state = AppState::with_services(
            store.clone(),
            config,
            Arc::new(FixedMetrics {
                search_volume: 800,
                cpc: 12.5,
            }),
            Arc::new(ComTaken),
        );
        if let Some(stripe) = stripe {
            state = state.with_stripe(stripe);
        }

        let router: Router = create_router(state);
        let server = TestServer::new(router).expect("Failed to create test server");

        Self {
            server,
            store,
            test_user_id: UserId::generate(),
            cities,
            niches,
        }
    }

    /// Get the authorization header for user authentication.
    pub fn user_auth_header(&self) -> String {
        auth_header_for(self.test_user_id)
    }

    /// Get a different user's auth header (for testing isolation).
    pub fn other_user_auth_header() -> String {
        auth_header_for(UserId::generate())
    }

    /// Give the test user `credits` through a completed purchase.
    pub async fn fund(&self, credits: i64) {
        let purchase = Purchase::pending(
            self.test_user_id,
            credits * 10,
            credits,
            format!("cs_fund_{}", PurchaseId::generate()),
        );
        self.store.put_purchase(&purchase).await.expect("put purchase");
        self.store
            .complete_purchase(&purchase.session_ref)
            .await
            .expect("complete purchase");
    }

    /// Current balance of the test user, straight from the store.
    pub async fn balance(&self) -> i64 {
        self.store
            .get_balance(&self.test_user_id)
            .await
            .expect("get balance")
            .map_or(0, |balance| balance.credits)
    }
}

/// Configuration with no pacing delay and known secrets.
pub fn test_config() -> ServiceConfig {
    ServiceConfig {
        listen_addr: "127.0.0.1:0".into(),
        auth_jwt_secret: Some(JWT_SECRET.into()),
        admin_api_key: Some(ADMIN_KEY.into()),
        engine: EngineConfig {
            metrics_delay: Duration::ZERO,
            ..EngineConfig::default()
        },
        ..ServiceConfig::default()
    }
}

/// A signed bearer token for `user_id`.
pub fn auth_header_for(user_id: UserId) -> String {
    let now = chrono::Utc::now().timestamp();
    let claims = json!({
        "sub": user_id.to_string(),
        "aud": "rankrent",
        "iat": now,
        "exp": now + 3600,
    });
    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(JWT_SECRET.as_bytes()),
    )
    .expect("Failed to sign token");
    format!("Bearer {token}")
}

pub fn city(name: &str, state: &str, population: u64) -> City {
    City {
        id: CityId::generate(),
        name: name.into(),
        state: state.into(),
        population,
    }
}

pub fn niche(name: &str) -> Niche {
    Niche {
        id: NicheId::generate(),
        name: name.into(),
    }
}

/// Criteria accepting every metric value.
pub fn open_criteria() -> serde_json::Value {
    json!({
        "search_volume": { "min": 0, "max": 1_000_000 },
        "cpc": { "min": 0.0, "max": 1000.0 },
    })
}
