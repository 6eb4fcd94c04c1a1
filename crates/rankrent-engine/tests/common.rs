//! Fake remote services and fixtures for engine tests.

#![allow(dead_code)] // Each test file uses a different subset

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use rankrent_core::{
    City, CityId, DomainAvailability, KeywordMetrics, Niche, NicheId, Purchase, PurchaseId,
    SearchCriteria, UserId, ValueRange,
};
use rankrent_engine::{DomainService, MetricsService, RemoteError};
use rankrent_store::{MemoryStore, Store};

/// Metrics keyed by keyword; unknown keywords fall back to `default` or fail.
#[derive(Default)]
pub struct ScriptedMetrics {
    pub table: HashMap<String, KeywordMetrics>,
    pub default: Option<KeywordMetrics>,
    pub calls: Mutex<Vec<String>>,
}

impl ScriptedMetrics {
    pub fn always(search_volume: u64, cpc: f64) -> Self {
        Self {
            default: Some(metrics(search_volume, cpc)),
            ..Self::default()
        }
    }

    pub fn with(mut self, keyword: &str, search_volume: u64, cpc: f64) -> Self {
        self.table
            .insert(keyword.to_string(), metrics(search_volume, cpc));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetricsService for ScriptedMetrics {
    async fn keyword_metrics(&self, keyword: &str) -> Result<KeywordMetrics, RemoteError> {
        self.calls.lock().unwrap().push(keyword.to_string());
        self.table
            .get(keyword)
            .or(self.default.as_ref())
            .cloned()
            .ok_or(RemoteError::EmptyPayload("metrics service"))
    }
}

/// Every `.com` is taken; every other extension is free.
#[derive(Default)]
pub struct ComTaken {
    pub calls: Mutex<Vec<String>>,
}

#[async_trait]
impl DomainService for ComTaken {
    async fn check_domain(&self, domain: &str) -> Result<DomainAvailability, RemoteError> {
        self.calls.lock().unwrap().push(domain.to_string());
        Ok(DomainAvailability {
            available: !domain.ends_with(".com"),
            ..DomainAvailability::default()
        })
    }
}

pub fn metrics(search_volume: u64, cpc: f64) -> KeywordMetrics {
    KeywordMetrics {
        search_volume,
        cpc,
        error_message: None,
    }
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

pub fn open_criteria() -> SearchCriteria {
    SearchCriteria {
        niche_id: None,
        city_id: None,
        search_volume: ValueRange::new(0, 1_000_000),
        cpc: ValueRange::new(0.0, 1000.0),
        population: None,
        location_first: false,
    }
}

pub async fn seeded_store(cities: &[City], niches: &[Niche]) -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.replace_cities(cities).await.unwrap();
    store.replace_niches(niches).await.unwrap();
    store
}

/// Give `user_id` credits through a completed purchase.
pub async fn fund(store: &MemoryStore, user_id: UserId, credits: i64) {
    let session_ref = format!("cs_fund_{}", PurchaseId::generate());
    let purchase = Purchase::pending(user_id, credits * 10, credits, session_ref);
    store.put_purchase(&purchase).await.unwrap();
    store.complete_purchase(&purchase.session_ref).await.unwrap();
}
