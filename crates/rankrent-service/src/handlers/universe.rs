//! City and niche universe handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rankrent_core::{City, NewCity, NewNiche, Niche, ValueRange};

use crate::auth::{AdminAuth, AuthUser};
use crate::error::ApiError;
use crate::state::AppState;

/// City list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListCitiesQuery {
    /// Smallest population to include.
    #[serde(default)]
    pub min_population: Option<u64>,
    /// Largest population to include.
    #[serde(default)]
    pub max_population: Option<u64>,
}

impl ListCitiesQuery {
    fn population(&self) -> Result<Option<ValueRange<u64>>, ApiError> {
        if self.min_population.is_none() && self.max_population.is_none() {
            return Ok(None);
        }

        let range = ValueRange::new(
            self.min_population.unwrap_or(0),
            self.max_population.unwrap_or(u64::MAX),
        );
        if range.min > range.max {
            return Err(ApiError::BadRequest(
                "min_population exceeds max_population".into(),
            ));
        }
        Ok(Some(range))
    }
}

/// List cities, largest first.
pub async fn list_cities(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
    Query(query): Query<ListCitiesQuery>,
) -> Result<Json<Vec<City>>, ApiError> {
    let cities = state.store.list_cities(query.population()?).await?;
    Ok(Json(cities))
}

/// List niches by name.
pub async fn list_niches(
    State(state): State<Arc<AppState>>,
    _auth: AuthUser,
) -> Result<Json<Vec<Niche>>, ApiError> {
    Ok(Json(state.store.list_niches().await?))
}

/// Import response.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    /// Number of records now in the universe.
    pub imported: usize,
}

/// Replace the city universe.
pub async fn replace_cities(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(cities): Json<Vec<NewCity>>,
) -> Result<Json<ImportResponse>, ApiError> {
    let cities = cities
        .into_iter()
        .enumerate()
        .map(|(index, city)| {
            city.into_city()
                .map_err(|e| ApiError::BadRequest(format!("record {index}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    state.store.replace_cities(&cities).await?;

    tracing::info!(admin_id = %admin.admin_id, count = cities.len(), "City universe replaced");

    Ok(Json(ImportResponse {
        imported: cities.len(),
    }))
}

/// Replace the niche universe.
pub async fn replace_niches(
    State(state): State<Arc<AppState>>,
    admin: AdminAuth,
    Json(niches): Json<Vec<NewNiche>>,
) -> Result<Json<ImportResponse>, ApiError> {
    let niches = niches
        .into_iter()
        .enumerate()
        .map(|(index, niche)| {
            niche
                .into_niche()
                .map_err(|e| ApiError::BadRequest(format!("record {index}: {e}")))
        })
        .collect::<Result<Vec<_>, _>>()?;

    state.store.replace_niches(&niches).await?;

    tracing::info!(admin_id = %admin.admin_id, count = niches.len(), "Niche universe replaced");

    Ok(Json(ImportResponse {
        imported: niches.len(),
    }))
}
