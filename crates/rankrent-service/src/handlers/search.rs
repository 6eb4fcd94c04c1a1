//! Niche search handler.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde::Serialize;

use rankrent_core::{KeywordResult, SearchCriteria};
use rankrent_engine::{Notice, NoticeBuffer, TracingNotifier};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Search response.
#[derive(Debug, Serialize)]
pub struct SearchResponse {
    /// Accepted keywords, at most the configured result cap.
    pub results: Vec<KeywordResult>,
    /// Messages raised while searching, oldest first.
    pub notices: Vec<Notice>,
    /// Credits debited for this search.
    pub credits_charged: i64,
    /// Balance after the search.
    pub balance: i64,
}

/// Run a metered niche search for the caller.
pub async fn search(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    payload: Result<Json<SearchCriteria>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(criteria) = payload?;
    tracing::info!(
        user_id = %auth.user_id,
        city_id = ?criteria.city_id,
        niche_id = ?criteria.niche_id,
        "Search requested"
    );

    let buffer = NoticeBuffer::new();
    let outcome = state
        .engine
        .search(&auth.session(), &criteria, &(&buffer, TracingNotifier))
        .await?;

    Ok(Json(SearchResponse {
        results: outcome.results,
        notices: buffer.take(),
        credits_charged: outcome.credits_charged,
        balance: outcome.balance,
    }))
}
