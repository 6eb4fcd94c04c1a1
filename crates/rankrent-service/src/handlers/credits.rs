//! Credit balance and usage handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rankrent_core::UsageRecord;

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::{default_limit, MAX_LIMIT};
use crate::state::AppState;

/// Balance response.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    /// Remaining credits.
    pub credits: i64,
}

/// Get the caller's credit balance.
///
/// A missing balance row is created at zero. Store failures read as zero.
pub async fn get_balance(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
) -> Json<BalanceResponse> {
    let credits = state.engine.ledger().get_balance(&auth.user_id).await;
    Json(BalanceResponse { credits })
}

/// Usage list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListUsageQuery {
    /// Maximum number of records to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// Usage record response.
#[derive(Debug, Serialize)]
pub struct UsageResponse {
    /// Record ID.
    pub id: String,
    /// Description of the search.
    pub label: String,
    /// Results returned and credits charged.
    pub result_count: u32,
    /// Timestamp.
    pub created_at: String,
}

impl From<&UsageRecord> for UsageResponse {
    fn from(record: &UsageRecord) -> Self {
        Self {
            id: record.id.to_string(),
            label: record.label.clone(),
            result_count: record.result_count,
            created_at: record.created_at.to_rfc3339(),
        }
    }
}

/// List usage response.
#[derive(Debug, Serialize)]
pub struct ListUsageResponse {
    /// Usage records (newest first).
    pub usage: Vec<UsageResponse>,
}

/// List the caller's charged searches.
pub async fn list_usage(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListUsageQuery>,
) -> Result<Json<ListUsageResponse>, ApiError> {
    let records = state
        .engine
        .ledger()
        .usage_history(&auth.user_id, query.limit.min(MAX_LIMIT))
        .await?;

    Ok(Json(ListUsageResponse {
        usage: records.iter().map(UsageResponse::from).collect(),
    }))
}
