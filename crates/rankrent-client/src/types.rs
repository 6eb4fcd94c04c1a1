//! Request and response types for the rankrent API.

use serde::{Deserialize, Serialize};

use rankrent_core::{KeywordResult, PurchaseStatus};

/// Severity of a search notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeLevel {
    /// Informational.
    Info,
    /// Something the user should act on.
    Warning,
    /// The search failed.
    Error,
}

/// A message raised while searching.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notice {
    /// Severity.
    pub level: NoticeLevel,
    /// Human-readable text.
    pub message: String,
}

/// Response from `POST /v1/search`.
#[derive(Debug, Clone, Deserialize)]
pub struct SearchResponse {
    /// Accepted keywords.
    pub results: Vec<KeywordResult>,
    /// Messages raised while searching.
    pub notices: Vec<Notice>,
    /// Credits debited for this search.
    pub credits_charged: i64,
    /// Balance after the search.
    pub balance: i64,
}

/// Response from `GET /v1/credits/balance`.
#[derive(Debug, Clone, Deserialize)]
pub struct BalanceResponse {
    /// Remaining credits.
    pub credits: i64,
}

/// One charged search.
#[derive(Debug, Clone, Deserialize)]
pub struct UsageEntry {
    /// Record ID.
    pub id: String,
    /// Description of the search.
    pub label: String,
    /// Results returned and credits charged.
    pub result_count: u32,
    /// RFC 3339 timestamp.
    pub created_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct UsageList {
    pub usage: Vec<UsageEntry>,
}

/// Request for `POST /v1/checkout`.
#[derive(Debug, Clone, Serialize)]
pub struct CheckoutRequest {
    /// Price ID of the credit pack.
    pub price_id: String,
    /// Number of packs.
    pub quantity: u32,
}

/// Response from `POST /v1/checkout`.
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutResponse {
    /// Where to send the user to pay.
    pub session_url: String,
    /// Session ID to poll with [`crate::RankrentClient::wait_for_purchase`].
    pub session_id: String,
}

/// A credit purchase.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseInfo {
    /// Purchase ID.
    pub id: String,
    /// Checkout session ID.
    pub session_id: String,
    /// Current status.
    pub status: PurchaseStatus,
    /// Amount charged in cents.
    pub amount_cents: i64,
    /// Credits granted on completion.
    pub credits_purchased: i64,
    /// RFC 3339 timestamp.
    pub created_at: String,
    /// RFC 3339 timestamp.
    pub updated_at: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct PurchaseList {
    pub purchases: Vec<PurchaseInfo>,
}

/// Final state observed by [`crate::RankrentClient::wait_for_purchase`].
#[derive(Debug, Clone)]
pub enum PurchaseWait {
    /// Payment settled and credits were granted.
    Completed(PurchaseInfo),
    /// Payment failed or the checkout expired.
    Failed(PurchaseInfo),
    /// Still pending after every attempt.
    StillProcessing(PurchaseInfo),
}

/// API error response.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorBody {
    pub code: String,
    pub message: String,
}
