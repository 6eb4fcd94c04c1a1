//! Credit purchase handlers.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use rankrent_core::{CreditPack, Purchase, PurchaseStatus};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::handlers::{default_limit, MAX_LIMIT};
use crate::state::AppState;
use crate::stripe::client::CheckoutRequest;

/// Checkout request.
#[derive(Debug, Deserialize)]
pub struct CheckoutBody {
    /// Price ID of the credit pack.
    pub price_id: String,
    /// Number of packs (default: 1).
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

const fn default_quantity() -> u32 {
    1
}

/// Checkout response.
#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    /// Stripe checkout session URL.
    pub session_url: String,
    /// Session ID for tracking.
    pub session_id: String,
}

/// Start a credit purchase via Stripe Checkout.
pub async fn create_checkout(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Json(body): Json<CheckoutBody>,
) -> Result<Json<CheckoutResponse>, ApiError> {
    let pack = CreditPack::find(&state.config.credit_packs, &body.price_id)?;
    let (amount_cents, credits) = pack.quote(body.quantity)?;

    let stripe = state
        .stripe
        .as_ref()
        .ok_or_else(|| ApiError::ExternalService("Stripe not configured".into()))?;

    tracing::info!(
        user_id = %auth.user_id,
        price_id = %pack.price_id,
        quantity = body.quantity,
        amount_cents,
        credits,
        "Initiating credit purchase"
    );

    let success_url = format!(
        "{}/credits/success?session_id={{CHECKOUT_SESSION_ID}}",
        state.config.frontend_url
    );
    let cancel_url = format!("{}/credits/cancel", state.config.frontend_url);
    let user_id = auth.user_id.to_string();

    let session = stripe
        .create_checkout_session(&CheckoutRequest {
            user_id: &user_id,
            price_id: &pack.price_id,
            quantity: body.quantity,
            credits,
            success_url: &success_url,
            cancel_url: &cancel_url,
        })
        .await?;

    let session_url = session
        .url
        .ok_or_else(|| ApiError::ExternalService("Stripe returned no checkout URL".into()))?;

    state
        .store
        .put_purchase(&Purchase::pending(
            auth.user_id,
            amount_cents,
            credits,
            &session.id,
        ))
        .await?;

    tracing::info!(
        user_id = %auth.user_id,
        session_id = %session.id,
        "Stripe checkout session created"
    );

    Ok(Json(CheckoutResponse {
        session_url,
        session_id: session.id,
    }))
}

/// Purchase response.
#[derive(Debug, Serialize, Deserialize)]
pub struct PurchaseResponse {
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
    /// When checkout started.
    pub created_at: String,
    /// Last status change.
    pub updated_at: String,
}

impl From<&Purchase> for PurchaseResponse {
    fn from(purchase: &Purchase) -> Self {
        Self {
            id: purchase.id.to_string(),
            session_id: purchase.session_ref.clone(),
            status: purchase.status,
            amount_cents: purchase.amount_cents,
            credits_purchased: purchase.credits_purchased,
            created_at: purchase.created_at.to_rfc3339(),
            updated_at: purchase.updated_at.to_rfc3339(),
        }
    }
}

/// Get one of the caller's purchases by checkout session ID.
///
/// A pending purchase is reconciled against Stripe when a client is
/// configured, so a delayed webhook does not leave the buyer waiting.
pub async fn get_purchase(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Path(session_id): Path<String>,
) -> Result<Json<PurchaseResponse>, ApiError> {
    let not_found = || ApiError::NotFound(format!("purchase not found: {session_id}"));

    let purchase = state
        .store
        .get_purchase_by_session(&session_id)
        .await?
        .filter(|purchase| purchase.user_id == auth.user_id)
        .ok_or_else(not_found)?;

    if purchase.status.is_final() {
        return Ok(Json(PurchaseResponse::from(&purchase)));
    }

    let purchase = reconcile(&state, purchase).await?;
    Ok(Json(PurchaseResponse::from(&purchase)))
}

/// Settle a pending purchase from the live checkout session, if Stripe says
/// it has settled. Stripe failures leave the purchase as stored.
async fn reconcile(state: &AppState, purchase: Purchase) -> Result<Purchase, ApiError> {
    let Some(stripe) = &state.stripe else {
        return Ok(purchase);
    };

    let session = match stripe.get_checkout_session(&purchase.session_ref).await {
        Ok(session) => session,
        Err(e) => {
            tracing::warn!(
                session_id = %purchase.session_ref,
                error = %e,
                "Failed to reconcile purchase with Stripe"
            );
            return Ok(purchase);
        }
    };

    if session.is_paid() {
        if let Some(balance) = state.store.complete_purchase(&purchase.session_ref).await? {
            tracing::info!(
                user_id = %purchase.user_id,
                session_id = %purchase.session_ref,
                balance,
                "Purchase completed on status check"
            );
        }
    } else if session.is_expired() {
        state.store.fail_purchase(&purchase.session_ref).await?;
    } else {
        return Ok(purchase);
    }

    Ok(state
        .store
        .get_purchase_by_session(&purchase.session_ref)
        .await?
        .unwrap_or(purchase))
}

/// Purchase list query parameters.
#[derive(Debug, Deserialize)]
pub struct ListPurchasesQuery {
    /// Maximum number of purchases to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
}

/// List purchases response.
#[derive(Debug, Serialize)]
pub struct ListPurchasesResponse {
    /// Purchases (newest first).
    pub purchases: Vec<PurchaseResponse>,
}

/// List the caller's purchases.
pub async fn list_purchases(
    State(state): State<Arc<AppState>>,
    auth: AuthUser,
    Query(query): Query<ListPurchasesQuery>,
) -> Result<Json<ListPurchasesResponse>, ApiError> {
    let purchases = state
        .store
        .list_purchases_by_user(&auth.user_id, query.limit.min(MAX_LIMIT))
        .await?;

    Ok(Json(ListPurchasesResponse {
        purchases: purchases.iter().map(PurchaseResponse::from).collect(),
    }))
}
