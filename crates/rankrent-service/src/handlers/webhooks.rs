//! Stripe webhook handler.

use std::sync::Arc;

use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde::Serialize;

use rankrent_core::{Purchase, UserId};
use rankrent_store::StoreError;

use crate::error::ApiError;
use crate::state::AppState;
use crate::stripe::{verify_webhook_signature, CheckoutSession, WebhookEvent};

/// Webhook response.
#[derive(Debug, Serialize)]
pub struct WebhookResponse {
    /// Whether the webhook was processed.
    pub received: bool,
}

/// Handle Stripe webhooks.
pub async fn stripe_webhook(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<Json<WebhookResponse>, ApiError> {
    if let Some(secret) = &state.config.stripe_webhook_secret {
        let signature = headers
            .get("stripe-signature")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ApiError::BadRequest("Missing Stripe signature".into()))?;

        verify_webhook_signature(secret, &body, signature).map_err(|e| {
            tracing::warn!(error = %e, "Invalid Stripe webhook signature");
            ApiError::BadRequest("Invalid webhook signature".into())
        })?;
    } else {
        // No webhook_secret configured - skip verification (development mode)
        tracing::warn!("Stripe webhook_secret not configured - skipping signature verification");
    }

    let event: WebhookEvent =
        serde_json::from_str(&body).map_err(|e| ApiError::BadRequest(e.to_string()))?;

    tracing::info!(
        event_type = %event.event_type,
        event_id = %event.id,
        "Received Stripe webhook"
    );

    match event.event_type.as_str() {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            let session = checkout_session(&event)?;
            if session.is_paid() {
                complete_purchase(&state, &session).await?;
            } else {
                tracing::info!(
                    session_id = %session.id,
                    payment_status = ?session.payment_status,
                    "Checkout completed but payment not yet collected"
                );
            }
        }
        "checkout.session.async_payment_failed" | "checkout.session.expired" => {
            let session = checkout_session(&event)?;
            fail_purchase(&state, &session).await?;
        }
        _ => {
            tracing::debug!(event_type = %event.event_type, "Unhandled Stripe event");
        }
    }

    Ok(Json(WebhookResponse { received: true }))
}

fn checkout_session(event: &WebhookEvent) -> Result<CheckoutSession, ApiError> {
    serde_json::from_value(event.data.object.clone())
        .map_err(|e| ApiError::BadRequest(format!("Invalid checkout session: {e}")))
}

async fn complete_purchase(state: &AppState, session: &CheckoutSession) -> Result<(), ApiError> {
    match state.store.complete_purchase(&session.id).await {
        Ok(Some(balance)) => {
            tracing::info!(
                session_id = %session.id,
                user_id = ?session.client_reference_id,
                amount_cents = ?session.amount_total,
                credits = ?session.metadata_credits(),
                balance,
                "Purchase completed, credits granted"
            );
        }
        Ok(None) => {
            tracing::info!(session_id = %session.id, "Purchase already settled, ignoring");
        }
        Err(StoreError::NotFound { .. }) => recover_purchase(state, session).await?,
        Err(e) => return Err(e.into()),
    }
    Ok(())
}

/// Record and complete a paid session whose purchase was never stored.
///
/// The buyer and credits come from the session itself. Sessions without them
/// are acknowledged so Stripe stops retrying.
async fn recover_purchase(state: &AppState, session: &CheckoutSession) -> Result<(), ApiError> {
    let user_id = session
        .client_reference_id
        .as_deref()
        .and_then(|id| id.parse::<UserId>().ok());
    let credits = session.metadata_credits().filter(|credits| *credits > 0);

    let (Some(user_id), Some(credits)) = (user_id, credits) else {
        tracing::warn!(
            session_id = %session.id,
            client_reference_id = ?session.client_reference_id,
            "Webhook for unknown checkout session without purchase metadata"
        );
        return Ok(());
    };

    let purchase = Purchase::pending(
        user_id,
        session.amount_total.unwrap_or_default(),
        credits,
        &session.id,
    );
    state.store.put_purchase(&purchase).await?;

    if let Some(balance) = state.store.complete_purchase(&session.id).await? {
        tracing::warn!(
            session_id = %session.id,
            user_id = %user_id,
            credits,
            balance,
            "Recovered unrecorded purchase from webhook, credits granted"
        );
    }
    Ok(())
}

async fn fail_purchase(state: &AppState, session: &CheckoutSession) -> Result<(), ApiError> {
    match state.store.fail_purchase(&session.id).await {
        Ok(true) => {
            tracing::info!(session_id = %session.id, "Purchase marked failed");
        }
        Ok(false) => {
            tracing::info!(session_id = %session.id, "Purchase already settled, ignoring");
        }
        Err(StoreError::NotFound { .. }) => {
            tracing::warn!(session_id = %session.id, "Webhook for unknown checkout session");
        }
        Err(e) => return Err(e.into()),
    }
    Ok(())
}
