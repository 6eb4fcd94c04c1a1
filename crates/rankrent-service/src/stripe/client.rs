//! Stripe API client implementation.

use reqwest::Client;
use std::time::Duration;

use super::types::{CheckoutSession, StripeErrorResponse};
use crate::crypto::{constant_time_eq, hmac_sha256_hex};

/// Maximum age of a signed webhook, in seconds.
const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Error type for Stripe operations.
#[derive(Debug, thiserror::Error)]
pub enum StripeError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Stripe API returned an error.
    #[error("Stripe API error: {error_type} - {message}")]
    Api {
        /// Error type.
        error_type: String,
        /// Error message.
        message: String,
        /// Error code.
        code: Option<String>,
    },

    /// Invalid webhook signature.
    #[error("Invalid webhook signature")]
    InvalidSignature,

    /// Webhook timestamp outside the tolerance window.
    #[error("Webhook timestamp outside tolerance")]
    StaleTimestamp,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Configuration(String),
}

/// Parameters for a credit checkout.
#[derive(Debug, Clone)]
pub struct CheckoutRequest<'a> {
    /// Our internal user ID (`client_reference_id`).
    pub user_id: &'a str,
    /// Stripe price ID of the credit pack.
    pub price_id: &'a str,
    /// Number of packs.
    pub quantity: u32,
    /// Total credits granted on completion (stored as metadata).
    pub credits: i64,
    /// URL to redirect on success.
    pub success_url: &'a str,
    /// URL to redirect on cancel.
    pub cancel_url: &'a str,
}

/// Stripe API client.
#[derive(Debug, Clone)]
pub struct StripeClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl StripeClient {
    /// Stripe API base URL.
    const BASE_URL: &'static str = "https://api.stripe.com/v1";

    /// Create a new Stripe client.
    ///
    /// # Arguments
    ///
    /// * `api_key` - Stripe secret API key (`sk_test_...` or `sk_live_...`)
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, StripeError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            api_key: api_key.into(),
            base_url: Self::BASE_URL.to_string(),
        })
    }

    /// Point the client at a different API host (e.g. a local mock).
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Create a Checkout session for purchasing credits.
    pub async fn create_checkout_session(
        &self,
        request: &CheckoutRequest<'_>,
    ) -> Result<CheckoutSession, StripeError> {
        let params = [
            ("mode", "payment".to_string()),
            ("success_url", request.success_url.to_string()),
            ("cancel_url", request.cancel_url.to_string()),
            ("client_reference_id", request.user_id.to_string()),
            ("line_items[0][price]", request.price_id.to_string()),
            ("line_items[0][quantity]", request.quantity.to_string()),
            ("metadata[user_id]", request.user_id.to_string()),
            ("metadata[credits]", request.credits.to_string()),
        ];

        tracing::debug!(
            user_id = %request.user_id,
            price_id = %request.price_id,
            quantity = request.quantity,
            "Creating Stripe checkout session"
        );

        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .form(&params)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Retrieve a Checkout session by ID.
    pub async fn get_checkout_session(
        &self,
        session_id: &str,
    ) -> Result<CheckoutSession, StripeError> {
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.base_url, session_id))
            .basic_auth(&self.api_key, Option::<&str>::None)
            .send()
            .await?;

        self.handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> Result<T, StripeError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        // Try to parse error response
        let error_body: Result<StripeErrorResponse, _> = response.json().await;

        match error_body {
            Ok(stripe_error) => Err(StripeError::Api {
                error_type: stripe_error.error.error_type,
                message: stripe_error.error.message,
                code: stripe_error.error.code,
            }),
            Err(_) => Err(StripeError::Api {
                error_type: "unknown".to_string(),
                message: format!("HTTP {status}"),
                code: None,
            }),
        }
    }
}

/// Verify a `Stripe-Signature` header against the current time.
///
/// # Errors
///
/// Returns `InvalidSignature` if no `v1` entry matches and `StaleTimestamp`
/// if the signed timestamp is outside the tolerance window.
pub fn verify_webhook_signature(
    secret: &str,
    payload: &str,
    signature: &str,
) -> Result<(), StripeError> {
    verify_signature(secret, payload, signature, chrono::Utc::now().timestamp())
}

/// Verify a `Stripe-Signature` header against `secret` as of `now` (Unix seconds).
///
/// The header has the form `t=timestamp,v1=signature[,v1=signature...]`; any
/// matching `v1` entry is accepted.
pub fn verify_signature(
    secret: &str,
    payload: &str,
    signature: &str,
    now: i64,
) -> Result<(), StripeError> {
    let mut timestamp: Option<&str> = None;
    let mut signatures: Vec<&str> = Vec::new();

    for part in signature.split(',') {
        let mut kv = part.splitn(2, '=');
        match (kv.next(), kv.next()) {
            (Some("t"), Some(ts)) => timestamp = Some(ts),
            (Some("v1"), Some(sig)) => signatures.push(sig),
            _ => {}
        }
    }

    let timestamp = timestamp.ok_or(StripeError::InvalidSignature)?;
    if signatures.is_empty() {
        return Err(StripeError::InvalidSignature);
    }

    let signed_at: i64 = timestamp
        .parse()
        .map_err(|_| StripeError::InvalidSignature)?;
    if (now - signed_at).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(StripeError::StaleTimestamp);
    }

    let expected = hmac_sha256_hex(secret, &format!("{timestamp}.{payload}"))
        .map_err(|e| StripeError::Configuration(e.to_string()))?;

    if signatures.iter().any(|sig| constant_time_eq(&expected, sig)) {
        Ok(())
    } else {
        Err(StripeError::InvalidSignature)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SECRET: &str = "whsec_test";

    fn signed(payload: &str, timestamp: i64) -> String {
        let sig = hmac_sha256_hex(SECRET, &format!("{timestamp}.{payload}")).unwrap();
        format!("t={timestamp},v1={sig}")
    }

    #[test]
    fn valid_signature_is_accepted() {
        let payload = r#"{"id":"evt_1"}"#;
        let header = signed(payload, 1_700_000_000);
        assert!(verify_signature(SECRET, payload, &header, 1_700_000_010).is_ok());
    }

    #[test]
    fn tampered_payload_is_rejected() {
        let header = signed(r#"{"id":"evt_1"}"#, 1_700_000_000);
        assert!(matches!(
            verify_signature(SECRET, r#"{"id":"evt_2"}"#, &header, 1_700_000_000),
            Err(StripeError::InvalidSignature)
        ));
        assert!(matches!(
            verify_signature("whsec_other", r#"{"id":"evt_1"}"#, &header, 1_700_000_000),
            Err(StripeError::InvalidSignature)
        ));
    }

    #[test]
    fn stale_signature_is_rejected() {
        let payload = "{}";
        assert!(matches!(
            verify_signature(SECRET, payload, &signed(payload, 1_700_000_000), 1_700_001_000),
            Err(StripeError::StaleTimestamp)
        ));
    }

    #[test]
    fn any_matching_v1_entry_is_accepted() {
        let payload = "{}";
        let header = format!("{},v1=deadbeef", signed(payload, 1_700_000_000));
        assert!(verify_signature(SECRET, payload, &header, 1_700_000_000).is_ok());
        assert!(matches!(
            verify_signature(SECRET, payload, "v1=deadbeef", 1_700_000_000),
            Err(StripeError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn checkout_session_uses_price_and_quantity() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/checkout/sessions"))
            .and(body_string_contains("line_items%5B0%5D%5Bprice%5D=price_credits_100"))
            .and(body_string_contains("line_items%5B0%5D%5Bquantity%5D=3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "cs_test_123",
                "url": "https://checkout.stripe.com/c/pay/cs_test_123"
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new("sk_test_xxx")
            .unwrap()
            .with_base_url(server.uri());
        let session = client
            .create_checkout_session(&CheckoutRequest {
                user_id: "user-1",
                price_id: "price_credits_100",
                quantity: 3,
                credits: 300,
                success_url: "http://localhost:3000/ok",
                cancel_url: "http://localhost:3000/cancel",
            })
            .await
            .unwrap();

        assert_eq!(session.id, "cs_test_123");
        assert!(session.url.is_some());
    }

    #[tokio::test]
    async fn api_errors_are_parsed() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/checkout/sessions/cs_missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": { "type": "invalid_request_error", "message": "No such checkout.session" }
            })))
            .mount(&server)
            .await;

        let client = StripeClient::new("sk_test_xxx")
            .unwrap()
            .with_base_url(server.uri());
        match client.get_checkout_session("cs_missing").await {
            Err(StripeError::Api { error_type, .. }) => assert_eq!(error_type, "invalid_request_error"),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
