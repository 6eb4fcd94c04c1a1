//! Remote keyword-metrics and domain-availability services.
//!
//! The engine only depends on the [`MetricsService`] and [`DomainService`]
//! traits. The HTTP implementations speak a small JSON contract:
//!
//! - `POST {base}/keyword-metrics` with `{"keyword": ...}` returns
//!   `{"searchVolume", "cpc", "errorMessage"?}`
//! - `POST {base}/domain-availability` with `{"domain": ...}` returns
//!   `{"available", "premiumDomain"?, "purchasePrice"?, "renewalPrice"?, "errorMessage"?}`

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use rankrent_core::{DomainAvailability, KeywordMetrics};

/// Error type for remote service calls.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// HTTP request failed (connect, timeout, or body decode).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The service answered with a non-success status.
    #[error("{service} returned {status}: {message}")]
    Status {
        /// Which service answered.
        service: &'static str,
        /// HTTP status code.
        status: u16,
        /// Response body, if any.
        message: String,
    },

    /// The service answered without a usable payload.
    #[error("{0} returned no data")]
    EmptyPayload(&'static str),

    /// The service returned values outside the contract.
    #[error("{service} returned invalid data: {reason}")]
    InvalidPayload {
        /// Which service answered.
        service: &'static str,
        /// What was wrong.
        reason: String,
    },
}

/// Keyword metrics lookup.
#[async_trait]
pub trait MetricsService: Send + Sync {
    /// Fetch search volume and cost-per-click for one keyword.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when no payload is returned.
    async fn keyword_metrics(&self, keyword: &str) -> Result<KeywordMetrics, RemoteError>;
}

/// Domain availability lookup.
#[async_trait]
pub trait DomainService: Send + Sync {
    /// Check whether a fully qualified domain can be registered.
    ///
    /// # Errors
    ///
    /// Returns an error on transport failure or when no payload is returned.
    async fn check_domain(&self, domain: &str) -> Result<DomainAvailability, RemoteError>;
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct MetricsRequest<'a> {
    keyword: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MetricsPayload {
    search_volume: u64,
    cpc: f64,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Serialize)]
struct DomainRequest<'a> {
    domain: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DomainPayload {
    available: bool,
    #[serde(default)]
    premium_domain: Option<bool>,
    #[serde(default)]
    purchase_price: Option<String>,
    #[serde(default)]
    renewal_price: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
}

// ============================================================================
// HTTP implementations
// ============================================================================

/// Shared plumbing for the two HTTP services.
#[derive(Debug, Clone)]
struct JsonEndpoint {
    client: Client,
    url: String,
    api_key: Option<String>,
    service: &'static str,
}

impl JsonEndpoint {
    fn new(
        base_url: &str,
        path: &str,
        api_key: Option<String>,
        timeout: Duration,
        service: &'static str,
    ) -> Result<Self, RemoteError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            url: format!("{}/{path}", base_url.trim_end_matches('/')),
            api_key,
            service,
        })
    }

    async fn post<Req, Resp>(&self, body: &Req) -> Result<Resp, RemoteError>
    where
        Req: Serialize + Sync,
        Resp: serde::de::DeserializeOwned,
    {
        let mut request = self.client.post(&self.url).json(body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(RemoteError::Status {
                service: self.service,
                status: status.as_u16(),
                message,
            });
        }

        let payload: Option<Resp> = response.json().await?;
        payload.ok_or(RemoteError::EmptyPayload(self.service))
    }
}

/// Metrics service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpMetricsService {
    endpoint: JsonEndpoint,
}

impl HttpMetricsService {
    /// Create a client for the metrics service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(base_url, "keyword-metrics", api_key, timeout, "metrics service")?,
        })
    }
}

#[async_trait]
impl MetricsService for HttpMetricsService {
    async fn keyword_metrics(&self, keyword: &str) -> Result<KeywordMetrics, RemoteError> {
        let payload: MetricsPayload = self.endpoint.post(&MetricsRequest { keyword }).await?;

        if !payload.cpc.is_finite() || payload.cpc < 0.0 {
            return Err(RemoteError::InvalidPayload {
                service: self.endpoint.service,
                reason: format!("cpc {}", payload.cpc),
            });
        }

        Ok(KeywordMetrics {
            search_volume: payload.search_volume,
            cpc: payload.cpc,
            error_message: payload.error_message,
        })
    }
}

/// Domain availability service reached over HTTP.
#[derive(Debug, Clone)]
pub struct HttpDomainService {
    endpoint: JsonEndpoint,
}

impl HttpDomainService {
    /// Create a client for the domain service at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(
        base_url: &str,
        api_key: Option<String>,
        timeout: Duration,
    ) -> Result<Self, RemoteError> {
        Ok(Self {
            endpoint: JsonEndpoint::new(
                base_url,
                "domain-availability",
                api_key,
                timeout,
                "domain service",
            )?,
        })
    }
}

#[async_trait]
impl DomainService for HttpDomainService {
    async fn check_domain(&self, domain: &str) -> Result<DomainAvailability, RemoteError> {
        let payload: DomainPayload = self.endpoint.post(&DomainRequest { domain }).await?;

        Ok(DomainAvailability {
            available: payload.available,
            premium: payload.premium_domain,
            purchase_price: payload.purchase_price,
            renewal_price: payload.renewal_price,
            error_message: payload.error_message,
        })
    }
}
