//! Rankrent HTTP client implementation.

use reqwest::{Client, RequestBuilder};
use std::time::Duration;

use rankrent_core::{City, Niche, PurchaseStatus, RetryPolicy, SearchCriteria, ValueRange};

use crate::error::ClientError;
use crate::types::{
    ApiErrorResponse, BalanceResponse, CheckoutRequest, CheckoutResponse, PurchaseInfo,
    PurchaseList, PurchaseWait, SearchResponse, UsageEntry, UsageList,
};

/// Rankrent API client, acting as one signed-in user.
#[derive(Debug, Clone)]
pub struct RankrentClient {
    client: Client,
    base_url: String,
    token: String,
    retry: RetryPolicy,
}

impl RankrentClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the rankrent service (e.g., `"http://rankrent:8080"`)
    /// * `token` - The user's bearer token
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Result<Self, ClientError> {
        Self::with_options(base_url, token, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_options(
        base_url: impl Into<String>,
        token: impl Into<String>,
        options: ClientOptions,
    ) -> Result<Self, ClientError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            retry: options.retry,
        })
    }

    /// Run a metered search. One credit is charged per returned result.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn search(&self, criteria: &SearchCriteria) -> Result<SearchResponse, ClientError> {
        self.send(self.client.post(self.url("/v1/search")).json(criteria))
            .await
    }

    /// Get the current credit balance.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn balance(&self) -> Result<i64, ClientError> {
        let response: BalanceResponse = self
            .send(self.client.get(self.url("/v1/credits/balance")))
            .await?;
        Ok(response.credits)
    }

    /// List charged searches, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn usage(&self, limit: usize) -> Result<Vec<UsageEntry>, ClientError> {
        let response: UsageList = self
            .send(
                self.client
                    .get(self.url("/v1/credits/usage"))
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(response.usage)
    }

    /// List cities, largest first, optionally within a population range.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn cities(
        &self,
        population: Option<ValueRange<u64>>,
    ) -> Result<Vec<City>, ClientError> {
        let mut request = self.client.get(self.url("/v1/cities"));
        if let Some(range) = population {
            request = request.query(&[
                ("min_population", range.min),
                ("max_population", range.max),
            ]);
        }
        self.send(request).await
    }

    /// List niches by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn niches(&self) -> Result<Vec<Niche>, ClientError> {
        self.send(self.client.get(self.url("/v1/niches"))).await
    }

    /// Start a credit purchase. Send the user to the returned `session_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn checkout(
        &self,
        price_id: impl Into<String>,
        quantity: u32,
    ) -> Result<CheckoutResponse, ClientError> {
        let request = CheckoutRequest {
            price_id: price_id.into(),
            quantity,
        };
        self.send(self.client.post(self.url("/v1/checkout")).json(&request))
            .await
    }

    /// Get a purchase by checkout session ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn purchase(&self, session_id: &str) -> Result<PurchaseInfo, ClientError> {
        self.send(
            self.client
                .get(self.url(&format!("/v1/purchases/{session_id}"))),
        )
        .await
    }

    /// List purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn purchases(&self, limit: usize) -> Result<Vec<PurchaseInfo>, ClientError> {
        let response: PurchaseList = self
            .send(
                self.client
                    .get(self.url("/v1/purchases"))
                    .query(&[("limit", limit)]),
            )
            .await?;
        Ok(response.purchases)
    }

    /// Poll a purchase after checkout until it settles or the retry policy
    /// runs out.
    ///
    /// Transient failures are retried. A missing purchase or rejected
    /// credentials end the wait immediately.
    ///
    /// # Errors
    ///
    /// Returns the last error if no attempt reached the server successfully.
    pub async fn wait_for_purchase(&self, session_id: &str) -> Result<PurchaseWait, ClientError> {
        let mut attempt = 1;
        loop {
            let result = self.purchase(session_id).await;

            match result {
                Ok(purchase) => match purchase.status {
                    PurchaseStatus::Completed => return Ok(PurchaseWait::Completed(purchase)),
                    PurchaseStatus::Failed => return Ok(PurchaseWait::Failed(purchase)),
                    PurchaseStatus::Pending if !self.retry.should_retry(attempt) => {
                        return Ok(PurchaseWait::StillProcessing(purchase));
                    }
                    PurchaseStatus::Pending => {
                        tracing::debug!(session_id = %session_id, attempt, "Purchase still pending");
                    }
                },
                Err(e) if e.is_not_found() || e.is_unauthorized() => return Err(e),
                Err(e) if !self.retry.should_retry(attempt) => return Err(e),
                Err(e) => {
                    tracing::warn!(
                        session_id = %session_id,
                        attempt,
                        error = %e,
                        "Purchase status check failed, retrying"
                    );
                }
            }

            tokio::time::sleep(self.retry.delay_after(attempt)).await;
            attempt += 1;
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn send<T: serde::de::DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<T, ClientError> {
        let response = request.bearer_auth(&self.token).send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ClientError> {
        let status = response.status();

        if status.is_success() {
            return Ok(response.json().await?);
        }

        let error_body: Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => Err(ClientError::Api {
                code: api_error.error.code,
                message: api_error.error.message,
                status: status.as_u16(),
            }),
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 900, long enough for a search).
    pub timeout_seconds: u64,
    /// Polling schedule for [`RankrentClient::wait_for_purchase`].
    pub retry: RetryPolicy,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 900,
            retry: RetryPolicy::default(),
        }
    }
}
