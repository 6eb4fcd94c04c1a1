//! Application state.

use std::sync::Arc;

use rankrent_engine::{
    DomainService, HttpDomainService, HttpMetricsService, MetricsService, RemoteError,
    SessionController,
};
use rankrent_store::Store;

use crate::config::ServiceConfig;
use crate::stripe::StripeClient;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// The storage backend.
    pub store: Arc<dyn Store>,

    /// Service configuration.
    pub config: ServiceConfig,

    /// Metered search entry point.
    pub engine: SessionController,

    /// Stripe client for payments (optional).
    pub stripe: Option<Arc<StripeClient>>,
}

impl AppState {
    /// Create the application state with HTTP clients for the upstream
    /// metrics and domain services.
    ///
    /// # Errors
    ///
    /// Returns an error if an upstream HTTP client cannot be built.
    pub fn new(store: Arc<dyn Store>, config: ServiceConfig) -> Result<Self, RemoteError> {
        let metrics = HttpMetricsService::new(
            &config.metrics_service_url,
            config.upstream_api_key.clone(),
            config.upstream_timeout(),
        )?;
        let domains = HttpDomainService::new(
            &config.domain_service_url,
            config.upstream_api_key.clone(),
            config.upstream_timeout(),
        )?;

        tracing::info!(
            metrics_url = %config.metrics_service_url,
            domain_url = %config.domain_service_url,
            "Upstream services configured"
        );

        Ok(Self::with_services(
            store,
            config,
            Arc::new(metrics),
            Arc::new(domains),
        ))
    }

    /// Create the application state around the given upstream services.
    #[must_use]
    pub fn with_services(
        store: Arc<dyn Store>,
        config: ServiceConfig,
        metrics: Arc<dyn MetricsService>,
        domains: Arc<dyn DomainService>,
    ) -> Self {
        let stripe = config.stripe_api_key.as_ref().and_then(|key| {
            match StripeClient::new(key) {
                Ok(client) => {
                    tracing::info!("Stripe integration enabled");
                    Some(Arc::new(client))
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to create Stripe client");
                    None
                }
            }
        });

        if stripe.is_none() {
            tracing::warn!("Stripe not configured - credit purchases will not be available");
        }

        let engine = SessionController::new(store.clone(), metrics, domains, config.engine.clone());

        Self {
            store,
            config,
            engine,
            stripe,
        }
    }

    /// Replace the Stripe client (e.g. one pointed at a mock server).
    #[must_use]
    pub fn with_stripe(mut self, stripe: StripeClient) -> Self {
        self.stripe = Some(Arc::new(stripe));
        self
    }
}
