//! Service configuration.

use std::path::Path;
use std::time::Duration;

use serde::Deserialize;

use rankrent_core::CreditPack;
use rankrent_engine::EngineConfig;

/// Service configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Address to listen on (default: "0.0.0.0:8080").
    pub listen_addr: String,

    /// PostgreSQL connection URL. When unset the embedded store is used.
    pub database_url: Option<String>,

    /// Path to `RocksDB` data directory (default: "/data/rankrent").
    pub data_dir: String,

    /// HS256 secret shared with the auth provider.
    pub auth_jwt_secret: Option<String>,

    /// Expected JWT audience (default: "rankrent").
    pub auth_audience: String,

    /// Admin API key for universe management.
    pub admin_api_key: Option<String>,

    /// Stripe API key (optional).
    pub stripe_api_key: Option<String>,

    /// Stripe webhook secret (optional).
    pub stripe_webhook_secret: Option<String>,

    /// Frontend URL for checkout redirects.
    pub frontend_url: String,

    /// CORS allowed origins.
    pub cors_origins: Vec<String>,

    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,

    /// Request timeout in seconds.
    pub request_timeout_seconds: u64,

    /// Timeout for search requests in seconds. Searches pace their metrics
    /// calls, so they run far longer than other requests.
    pub search_timeout_seconds: u64,

    /// Base URL of the keyword metrics service.
    pub metrics_service_url: String,

    /// Base URL of the domain availability service.
    pub domain_service_url: String,

    /// Bearer token sent to both upstream services.
    pub upstream_api_key: Option<String>,

    /// Per-call timeout for upstream services in seconds.
    pub upstream_timeout_seconds: u64,

    /// Search engine tunables.
    pub engine: EngineConfig,

    /// Credit packs offered at checkout.
    pub credit_packs: Vec<CreditPack>,
}

/// Stripe secrets file structure.
#[derive(Debug, Deserialize)]
struct StripeSecrets {
    api_key: String,
    #[serde(default)]
    webhook_secret: Option<String>,
}

impl ServiceConfig {
    /// Load configuration from environment variables and secrets files.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        // Try to load Stripe secrets from file first, then fall back to env vars
        let (stripe_api_key, stripe_webhook_secret) = load_stripe_secrets();

        let engine = EngineConfig {
            result_cap: env_parse("RESULT_CAP").unwrap_or(defaults.engine.result_cap),
            metrics_delay: env_parse("METRICS_DELAY_MS")
                .map_or(defaults.engine.metrics_delay, Duration::from_millis),
            fallback_metrics: env_parse("METRICS_FALLBACK")
                .unwrap_or(defaults.engine.fallback_metrics),
            ..defaults.engine
        };

        Self {
            listen_addr: std::env::var("LISTEN_ADDR").unwrap_or(defaults.listen_addr),
            database_url: std::env::var("DATABASE_URL").ok(),
            data_dir: std::env::var("DATA_DIR").unwrap_or(defaults.data_dir),
            auth_jwt_secret: std::env::var("AUTH_JWT_SECRET").ok(),
            auth_audience: std::env::var("AUTH_AUDIENCE").unwrap_or(defaults.auth_audience),
            admin_api_key: std::env::var("ADMIN_API_KEY").ok(),
            stripe_api_key,
            stripe_webhook_secret,
            frontend_url: std::env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url),
            cors_origins: std::env::var("CORS_ORIGINS")
                .map(|s| s.split(',').map(|o| o.trim().to_string()).collect())
                .unwrap_or(defaults.cors_origins),
            max_body_bytes: env_parse("MAX_BODY_BYTES").unwrap_or(defaults.max_body_bytes),
            request_timeout_seconds: env_parse("REQUEST_TIMEOUT_SECONDS")
                .unwrap_or(defaults.request_timeout_seconds),
            search_timeout_seconds: env_parse("SEARCH_TIMEOUT_SECONDS")
                .unwrap_or(defaults.search_timeout_seconds),
            metrics_service_url: std::env::var("METRICS_SERVICE_URL")
                .unwrap_or(defaults.metrics_service_url),
            domain_service_url: std::env::var("DOMAIN_SERVICE_URL")
                .unwrap_or(defaults.domain_service_url),
            upstream_api_key: std::env::var("UPSTREAM_API_KEY").ok(),
            upstream_timeout_seconds: env_parse("UPSTREAM_TIMEOUT_SECONDS")
                .unwrap_or(defaults.upstream_timeout_seconds),
            engine,
            credit_packs: load_credit_packs().unwrap_or(defaults.credit_packs),
        }
    }

    /// Per-call timeout for upstream services.
    #[must_use]
    pub fn upstream_timeout(&self) -> Duration {
        Duration::from_secs(self.upstream_timeout_seconds)
    }
}

/// Parse an environment variable, ignoring missing or malformed values.
fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    let value = std::env::var(key).ok()?;
    match value.parse() {
        Ok(parsed) => Some(parsed),
        Err(_) => {
            tracing::warn!(key = %key, value = %value, "Ignoring malformed configuration value");
            None
        }
    }
}

/// Load credit packs from the `CREDIT_PACKS` JSON array.
fn load_credit_packs() -> Option<Vec<CreditPack>> {
    let raw = std::env::var("CREDIT_PACKS").ok()?;
    match serde_json::from_str(&raw) {
        Ok(packs) => Some(packs),
        Err(e) => {
            tracing::warn!(error = %e, "Ignoring malformed CREDIT_PACKS");
            None
        }
    }
}

/// Load Stripe secrets from file or environment.
fn load_stripe_secrets() -> (Option<String>, Option<String>) {
    let secret_paths = [
        ".secrets/stripe.json",
        "rankrent/.secrets/stripe.json",
        "../.secrets/stripe.json",
    ];

    for path in &secret_paths {
        if let Ok(secrets) = load_secrets_file::<StripeSecrets>(path) {
            tracing::info!(path = %path, "Loaded Stripe secrets from file");
            return (Some(secrets.api_key), secrets.webhook_secret);
        }
    }

    // Fall back to environment variables
    tracing::debug!("Stripe secrets file not found, using environment variables");
    (
        std::env::var("STRIPE_API_KEY").ok(),
        std::env::var("STRIPE_WEBHOOK_SECRET").ok(),
    )
}

/// Load secrets from a JSON file.
fn load_secrets_file<T: serde::de::DeserializeOwned>(path: &str) -> Result<T, std::io::Error> {
    let path = Path::new(path);
    if !path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Secrets file not found",
        ));
    }
    let contents = std::fs::read_to_string(path)?;
    serde_json::from_str(&contents)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8080".into(),
            database_url: None,
            data_dir: "/data/rankrent".into(),
            auth_jwt_secret: None,
            auth_audience: "rankrent".into(),
            admin_api_key: None,
            stripe_api_key: None,
            stripe_webhook_secret: None,
            frontend_url: "http://localhost:3000".into(),
            cors_origins: vec!["*".into()],
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 30,
            search_timeout_seconds: 900,
            metrics_service_url: "http://127.0.0.1:8090".into(),
            domain_service_url: "http://127.0.0.1:8091".into(),
            upstream_api_key: None,
            upstream_timeout_seconds: 20,
            engine: EngineConfig::default(),
            credit_packs: vec![
                CreditPack {
                    price_id: "price_credits_100".into(),
                    credits: 100,
                    amount_cents: 1_000,
                },
                CreditPack {
                    price_id: "price_credits_500".into(),
                    credits: 500,
                    amount_cents: 4_000,
                },
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_engine_reference_values() {
        let config = ServiceConfig::default();
        assert_eq!(config.engine.result_cap, 10);
        assert_eq!(config.engine.metrics_delay, Duration::from_millis(1000));
        assert!(config.search_timeout_seconds > config.request_timeout_seconds);
        assert_eq!(config.upstream_timeout(), Duration::from_secs(20));
    }

    #[test]
    fn credit_packs_parse_from_json() {
        let packs: Vec<CreditPack> = serde_json::from_str(
            r#"[{"price_id":"price_a","credits":50,"amount_cents":700}]"#,
        )
        .unwrap();
        assert_eq!(packs[0].credits, 50);
    }
}
