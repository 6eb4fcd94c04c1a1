//! Engine tunables.

use std::time::Duration;

use rankrent_core::Tld;

/// Placeholder substituted with the full domain in registration links.
pub const DOMAIN_PLACEHOLDER: &str = "{domain}";

/// Configuration for the search engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Maximum number of results a search returns.
    pub result_cap: usize,

    /// Cities taken from the universe when none is selected.
    pub city_sample: usize,

    /// Niches taken from the universe when none is selected.
    pub niche_sample: usize,

    /// Niches taken when a single city is selected and no niche is.
    pub single_city_niche_sample: usize,

    /// Pause after every successful metrics call.
    pub metrics_delay: Duration,

    /// Substitute synthetic metrics when the metrics service fails.
    pub fallback_metrics: bool,

    /// Extensions checked for every accepted candidate.
    pub tlds: Vec<Tld>,

    /// Registrar deep link; `{domain}` is replaced with e.g. `austinplumber.com`.
    pub registration_link_template: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            result_cap: 10,
            city_sample: 20,
            niche_sample: 20,
            single_city_niche_sample: 50,
            metrics_delay: Duration::from_millis(1000),
            fallback_metrics: true,
            tlds: Tld::ALL.to_vec(),
            registration_link_template:
                "https://www.namecheap.com/domains/registration/results/?domain={domain}".into(),
        }
    }
}
