//! Exact-match domain availability across extensions.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;

use rankrent_core::{DomainAvailability, Tld};

use crate::config::DOMAIN_PLACEHOLDER;
use crate::remote::DomainService;

/// Per-extension availability for one domain base.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainCheck {
    /// Availability flag per extension.
    pub availability: BTreeMap<Tld, bool>,
    /// Registration deep link per extension; `None` unless available.
    pub registration_links: BTreeMap<Tld, Option<String>>,
}

/// Checks a domain base against every configured extension.
#[derive(Clone)]
pub struct DomainAggregator {
    service: Arc<dyn DomainService>,
    tlds: Vec<Tld>,
    link_template: String,
}

impl DomainAggregator {
    /// Create an aggregator.
    ///
    /// `link_template` must contain `{domain}`.
    #[must_use]
    pub fn new(service: Arc<dyn DomainService>, tlds: Vec<Tld>, link_template: String) -> Self {
        Self {
            service,
            tlds,
            link_template,
        }
    }

    /// Look up `<base>.<tld>` for each extension.
    ///
    /// The lookups run concurrently. A failed lookup is reported as
    /// unavailable and never affects the other extensions.
    pub async fn check(&self, base: &str) -> DomainCheck {
        let lookups = self.tlds.iter().map(|tld| async move {
            let domain = tld.domain(base);
            let status = match self.service.check_domain(&domain).await {
                Ok(status) => status,
                Err(e) => {
                    tracing::warn!(domain = %domain, error = %e, "Domain lookup failed");
                    DomainAvailability::unavailable(e.to_string())
                }
            };
            (*tld, domain, status)
        });

        let mut check = DomainCheck::default();
        for (tld, domain, status) in join_all(lookups).await {
            let link = status.available.then(|| self.registration_link(&domain));

            check.availability.insert(tld, status.available);
            check.registration_links.insert(tld, link);
        }
        check
    }

    fn registration_link(&self, domain: &str) -> String {
        self.link_template.replace(DOMAIN_PLACEHOLDER, domain)
    }
}
