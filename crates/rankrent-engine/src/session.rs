//! Search session controller.
//!
//! Gates the orchestrator behind the caller's credit balance and charges one
//! credit per returned result.

use std::sync::Arc;

use serde::Serialize;

use rankrent_core::{KeywordResult, SearchCriteria, UserId};
use rankrent_store::Store;

use crate::config::EngineConfig;
use crate::error::Result;
use crate::ledger::CreditLedger;
use crate::notify::{Notice, Notifier};
use crate::remote::{DomainService, MetricsService};
use crate::search::SearchOrchestrator;

/// The authenticated caller of a search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Session {
    /// Who is searching and paying.
    pub user_id: UserId,
}

impl Session {
    /// A session for `user_id`.
    #[must_use]
    pub const fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

/// Result of a metered search.
#[derive(Debug, Clone, Serialize)]
pub struct SearchOutcome {
    /// Results the caller paid for.
    pub results: Vec<KeywordResult>,
    /// Credits debited for this search.
    pub credits_charged: i64,
    /// Balance after the search.
    pub balance: i64,
}

impl SearchOutcome {
    fn empty(balance: i64) -> Self {
        Self {
            results: Vec::new(),
            credits_charged: 0,
            balance,
        }
    }
}

/// Runs searches on behalf of a user.
#[derive(Clone)]
pub struct SessionController {
    ledger: CreditLedger,
    orchestrator: SearchOrchestrator,
}

impl SessionController {
    /// Wire a controller from its collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn Store>,
        metrics_service: Arc<dyn MetricsService>,
        domain_service: Arc<dyn DomainService>,
        config: EngineConfig,
    ) -> Self {
        Self {
            ledger: CreditLedger::new(store.clone()),
            orchestrator: SearchOrchestrator::new(store, metrics_service, domain_service, config),
        }
    }

    /// The credit ledger.
    #[must_use]
    pub fn ledger(&self) -> &CreditLedger {
        &self.ledger
    }

    /// The search orchestrator.
    #[must_use]
    pub fn orchestrator(&self) -> &SearchOrchestrator {
        &self.orchestrator
    }

    /// Run a metered search for `session`.
    ///
    /// Searches always produce an outcome; problems are reported through
    /// `notifier` and an empty result set. Nothing is charged unless results
    /// are returned, and results are discarded if the debit fails.
    ///
    /// # Errors
    ///
    /// Returns `EngineError::InvalidCriteria` if the criteria are malformed.
    pub async fn search(
        &self,
        session: &Session,
        criteria: &SearchCriteria,
        notifier: &dyn Notifier,
    ) -> Result<SearchOutcome> {
        criteria.validate()?;
        let user_id = &session.user_id;

        let balance = self.ledger.get_balance(user_id).await;
        if balance <= 0 {
            notifier.notify(Notice::warning(
                "You have no credits left. Purchase credits to run a search.",
            ));
            return Ok(SearchOutcome::empty(0));
        }

        let report = match self.orchestrator.search(criteria).await {
            Ok(report) => report,
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Search failed");
                notifier.notify(Notice::error(format!("Search failed: {e}")));
                return Ok(SearchOutcome::empty(balance));
            }
        };

        if report.results.is_empty() {
            notifier.notify(Notice::info(
                "No keywords matched your filters. No credits were used.",
            ));
            return Ok(SearchOutcome::empty(balance));
        }

        let count = report.results.len();
        let cost = i64::try_from(count).unwrap_or(i64::MAX);

        match self.ledger.debit(user_id, cost).await {
            Ok(Some(new_balance)) => {
                self.ledger
                    .record_usage(user_id, &report.label, u32::try_from(count).unwrap_or(u32::MAX))
                    .await;
                notifier.notify(Notice::info(format!(
                    "Found {count} keywords. {cost} credits used, {new_balance} remaining."
                )));

                Ok(SearchOutcome {
                    results: report.results,
                    credits_charged: cost,
                    balance: new_balance,
                })
            }
            Ok(None) => {
                let balance = self.ledger.get_balance(user_id).await;
                notifier.notify(Notice::warning(format!(
                    "Not enough credits: this search found {count} keywords but you have {balance} credits."
                )));
                Ok(SearchOutcome::empty(balance))
            }
            Err(e) => {
                tracing::error!(user_id = %user_id, error = %e, "Failed to debit credits");
                notifier.notify(Notice::error("Could not charge credits for this search."));
                Ok(SearchOutcome::empty(balance))
            }
        }
    }
}
