//! Niche discovery engine.
//!
//! The engine pairs cities with niches, scores each candidate keyword against
//! remote metrics, checks exact-match domain availability and meters the work
//! against a per-user credit ledger.
//!
//! # Components
//!
//! - [`MetricsFetcher`] - keyword metrics with fallback data and call pacing
//! - [`DomainAggregator`] - per-TLD availability and registration links
//! - [`CreditLedger`] - balances, conditional debit and usage audit trail
//! - [`SearchOrchestrator`] - the city x niche traversal with a result cap
//! - [`SessionController`] - gates a search behind the ledger for one user
//!
//! Remote lookups go through the [`MetricsService`] and [`DomainService`]
//! traits; [`HttpMetricsService`] and [`HttpDomainService`] are the reqwest
//! implementations used in production.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod config;
pub mod domains;
pub mod error;
pub mod ledger;
pub mod metrics;
pub mod notify;
pub mod remote;
pub mod search;
pub mod session;

pub use config::EngineConfig;
pub use domains::{DomainAggregator, DomainCheck};
pub use error::{EngineError, Result};
pub use ledger::CreditLedger;
pub use metrics::MetricsFetcher;
pub use notify::{Notice, NoticeBuffer, NoticeLevel, Notifier, TracingNotifier};
pub use remote::{DomainService, HttpDomainService, HttpMetricsService, MetricsService, RemoteError};
pub use search::{SearchOrchestrator, SearchReport};
pub use session::{SearchOutcome, Session, SessionController};
