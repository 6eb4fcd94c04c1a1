//! Core types and utilities for rankrent.
//!
//! This crate provides the foundational types shared by the store, the engine
//! and the HTTP service:
//!
//! - **Identifiers**: `UserId`, `CityId`, `NicheId`, `PurchaseId`, `UsageId`
//! - **Universe**: `City`, `Niche` and their import forms
//! - **Search**: `SearchCriteria`, `ValueRange`, `KeywordMetrics`, `KeywordResult`
//! - **Domains**: `Tld`, `DomainAvailability`
//! - **Credits**: `CreditBalance`, `Purchase`, `UsageRecord`, `CreditPack`
//! - **Boundary calls**: `Outcome`, `RetryPolicy`
//!
//! # Credits
//!
//! One credit is charged per keyword result returned to the user. Balances are
//! stored as `i64` and never go negative.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod credits;
pub mod criteria;
pub mod error;
pub mod ids;
pub mod keyword;
pub mod outcome;
pub mod retry;
pub mod universe;

pub use credits::{CreditBalance, CreditPack, Purchase, PurchaseStatus, UsageRecord};
pub use criteria::{SearchCriteria, ValueRange};
pub use error::{CoreError, Result};
pub use ids::{CityId, IdError, NicheId, PurchaseId, UsageId, UserId};
pub use keyword::{
    compose_domain_base, compose_keyword, DomainAvailability, KeywordMetrics, KeywordResult,
    MetricsSource, Tld,
};
pub use outcome::Outcome;
pub use retry::RetryPolicy;
pub use universe::{City, NewCity, NewNiche, Niche};
