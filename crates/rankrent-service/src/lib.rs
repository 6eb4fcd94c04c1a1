//! Rankrent HTTP API service.
//!
//! This crate exposes the niche discovery engine over HTTP:
//!
//! - Metered keyword searches
//! - City and niche listings, plus admin replacement of both universes
//! - Credit balance and usage history
//! - Credit purchases via Stripe Checkout and the Stripe webhook
//!
//! # Authentication
//!
//! 1. **Bearer JWT** (HS256, shared with the auth provider) - for end users
//! 2. **Admin API key** (`X-Admin-Key`) - for universe management

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router even when they do not await

pub mod auth;
pub mod config;
pub mod crypto;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;
pub mod stripe;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
pub use stripe::{StripeClient, StripeError};
