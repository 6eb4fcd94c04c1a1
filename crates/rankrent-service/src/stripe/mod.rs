//! Stripe integration for credit purchases.
//!
//! Stripe handles:
//! - Credit purchases via Checkout
//! - Webhook notifications when a checkout is paid, fails or expires

pub mod client;
pub mod types;

pub use client::{verify_webhook_signature, CheckoutRequest, StripeClient, StripeError};
pub use types::*;
