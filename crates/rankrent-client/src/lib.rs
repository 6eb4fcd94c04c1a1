//! Rankrent Client SDK.
//!
//! This crate provides a client library for frontends and scripts that talk
//! to the rankrent API on behalf of a signed-in user.
//!
//! # Example
//!
//! ```no_run
//! use rankrent_client::{PurchaseWait, RankrentClient};
//! use rankrent_core::{SearchCriteria, ValueRange};
//!
//! # async fn example() -> Result<(), rankrent_client::ClientError> {
//! let client = RankrentClient::new("http://rankrent:8080", "user-jwt")?;
//!
//! if client.balance().await? == 0 {
//!     let checkout = client.checkout("price_credits_500", 1).await?;
//!     println!("Pay at {}", checkout.session_url);
//!
//!     if let PurchaseWait::Completed(purchase) =
//!         client.wait_for_purchase(&checkout.session_id).await?
//!     {
//!         println!("Granted {} credits", purchase.credits_purchased);
//!     }
//! }
//!
//! let criteria = SearchCriteria {
//!     niche_id: None,
//!     city_id: None,
//!     search_volume: ValueRange { min: 500, max: 5000 },
//!     cpc: ValueRange { min: 5.0, max: 50.0 },
//!     population: Some(ValueRange { min: 100_000, max: 1_000_000 }),
//!     location_first: false,
//! };
//! let response = client.search(&criteria).await?;
//! println!(
//!     "{} results, {} credits left",
//!     response.results.len(),
//!     response.balance
//! );
//! # Ok(())
//! # }
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

mod client;
mod error;
mod types;

pub use client::{ClientOptions, RankrentClient};
pub use error::ClientError;
pub use types::*;
