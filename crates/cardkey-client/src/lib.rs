//! Card key client SDK.
//!
//! This crate provides a client library for the card key service.
//!
//! # Example
//!
//! ```no_run
//! use cardkey_client::{CardKeyClient, ClientError};
//! use cardkey_core::{GenerateRequest, Rejection};
//!
//! # async fn example() -> Result<(), ClientError> {
//! let client = CardKeyClient::new("http://cardkey:8080")?;
//!
//! let keys = client.generate(&GenerateRequest::new("VIP", 3, 30)).await?;
//!
//! match client.redeem(&keys[0], "order-1042").await {
//!     Ok(redeemed) => println!("bound at {}", redeemed.record.recorded_at),
//!     Err(ClientError::Rejected { reason: Rejection::AlreadyUsed, .. }) => {
//!         println!("someone else got there first");
//!     }
//!     Err(e) => return Err(e),
//! }
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

pub use client::{CardKeyClient, ClientOptions};
pub use error::{ClientError, Result};
pub use types::*;
