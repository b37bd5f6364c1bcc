//! Card key HTTP API service.
//!
//! This crate maps the card key lifecycle onto HTTP:
//!
//! - Batch generation and the administrative card listing
//! - Advisory validation of a key
//! - Redemption (binding a token to a key) and the redemption log
//!
//! All decisions are made by [`cardkey_store::CardKeyLifecycle`]; handlers only
//! translate requests and outcomes.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
// Allow some pedantic lints that are noisy for Axum handler functions
#![allow(clippy::missing_errors_doc)] // Axum handlers all return Result
#![allow(clippy::unused_async)] // Handlers are async for the router

pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use config::ServiceConfig;
pub use error::ApiError;
pub use routes::create_router;
pub use state::AppState;
