//! Core types and utilities for the card key service.
//!
//! This crate provides the foundational types shared by the store, the HTTP
//! service and the client SDK:
//!
//! - **Identifiers**: `CardKey`, `RedemptionId`
//! - **Records**: `CardKeyRecord`, `CardState`, `CardStatus`, `RedemptionRecord`
//! - **Outcomes**: `Rejection`, the caller-facing reason a key cannot be used
//! - **Generation**: `KeyGenerator`, `GenerateRequest`, `BatchSpec`
//!
//! # Card Key Format
//!
//! Keys look like `VIP-7QK2M9XA4T0BZC1D`: an administrator-chosen prefix, a dash,
//! and a 16 character suffix drawn from `A-Z0-9`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod generator;
pub mod ids;
pub mod record;
pub mod rejection;
pub mod request;

pub use error::{CardKeyError, Result};
pub use generator::{KeyGenerator, DEFAULT_PREFIX, SUFFIX_ALPHABET, SUFFIX_LEN};
pub use ids::{CardKey, IdError, RedemptionId};
pub use record::{CardKeyRecord, CardState, CardStatus, RedemptionRecord};
pub use rejection::Rejection;
pub use request::{BatchSpec, GenerateRequest, DEFAULT_VALID_DAYS, MAX_VALID_DAYS};
