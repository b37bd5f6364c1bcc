//! Request and response types for the card key client.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use cardkey_core::GenerateRequest;

/// Response from a generate call.
#[derive(Debug, Clone, Deserialize)]
pub struct GenerateResponse {
    /// The new keys in issuance order.
    pub keys: Vec<String>,
}

/// A card as reported by the service.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardInfo {
    /// The card key.
    pub key: String,
    /// `unused` or `used`.
    pub status: String,
    /// When the key was issued.
    pub issued_at: DateTime<Utc>,
    /// When the key expires, if ever.
    pub expires_at: Option<DateTime<Utc>>,
    /// When the key was redeemed.
    pub used_at: Option<DateTime<Utc>>,
    /// The token bound at redemption.
    pub token: Option<String>,
}

/// List cards response.
#[derive(Debug, Clone, Deserialize)]
pub struct ListCardsResponse {
    /// Every card in issuance order.
    pub cards: Vec<CardInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ValidateRequest<'a> {
    pub card_key: &'a str,
}

/// Response from a validate call.
///
/// A refused key is reported here with `valid: false` rather than as an error.
#[derive(Debug, Clone, Deserialize)]
pub struct ValidateResponse {
    /// Whether the key can be redeemed right now.
    pub valid: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Rejection code when invalid.
    #[serde(default)]
    pub reason: Option<cardkey_core::Rejection>,
    /// The card when valid.
    #[serde(default)]
    pub card: Option<CardInfo>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct RedeemRequest<'a> {
    pub card_key: &'a str,
    pub token: &'a str,
}

/// A redemption log entry.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionInfo {
    /// Redemption ID (ULID).
    pub id: String,
    /// The redeemed key.
    pub card_key: String,
    /// The bound token.
    pub token: String,
    /// When the redemption committed.
    pub recorded_at: DateTime<Utc>,
}

/// Response from a successful redeem call.
#[derive(Debug, Clone, Deserialize)]
pub struct RedeemResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The recorded redemption.
    pub record: RedemptionInfo,
}

/// A page of the redemption log.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRedemptionsResponse {
    /// Entries, newest first.
    pub redemptions: Vec<RedemptionInfo>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// Health check response.
#[derive(Debug, Clone, Deserialize)]
pub struct HealthResponse {
    /// Service status.
    pub status: String,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
}

/// Error response body.
#[derive(Debug, Deserialize)]
pub(crate) struct ApiErrorResponse {
    pub detail: String,
    #[serde(default)]
    pub reason: Option<String>,
}
