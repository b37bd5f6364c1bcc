//! Card key generation, listing and validation handlers.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};

use cardkey_core::{CardKeyRecord, GenerateRequest};
use cardkey_store::Validation;

use crate::error::ApiError;
use crate::state::AppState;

/// A card key as shown to administrators and callers.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardView {
    /// The card key.
    pub key: String,
    /// `unused` or `used`.
    pub status: &'static str,
    /// Issue timestamp.
    pub issued_at: String,
    /// Expiry timestamp, if any.
    pub expires_at: Option<String>,
    /// Redemption timestamp, if redeemed.
    pub used_at: Option<String>,
    /// Bound token, if redeemed.
    pub token: Option<String>,
}

impl From<&CardKeyRecord> for CardView {
    fn from(record: &CardKeyRecord) -> Self {
        Self {
            key: record.key().to_string(),
            status: record.status().as_str(),
            issued_at: record.issued_at().to_rfc3339(),
            expires_at: record.expires_at().map(|t| t.to_rfc3339()),
            used_at: record.used_at().map(|t| t.to_rfc3339()),
            token: record.bound_token().map(str::to_string),
        }
    }
}

// ============================================================================
// Generate
// ============================================================================

/// Generate response.
#[derive(Debug, Serialize)]
pub struct GenerateResponse {
    /// The new keys in issuance order.
    pub keys: Vec<String>,
}

/// Issue a batch of card keys.
pub async fn generate_cards(
    State(state): State<Arc<AppState>>,
    Json(body): Json<GenerateRequest>,
) -> Result<Json<GenerateResponse>, ApiError> {
    let spec = body.normalize_with_default(&state.config.default_prefix);

    if spec.count > state.config.max_batch_size {
        return Err(ApiError::BadRequest(format!(
            "count {} exceeds the maximum batch size of {}",
            spec.count, state.config.max_batch_size
        )));
    }

    tracing::info!(
        prefix = %spec.prefix,
        count = spec.count,
        valid_days = spec.valid_days,
        "Generating card keys"
    );

    let lifecycle = state.lifecycle.clone();
    let keys = tokio::task::spawn_blocking(move || lifecycle.generate(&spec)).await??;

    Ok(Json(GenerateResponse {
        keys: keys.into_iter().map(String::from).collect(),
    }))
}

// ============================================================================
// List
// ============================================================================

/// List cards response.
#[derive(Debug, Serialize)]
pub struct ListCardsResponse {
    /// Every card in issuance order.
    pub cards: Vec<CardView>,
}

/// List every issued card.
pub async fn list_cards(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ListCardsResponse>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let records = tokio::task::spawn_blocking(move || lifecycle.list_all()).await??;

    Ok(Json(ListCardsResponse {
        cards: records.iter().map(CardView::from).collect(),
    }))
}

// ============================================================================
// Validate
// ============================================================================

/// Validate request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidateRequest {
    /// The key to check. Missing is treated as empty.
    #[serde(default, alias = "card_key")]
    pub card_key: String,
}

/// Validate response.
#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    /// Whether the key can be redeemed right now.
    pub valid: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Rejection code when invalid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<&'static str>,
    /// The card when valid.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub card: Option<CardView>,
}

/// Check a key without consuming it.
///
/// Always answers 200 for a decided outcome; `valid` carries the result.
pub async fn validate_card(
    State(state): State<Arc<AppState>>,
    Json(body): Json<ValidateRequest>,
) -> Result<Json<ValidateResponse>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let validation =
        tokio::task::spawn_blocking(move || lifecycle.validate(&body.card_key)).await??;

    let response = match validation {
        Validation::Valid(record) => ValidateResponse {
            valid: true,
            message: "card key is valid".to_string(),
            reason: None,
            card: Some(CardView::from(&record)),
        },
        Validation::Invalid(rejection) => ValidateResponse {
            valid: false,
            message: rejection.to_string(),
            reason: Some(rejection.code()),
            card: None,
        },
    };

    Ok(Json(response))
}
