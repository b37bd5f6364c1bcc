//! Token submission (redemption) and redemption log handlers.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use cardkey_core::RedemptionRecord;
use cardkey_store::Redemption;

use crate::error::ApiError;
use crate::state::AppState;

/// A redemption log entry.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RedemptionView {
    /// Redemption ID.
    pub id: String,
    /// The redeemed key.
    pub card_key: String,
    /// The bound token.
    pub token: String,
    /// Commit timestamp.
    pub recorded_at: String,
}

impl From<&RedemptionRecord> for RedemptionView {
    fn from(record: &RedemptionRecord) -> Self {
        Self {
            id: record.id.to_string(),
            card_key: record.card_key.to_string(),
            token: record.token.clone(),
            recorded_at: record.recorded_at.to_rfc3339(),
        }
    }
}

// ============================================================================
// Redeem
// ============================================================================

/// Token submission request.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    /// The key to redeem. Missing is treated as empty.
    #[serde(default, alias = "card_key")]
    pub card_key: String,
    /// The token to bind. Missing is treated as empty.
    #[serde(default)]
    pub token: String,
}

/// Token submission response.
#[derive(Debug, Serialize)]
pub struct RedeemResponse {
    /// Human-readable outcome.
    pub message: String,
    /// The redemption that was recorded.
    pub record: RedemptionView,
}

/// Redeem a key by binding a token to it.
pub async fn redeem_card(
    State(state): State<Arc<AppState>>,
    Json(body): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, ApiError> {
    let lifecycle = state.lifecycle.clone();
    let outcome =
        tokio::task::spawn_blocking(move || lifecycle.redeem(&body.card_key, &body.token))
            .await??;

    match outcome {
        Redemption::Redeemed(record) => Ok(Json(RedeemResponse {
            message: "token recorded".to_string(),
            record: RedemptionView::from(&record),
        })),
        Redemption::Rejected(rejection) => Err(rejection.into()),
    }
}

// ============================================================================
// Redemption log
// ============================================================================

/// Redemption log query parameters.
#[derive(Debug, Deserialize)]
pub struct ListRedemptionsQuery {
    /// Maximum number of entries to return (default: 50, max: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,
    /// Offset for pagination (default: 0).
    #[serde(default)]
    pub offset: usize,
}

fn default_limit() -> usize {
    50
}

/// Redemption log response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ListRedemptionsResponse {
    /// Entries, newest first.
    pub redemptions: Vec<RedemptionView>,
    /// Whether there are more entries.
    pub has_more: bool,
}

/// List the redemption log.
pub async fn list_redemptions(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListRedemptionsQuery>,
) -> Result<Json<ListRedemptionsResponse>, ApiError> {
    // Fetch one more than requested to determine has_more
    let limit = query.limit.min(100);
    let offset = query.offset;
    let lifecycle = state.lifecycle.clone();
    let records =
        tokio::task::spawn_blocking(move || lifecycle.list_redemptions(limit + 1, offset))
            .await??;

    let has_more = records.len() > limit;
    let redemptions = records
        .iter()
        .take(limit)
        .map(RedemptionView::from)
        .collect();

    Ok(Json(ListRedemptionsResponse {
        redemptions,
        has_more,
    }))
}
