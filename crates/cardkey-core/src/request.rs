//! Batch generation requests and their normalization.
//!
//! Administrative input is accepted permissively and normalized in one place:
//!
//! - `prefix`: trimmed; blank or missing falls back to the default prefix.
//! - `count`: numbers and numeric strings are accepted; anything non-numeric or
//!   below 1 becomes 1. Missing means 1.
//! - `validDays`: numbers and numeric strings are accepted; anything
//!   non-numeric or below 1 becomes 0 (no expiry). Missing or `null` means
//!   [`DEFAULT_VALID_DAYS`].

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::generator::DEFAULT_PREFIX;

/// Validity window applied when the request does not name one.
pub const DEFAULT_VALID_DAYS: u32 = 30;

/// Longest validity window a request can ask for (about 2700 years).
pub const MAX_VALID_DAYS: u32 = 1_000_000;

/// A batch generation request as submitted by an administrator.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    /// Key prefix.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Number of keys to generate.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub count: Option<Value>,

    /// Days until the keys expire; 0 means never.
    #[serde(default, alias = "valid_days", skip_serializing_if = "Option::is_none")]
    pub valid_days: Option<Value>,
}

impl GenerateRequest {
    /// Build a well-typed request.
    #[must_use]
    pub fn new(prefix: impl Into<String>, count: i64, valid_days: i64) -> Self {
        Self {
            prefix: Some(prefix.into()),
            count: Some(Value::from(count)),
            valid_days: Some(Value::from(valid_days)),
        }
    }

    /// Normalize using [`DEFAULT_PREFIX`] as the fallback prefix.
    #[must_use]
    pub fn normalize(&self) -> BatchSpec {
        self.normalize_with_default(DEFAULT_PREFIX)
    }

    /// Normalize using `default_prefix` as the fallback prefix.
    #[must_use]
    pub fn normalize_with_default(&self, default_prefix: &str) -> BatchSpec {
        let prefix = self
            .prefix
            .as_deref()
            .map(str::trim)
            .filter(|p| !p.is_empty())
            .unwrap_or(default_prefix)
            .to_string();

        let count = match self.count.as_ref().and_then(coerce_int) {
            Some(n) if n >= 1 => usize::try_from(n).unwrap_or(usize::MAX),
            _ => 1,
        };

        let valid_days = match &self.valid_days {
            None | Some(Value::Null) => DEFAULT_VALID_DAYS,
            Some(value) => match coerce_int(value) {
                Some(n) if n >= 1 => u32::try_from(n)
                    .unwrap_or(MAX_VALID_DAYS)
                    .min(MAX_VALID_DAYS),
                _ => 0,
            },
        };

        BatchSpec {
            prefix,
            count,
            valid_days,
        }
    }
}

/// A normalized batch: what the generator actually produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSpec {
    /// Key prefix, non-empty.
    pub prefix: String,

    /// Number of keys, at least 1.
    pub count: usize,

    /// Days until expiry; 0 means never.
    pub valid_days: u32,
}

impl BatchSpec {
    /// Expiry time for keys issued at `issued_at`.
    ///
    /// Windows reaching past the representable date range end at
    /// `DateTime::<Utc>::MAX_UTC`.
    #[must_use]
    pub fn expires_at(&self, issued_at: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if self.valid_days == 0 {
            return None;
        }
        let expires_at = issued_at
            .checked_add_signed(Duration::days(i64::from(self.valid_days)))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);
        Some(expires_at)
    }
}

/// Interpret a JSON value as an integer, accepting numeric strings.
#[allow(clippy::cast_possible_truncation)]
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64)),
        Value::String(s) => {
            let s = s.trim();
            s.parse::<i64>().ok().or_else(|| {
                s.parse::<f64>()
                    .ok()
                    .filter(|f| f.is_finite())
                    .map(|f| f as i64)
            })
        }
        _ => None,
    }
}
