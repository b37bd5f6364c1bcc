//! Card key HTTP client implementation.

use std::time::Duration;

use reqwest::{Client, Response};
use serde::de::DeserializeOwned;

use cardkey_core::{GenerateRequest, Rejection};

use crate::error::{ClientError, Result};
use crate::types::{
    ApiErrorResponse, GenerateResponse, HealthResponse, ListCardsResponse,
    ListRedemptionsResponse, RedeemRequest, RedeemResponse, ValidateRequest, ValidateResponse,
};

/// Card key API client.
///
/// Cheap to clone; clones share the underlying connection pool.
#[derive(Debug, Clone)]
pub struct CardKeyClient {
    client: Client,
    base_url: String,
}

impl CardKeyClient {
    /// Create a new client.
    ///
    /// # Arguments
    ///
    /// * `base_url` - Base URL of the card key service (e.g., `"http://cardkey:8080"`)
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the URL is empty or the HTTP
    /// client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        Self::with_options(base_url, ClientOptions::default())
    }

    /// Create a new client with custom options.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Configuration` if the URL is empty or the HTTP
    /// client cannot be built.
    pub fn with_options(base_url: impl Into<String>, options: ClientOptions) -> Result<Self> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(ClientError::Configuration("base URL is empty".into()));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(options.timeout_seconds))
            .build()
            .map_err(|e| ClientError::Configuration(format!("HTTP client: {e}")))?;

        Ok(Self { client, base_url })
    }

    /// Generate a batch of card keys.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn generate(&self, request: &GenerateRequest) -> Result<Vec<String>> {
        let url = format!("{}/api/cards", self.base_url);

        let response = self.client.post(&url).json(request).send().await?;
        let body: GenerateResponse = Self::handle_response(response).await?;

        tracing::debug!(count = body.keys.len(), "Card keys generated");
        Ok(body.keys)
    }

    /// Check a key without consuming it.
    ///
    /// A refused key is `Ok` with `valid: false`; see [`ValidateResponse::reason`].
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn validate(&self, card_key: &str) -> Result<ValidateResponse> {
        let url = format!("{}/api/validate", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&ValidateRequest { card_key })
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Redeem a key by binding `token` to it.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Rejected` if the key is unknown, used, expired or
    /// the input is empty. Other failures surface as `Http` or `Api`.
    pub async fn redeem(&self, card_key: &str, token: &str) -> Result<RedeemResponse> {
        let url = format!("{}/api/tokens", self.base_url);

        let response = self
            .client
            .post(&url)
            .json(&RedeemRequest { card_key, token })
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// List every issued card in issuance order.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_cards(&self) -> Result<ListCardsResponse> {
        let url = format!("{}/api/cards", self.base_url);

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// List the redemption log, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn list_redemptions(
        &self,
        limit: usize,
        offset: usize,
    ) -> Result<ListRedemptionsResponse> {
        let url = format!("{}/api/tokens", self.base_url);

        let response = self
            .client
            .get(&url)
            .query(&[("limit", limit), ("offset", offset)])
            .send()
            .await?;

        Self::handle_response(response).await
    }

    /// Check service health.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server returns an error.
    pub async fn health(&self) -> Result<HealthResponse> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;
        Self::handle_response(response).await
    }

    /// Handle API response and convert errors.
    async fn handle_response<T: DeserializeOwned>(response: Response) -> Result<T> {
        let status = response.status();

        if status.is_success() {
            let bytes = response.bytes().await?;
            return Ok(serde_json::from_slice(&bytes)?);
        }

        let error_body: std::result::Result<ApiErrorResponse, _> = response.json().await;

        match error_body {
            Ok(api_error) => {
                let code = api_error.reason.unwrap_or_else(|| "unknown".to_string());

                match Rejection::from_code(&code) {
                    Some(reason) => Err(ClientError::Rejected {
                        reason,
                        message: api_error.detail,
                    }),
                    None => Err(ClientError::Api {
                        code,
                        message: api_error.detail,
                        status: status.as_u16(),
                    }),
                }
            }
            Err(_) => Err(ClientError::Api {
                code: "unknown".to_string(),
                message: format!("HTTP {status}"),
                status: status.as_u16(),
            }),
        }
    }
}

/// Client options for customization.
#[derive(Debug, Clone)]
pub struct ClientOptions {
    /// Request timeout in seconds (default: 30).
    pub timeout_seconds: u64,
}

impl Default for ClientOptions {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_trims_trailing_slash() {
        let client = CardKeyClient::new("http://localhost:8080/").unwrap();
        assert_eq!(client.base_url, "http://localhost:8080");
    }

    #[test]
    fn empty_base_url_is_a_configuration_error() {
        let err = CardKeyClient::new("/").unwrap_err();
        assert!(matches!(err, ClientError::Configuration(_)));
    }

    #[test]
    fn client_options() {
        let options = ClientOptions { timeout_seconds: 5 };
        assert!(CardKeyClient::with_options("http://localhost:8080", options).is_ok());
    }
}
