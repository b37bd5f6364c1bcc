//! Client SDK tests against a mock card key service.

use serde_json::json;
use wiremock::matchers::{body_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use cardkey_client::{CardKeyClient, ClientError, GenerateRequest};
use cardkey_core::Rejection;

async fn setup() -> (MockServer, CardKeyClient) {
    let server = MockServer::start().await;
    let client = CardKeyClient::new(server.uri()).unwrap();
    (server, client)
}

#[tokio::test]
async fn generate_posts_request_and_returns_keys() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cards"))
        .and(body_json(json!({ "prefix": "VIP", "count": 2, "validDays": 30 })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "keys": ["VIP-AAAAAAAAAAAAAAAA", "VIP-BBBBBBBBBBBBBBBB"]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let keys = client
        .generate(&GenerateRequest::new("VIP", 2, 30))
        .await
        .unwrap();

    assert_eq!(keys, vec!["VIP-AAAAAAAAAAAAAAAA", "VIP-BBBBBBBBBBBBBBBB"]);
}

#[tokio::test]
async fn validate_reports_refusal_as_data() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/validate"))
        .and(body_json(json!({ "cardKey": "VIP-DOESNOTEXIST" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": false,
            "message": "card key not found",
            "reason": "NOT_FOUND"
        })))
        .mount(&server)
        .await;

    let result = client.validate("VIP-DOESNOTEXIST").await.unwrap();

    assert!(!result.valid);
    assert_eq!(result.reason, Some(Rejection::NotFound));
    assert!(result.card.is_none());
}

#[tokio::test]
async fn validate_valid_key_carries_card() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/validate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "valid": true,
            "message": "card key is valid",
            "card": {
                "key": "VIP-AAAAAAAAAAAAAAAA",
                "status": "unused",
                "issuedAt": "2026-01-01T00:00:00+00:00",
                "expiresAt": null,
                "usedAt": null,
                "token": null
            }
        })))
        .mount(&server)
        .await;

    let result = client.validate("VIP-AAAAAAAAAAAAAAAA").await.unwrap();

    assert!(result.valid);
    let card = result.card.unwrap();
    assert_eq!(card.status, "unused");
    assert!(card.expires_at.is_none());
}

#[tokio::test]
async fn redeem_success() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .and(body_json(json!({ "cardKey": "VIP-AAAAAAAAAAAAAAAA", "token": "abc123" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "token recorded",
            "record": {
                "id": "01J00000000000000000000000",
                "cardKey": "VIP-AAAAAAAAAAAAAAAA",
                "token": "abc123",
                "recordedAt": "2026-01-02T03:04:05+00:00"
            }
        })))
        .mount(&server)
        .await;

    let result = client.redeem("VIP-AAAAAAAAAAAAAAAA", "abc123").await.unwrap();

    assert_eq!(result.record.token, "abc123");
    assert_eq!(result.record.card_key, "VIP-AAAAAAAAAAAAAAAA");
}

#[tokio::test]
async fn redeem_rejection_maps_to_typed_reason() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/tokens"))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "detail": "card key has already been used",
            "reason": "ALREADY_USED"
        })))
        .mount(&server)
        .await;

    let err = client
        .redeem("VIP-AAAAAAAAAAAAAAAA", "t2")
        .await
        .unwrap_err();

    assert_eq!(err.rejection(), Some(Rejection::AlreadyUsed));
    match err {
        ClientError::Rejected { message, .. } => {
            assert_eq!(message, "card key has already been used");
        }
        other => panic!("expected Rejected, got {other:?}"),
    }
}

#[tokio::test]
async fn non_rejection_errors_become_api_errors() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/api/cards"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "Card key generation failed; no keys were issued, please retry",
            "reason": "GENERATION_FAILURE"
        })))
        .mount(&server)
        .await;

    let err = client
        .generate(&GenerateRequest::new("VIP", 1, 30))
        .await
        .unwrap_err();

    match err {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "GENERATION_FAILURE");
            assert_eq!(status, 500);
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn unparseable_error_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/health"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let err = client.health().await.unwrap_err();

    match err {
        ClientError::Api { code, status, .. } => {
            assert_eq!(code, "unknown");
            assert_eq!(status, 502);
        }
        other => panic!("expected Api, got {other:?}"),
    }
}

#[tokio::test]
async fn list_redemptions_sends_paging() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/tokens"))
        .and(query_param("limit", "10"))
        .and(query_param("offset", "20"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "redemptions": [],
            "hasMore": false
        })))
        .expect(1)
        .mount(&server)
        .await;

    let page = client.list_redemptions(10, 20).await.unwrap();

    assert!(page.redemptions.is_empty());
    assert!(!page.has_more);
}

#[tokio::test]
async fn list_cards_decodes_used_card() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/api/cards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "cards": [{
                "key": "VIP-AAAAAAAAAAAAAAAA",
                "status": "used",
                "issuedAt": "2026-01-01T00:00:00+00:00",
                "expiresAt": "2026-01-31T00:00:00+00:00",
                "usedAt": "2026-01-02T00:00:00+00:00",
                "token": "t1"
            }]
        })))
        .mount(&server)
        .await;

    let cards = client.list_cards().await.unwrap().cards;

    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].status, "used");
    assert_eq!(cards[0].token.as_deref(), Some("t1"));
    assert!(cards[0].used_at.is_some());
}
