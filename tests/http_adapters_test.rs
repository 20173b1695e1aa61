//! HTTP adapter integration tests against local fake endpoints

mod common;

use axum::http::StatusCode;
use common::{spawn_endpoint, spawn_realtime_api, spawn_token_service, ANSWER_SDP};
use parley::config::{RealtimeConfig, TokenServiceConfig, DEFAULT_MODEL};
use parley::domain::session::{CredentialProvider, EphemeralCredential, SdpSignaling};
use parley::infrastructure::credentials::SupabaseTokenProvider;
use parley::infrastructure::realtime::RealtimeSdpClient;
use parley::SessionError;

fn token_config(base_url: &str) -> TokenServiceConfig {
    TokenServiceConfig {
        functions_url: format!("{}/functions/v1", base_url),
        function: "token".to_string(),
        anon_key: "anon-key".to_string(),
    }
}

fn realtime_config(base_url: &str) -> RealtimeConfig {
    RealtimeConfig {
        base_url: format!("{}/v1/realtime", base_url),
        model: DEFAULT_MODEL.to_string(),
    }
}

#[tokio::test]
async fn test_token_provider_sends_anon_key() {
    let server = spawn_token_service("abc").await;
    let provider = SupabaseTokenProvider::new(reqwest::Client::new(), &token_config(&server.base_url));

    let credential = provider.fetch().await.unwrap();
    assert_eq!(credential.expose(), "abc");

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.headers["authorization"], "Bearer anon-key");
    assert_eq!(request.headers["apikey"], "anon-key");
    assert_eq!(request.body, "{}");
}

#[tokio::test]
async fn test_token_provider_maps_http_error_to_auth() {
    let server = spawn_endpoint("/functions/v1/token", StatusCode::UNAUTHORIZED, "nope").await;
    let provider = SupabaseTokenProvider::new(reqwest::Client::new(), &token_config(&server.base_url));

    let err = provider.fetch().await.unwrap_err();
    assert!(matches!(err, SessionError::Auth(_)));
}

#[tokio::test]
async fn test_token_provider_maps_bad_shape_to_auth() {
    let server = spawn_endpoint("/functions/v1/token", StatusCode::OK, r#"{"token":"abc"}"#).await;
    let provider = SupabaseTokenProvider::new(reqwest::Client::new(), &token_config(&server.base_url));

    let err = provider.fetch().await.unwrap_err();
    assert!(matches!(err, SessionError::Auth(_)));
}

#[tokio::test]
async fn test_token_provider_unreachable_is_auth() {
    let provider = SupabaseTokenProvider::new(
        reqwest::Client::new(),
        &token_config("http://127.0.0.1:9"),
    );

    let err = provider.fetch().await.unwrap_err();
    assert!(matches!(err, SessionError::Auth(_)));
}

#[tokio::test]
async fn test_sdp_exchange_posts_offer() {
    let server = spawn_realtime_api(StatusCode::CREATED, ANSWER_SDP).await;
    let client = RealtimeSdpClient::new(reqwest::Client::new(), &realtime_config(&server.base_url));

    let answer = client
        .exchange(&EphemeralCredential::new("abc"), "v=0\r\noffer\r\n")
        .await
        .unwrap();
    assert_eq!(answer, ANSWER_SDP);

    let requests = server.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.headers["authorization"], "Bearer abc");
    assert_eq!(request.headers["content-type"], "application/sdp");
    assert_eq!(request.query.get("model").map(String::as_str), Some(DEFAULT_MODEL));
    assert_eq!(request.body, "v=0\r\noffer\r\n");
}

#[tokio::test]
async fn test_sdp_exchange_rejects_non_success() {
    let server = spawn_realtime_api(StatusCode::BAD_REQUEST, "invalid offer").await;
    let client = RealtimeSdpClient::new(reqwest::Client::new(), &realtime_config(&server.base_url));

    let err = client
        .exchange(&EphemeralCredential::new("abc"), "v=0\r\n")
        .await
        .unwrap_err();
    match err {
        SessionError::Transport(message) => assert!(message.contains("400")),
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_sdp_exchange_rejects_empty_answer() {
    let server = spawn_realtime_api(StatusCode::OK, "").await;
    let client = RealtimeSdpClient::new(reqwest::Client::new(), &realtime_config(&server.base_url));

    let err = client
        .exchange(&EphemeralCredential::new("abc"), "v=0\r\n")
        .await
        .unwrap_err();
    assert!(matches!(err, SessionError::Transport(_)));
}
