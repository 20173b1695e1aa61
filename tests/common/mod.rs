//! Fake HTTP endpoints for the credential service and the realtime API

#![allow(dead_code)]

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::post;
use axum::Router;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

pub const ANSWER_SDP: &str = "v=0\r\no=- 0 0 IN IP4 127.0.0.1\r\ns=-\r\nt=0 0\r\n";

/// A request as seen by a fake endpoint
#[derive(Debug, Clone)]
pub struct Recorded {
    pub headers: HeaderMap,
    pub query: HashMap<String, String>,
    pub body: String,
}

#[derive(Clone)]
struct FakeState {
    status: StatusCode,
    response: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

pub struct FakeEndpoint {
    pub base_url: String,
    requests: Arc<Mutex<Vec<Recorded>>>,
}

impl FakeEndpoint {
    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }
}

async fn record(
    State(state): State<FakeState>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> (StatusCode, String) {
    state.requests.lock().unwrap().push(Recorded {
        headers,
        query,
        body,
    });
    (state.status, state.response.clone())
}

/// Serve `response` with `status` at `path` on an ephemeral port
pub async fn spawn_endpoint(path: &str, status: StatusCode, response: &str) -> FakeEndpoint {
    let requests = Arc::new(Mutex::new(Vec::new()));
    let state = FakeState {
        status,
        response: response.to_string(),
        requests: requests.clone(),
    };
    let app = Router::new().route(path, post(record)).with_state(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr: SocketAddr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    FakeEndpoint {
        base_url: format!("http://{}", addr),
        requests,
    }
}

pub async fn spawn_token_service(secret: &str) -> FakeEndpoint {
    let body = serde_json::json!({
        "client_secret": { "value": secret, "expires_at": 1_735_689_600 }
    });
    spawn_endpoint("/functions/v1/token", StatusCode::OK, &body.to_string()).await
}

pub async fn spawn_realtime_api(status: StatusCode, answer: &str) -> FakeEndpoint {
    spawn_endpoint("/v1/realtime", status, answer).await
}
