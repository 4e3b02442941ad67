//! Stub Boomi broker for integration tests.
//!
//! Serves a canned response body on every path and records each request it receives.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{
    extract::{OriginalUri, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::IntoResponse,
    Router,
};
use serde_json::{json, Value};

pub const SHARING_PORTAL_URL: &str = "https://skytap.example.com/sharing/portal/url";

/// A request as seen by the stub
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub accept: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
struct StubState {
    status: StatusCode,
    body: String,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

pub struct StubBroker {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl StubBroker {
    /// Start a stub answering every request with `status` and `body`
    pub async fn start(status: StatusCode, body: impl Into<String>) -> Self {
        let requests = Arc::new(Mutex::new(vec![]));
        let state = StubState {
            status,
            body: body.into(),
            requests: Arc::clone(&requests),
        };

        let app = Router::new().fallback(record).with_state(state);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { addr, requests }
    }

    pub async fn success() -> Self {
        let body = json!({
            "ErrorExists": false,
            "ErrorMessage": null,
            "SkytapURL": SHARING_PORTAL_URL,
        });
        Self::start(StatusCode::OK, body.to_string()).await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Block settings pointing at this stub
    pub fn settings(&self) -> Value {
        json!({
            "skytap": {
                "boomi_configuration": {
                    "base_url": self.base_url(),
                    "endpoint": "/ws/simple/createVm",
                    "username": "foo",
                    "token": "b8eaadd78-4ebd-4404-a261-690c8151e556",
                }
            }
        })
    }
}

async fn record(
    State(state): State<StubState>,
    method: Method,
    OriginalUri(uri): OriginalUri,
    headers: HeaderMap,
    body: String,
) -> impl IntoResponse {
    let accept = headers
        .get(header::ACCEPT)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string);

    state.requests.lock().unwrap().push(RecordedRequest {
        method,
        path: uri.path().to_string(),
        accept,
        body: serde_json::from_str(&body).unwrap_or(Value::Null),
    });

    (
        state.status,
        [(header::CONTENT_TYPE, "application/json")],
        state.body,
    )
}
