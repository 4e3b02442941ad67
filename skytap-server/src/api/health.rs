use axum::{routing::get, Json, Router};
use serde::Serialize;

use crate::ApiContextRef;

pub fn router() -> Router<ApiContextRef> {
    Router::new().route("/", get(health_check))
}

#[derive(Serialize)]
struct HealthCheckResponse {
    status: &'static str,
    version: &'static str,
}

/// Liveness only; settings and broker reachability are checked per launch
async fn health_check() -> Json<HealthCheckResponse> {
    Json(HealthCheckResponse {
        status: "OK",
        version: env!("CARGO_PKG_VERSION"),
    })
}
