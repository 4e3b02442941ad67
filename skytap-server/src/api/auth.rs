use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::{error::ApiError, ApiContextRef};

/// Header the LMS presents its shared key in
const X_API_KEY_HEADER: &str = "X-API-Key";

/// Reject requests that do not carry the configured key.
///
/// The learner headers are trusted only behind this check.
pub async fn require_api_key(
    State(context): State<ApiContextRef>,
    req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let provided = req
        .headers()
        .get(X_API_KEY_HEADER)
        .map(|value| value.as_bytes());

    match provided {
        Some(key) if keys_match(key, context.config.api_key.as_bytes()) => {
            debug!(path = %req.uri().path(), "LMS request authenticated");
            Ok(next.run(req).await)
        }
        Some(_) => {
            warn!(
                method = %req.method(),
                path = %req.uri().path(),
                "Rejected LMS request with an unknown API key"
            );
            Err(ApiError::AuthenticationFailed)
        }
        None => {
            warn!(
                method = %req.method(),
                path = %req.uri().path(),
                "Rejected LMS request without an X-API-Key header"
            );
            Err(ApiError::AuthenticationFailed)
        }
    }
}

/// Constant time for keys of equal length
fn keys_match(provided: &[u8], expected: &[u8]) -> bool {
    bool::from(provided.ct_eq(expected))
}
