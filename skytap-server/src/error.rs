use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use skytap_core::LaunchError;
use skytap_protocol::ErrorResponse;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Authentication failed")]
    AuthenticationFailed,

    #[error("{0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ApiError::InvalidPayload(_) => StatusCode::BAD_REQUEST,
            ApiError::Launch(LaunchError::BrokerUnavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Launch(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match &self {
            ApiError::Launch(e) => e.user_message(),
            _ => self.to_string(),
        };

        (self.status(), Json(ErrorResponse::new(message))).into_response()
    }
}
