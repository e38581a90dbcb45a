//! Handler errors and their HTTP form.
//!
//! Validation and conflict outcomes are answered with HTTP 200 and the plain
//! message, as the sign-up form expects. Internal failures are logged in full
//! and reported with a generic line.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::error::{ChatError, RegistrationError};

#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Registration(#[from] RegistrationError),
    #[error(transparent)]
    Upstream(#[from] ChatError),
    #[error("internal error: {0}")]
    Internal(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        match self {
            ServerError::Registration(
                e @ (RegistrationError::Validation(_) | RegistrationError::Conflict(_)),
            ) => (StatusCode::OK, e.to_string()).into_response(),
            ServerError::Registration(e) => {
                log::error!("registration failed: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Error: registration failed.").into_response()
            }
            ServerError::Upstream(ChatError::Status(code)) => {
                log::warn!("completion upstream answered HTTP {}", code);
                let status = StatusCode::from_u16(code).unwrap_or(StatusCode::BAD_GATEWAY);
                (status, format!("completion service returned HTTP {}", code)).into_response()
            }
            ServerError::Upstream(e) => {
                log::warn!("completion upstream failed: {}", e);
                (StatusCode::BAD_GATEWAY, "completion service unavailable").into_response()
            }
            ServerError::Internal(m) => {
                log::error!("internal server error: {}", m);
                (StatusCode::INTERNAL_SERVER_ERROR, "internal server error").into_response()
            }
        }
    }
}
