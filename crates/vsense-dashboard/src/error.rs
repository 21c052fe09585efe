//! API and session error types.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use thiserror::Error;
use tracing::error;
use vsense_pipeline::PipelineError;
use vsense_stats::StatsError;
use vsense_telemetry::TelemetryError;

/// Session and account errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("An account with this email already exists")]
    DuplicateEmail,

    #[error("{0}")]
    Invalid(String),

    #[error("Missing or invalid session token")]
    MissingToken,

    #[error("Session expired")]
    Expired,

    #[error("Admin access required")]
    AdminRequired,
}

pub type AuthResult<T> = Result<T, AuthError>;

/// Error returned by HTTP handlers.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    Conflict(String),

    /// An external pipeline stage failed.
    #[error("{error}")]
    Upstream { error: String, logs: String },

    #[error("Server error: {0}")]
    Server(String),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::NotFound(message) => (StatusCode::NOT_FOUND, json!({ "message": message })),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, json!({ "error": msg })),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, json!({ "error": msg })),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, json!({ "error": msg })),
            Self::Conflict(msg) => (StatusCode::CONFLICT, json!({ "error": msg })),
            Self::Upstream { error, logs } => (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({ "error": error, "logs": logs }),
            ),
            Self::Server(details) => {
                error!(details = %details, "Request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": "Server error", "details": details }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

impl From<StatsError> for ApiError {
    fn from(e: StatsError) -> Self {
        match e {
            StatsError::NotFound { .. } => Self::NotFound(e.to_string()),
            StatsError::InvalidTicker(_) => Self::BadRequest(e.to_string()),
            other => Self::Server(other.to_string()),
        }
    }
}

impl From<PipelineError> for ApiError {
    fn from(e: PipelineError) -> Self {
        match e {
            PipelineError::Busy(state) => {
                Self::Conflict(format!("A model update is already running ({state})"))
            }
            other => Self::Server(other.to_string()),
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::InvalidCredentials | AuthError::MissingToken | AuthError::Expired => {
                Self::Unauthorized(e.to_string())
            }
            AuthError::DuplicateEmail => Self::Conflict(e.to_string()),
            AuthError::Invalid(msg) => Self::BadRequest(msg),
            AuthError::AdminRequired => Self::Forbidden(e.to_string()),
        }
    }
}

impl From<TelemetryError> for ApiError {
    fn from(e: TelemetryError) -> Self {
        Self::Server(e.to_string())
    }
}
