//! Error types for gotosocial-webui.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Client Errors ===
    #[error("Invalid instance URL: {0}")]
    InvalidInstance(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authorization code not found")]
    MissingCode,

    #[error("No pending authorization for this browser")]
    NoPendingAuthorization,

    #[error("Not authenticated")]
    Unauthenticated,

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    // === Server Errors ===
    #[error("Error registering app: {0}")]
    Registration(String),

    #[error("Failed to authenticate: {0}")]
    TokenExchange(String),

    #[error("Remote instance error: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            // 4xx Client Errors
            Self::InvalidInstance(_)
            | Self::BadRequest(_)
            | Self::Validation(_)
            | Self::MissingCode
            | Self::NoPendingAuthorization => StatusCode::BAD_REQUEST,
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::AuthorizationDenied(_) => StatusCode::FORBIDDEN,

            // 5xx Server Errors
            Self::Registration(_)
            | Self::TokenExchange(_)
            | Self::Remote(_)
            | Self::Config(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidInstance(_) => "INVALID_INSTANCE",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::MissingCode => "MISSING_CODE",
            Self::NoPendingAuthorization => "NO_PENDING_AUTHORIZATION",
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::AuthorizationDenied(_) => "AUTHORIZATION_DENIED",
            Self::Registration(_) => "REGISTRATION_ERROR",
            Self::TokenExchange(_) => "TOKEN_EXCHANGE_ERROR",
            Self::Remote(_) => "REMOTE_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Message shown to the caller.
    ///
    /// Server errors carry remote or internal details that stay in the logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Registration(_) => "Error registering app".to_string(),
            Self::TokenExchange(_) => "Failed to authenticate".to_string(),
            Self::Remote(_) => "Remote instance request failed".to_string(),
            Self::Config(_) | Self::Internal(_) => "Internal server error".to_string(),
            _ => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        // Log server errors
        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
