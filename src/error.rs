use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use thiserror::Error as ThisError;
use tracing::error;

use crate::vault::VaultError;

#[derive(Debug, ThisError)]
pub enum PlazaError {
    /// Login rejected. The detail is diagnostic only; clients always see a
    /// generic "invalid credentials" message.
    #[error("invalid credentials: {debug}")]
    InvalidCredentials { debug: String },

    /// Missing, unknown, or expired session token.
    #[error("unauthorized: {debug}")]
    Unauthorized { debug: String },

    #[error("not found: {debug}")]
    NotFound { message: String, debug: String },

    #[error("{0}")]
    Validation(String),

    /// Store credentials missing or corrupt. Logged with the store id;
    /// the client only sees a generic message.
    #[error("store {store_id} credential error: {debug}")]
    StoreCredentials { store_id: i64, debug: String },

    #[error("upstream connection error: {0}")]
    UpstreamConnect(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParse(#[from] url::ParseError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("password hashing error: {0}")]
    Bcrypt(#[from] bcrypt::BcryptError),

    #[error("vault error: {0}")]
    Vault(#[from] VaultError),
}

impl From<crate::api::RelayError> for PlazaError {
    fn from(e: crate::api::RelayError) -> Self {
        match e {
            crate::api::RelayError::Url(e) => PlazaError::UrlParse(e),
            crate::api::RelayError::Transport(e) => PlazaError::UpstreamConnect(e),
        }
    }
}

/// Wire shape consumed by the dashboard client: a generic `error` message
/// plus an optional `debug` diagnostic. Clients must not branch on `debug`.
#[derive(Serialize)]
pub struct ApiError {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub debug: Option<String>,
}

impl IntoResponse for PlazaError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            PlazaError::InvalidCredentials { debug } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: "Invalid credentials".to_string(),
                    debug: Some(debug),
                },
            ),
            PlazaError::Unauthorized { debug } => (
                StatusCode::UNAUTHORIZED,
                ApiError {
                    error: "Unauthorized. Invalid or expired token.".to_string(),
                    debug: Some(debug),
                },
            ),
            PlazaError::NotFound { message, debug } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: message,
                    debug: Some(debug),
                },
            ),
            PlazaError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: msg,
                    debug: None,
                },
            ),
            PlazaError::StoreCredentials { store_id, debug: detail } => {
                error!(store_id, debug = %detail, "failed to resolve store credentials");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Failed to resolve store credentials".to_string(),
                        debug: Some(detail),
                    },
                )
            }
            PlazaError::UpstreamConnect(e) => {
                error!(error = %e, "upstream request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Upstream connection error".to_string(),
                        debug: Some(e.to_string()),
                    },
                )
            }
            PlazaError::UrlParse(e) => {
                error!(error = %e, "invalid upstream URL");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Internal server error".to_string(),
                        debug: None,
                    },
                )
            }
            PlazaError::Json(e) => {
                error!(error = %e, "JSON serialization failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Internal server error".to_string(),
                        debug: None,
                    },
                )
            }
            PlazaError::Database(e) => {
                error!(error = %e, "database error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Internal server error".to_string(),
                        debug: None,
                    },
                )
            }
            PlazaError::Bcrypt(e) => {
                error!(error = %e, "password hashing error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Internal server error".to_string(),
                        debug: None,
                    },
                )
            }
            PlazaError::Vault(e) => {
                error!(error = %e, "credential vault error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiError {
                        error: "Internal server error".to_string(),
                        debug: None,
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
