//! Error types shared by the portal core.
//!
//! Decode and store failures are downgraded to access decisions by the
//! policy evaluator; `ApiError` is the only one that reaches page handlers.

use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("token is empty")]
    Empty,
    #[error("token is malformed: {0}")]
    Malformed(String),
    #[error("token signature is invalid")]
    InvalidSignature,
}

impl From<jsonwebtoken::errors::Error> for DecodeError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::InvalidSignature => DecodeError::InvalidSignature,
            _ => DecodeError::Malformed(e.to_string()),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("credential store is unavailable: {0}")]
    Unavailable(String),
    #[error("session storage failed: {0}")]
    Session(String),
}

#[derive(Debug, Error)]
pub enum LoginError {
    #[error("login token rejected: {0}")]
    Decode(#[from] DecodeError),
    #[error("could not store credentials: {0}")]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("could not read credentials: {0}")]
    Credentials(#[from] StoreError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("service responded with {status}: {message}")]
    Status { status: u16, message: String },
}

impl ApiError {
    /// Remote status code, when the service answered at all.
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            ApiError::Credentials(_) => None,
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Status { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::BAD_GATEWAY)
            }
            ApiError::Transport(_) => StatusCode::BAD_GATEWAY,
            ApiError::Credentials(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({ "error": self.to_string() }))
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{key} is invalid: {reason}")]
    Invalid { key: &'static str, reason: String },
}
