use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::errors::StoreError;

/// Error returned by HTTP handlers. Rendered as a plain-text body.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let code = self.status();
        let msg = match self {
            AppError::BadRequest(s) | AppError::Internal(s) => s,
        };
        (code, msg).into_response()
    }
}

// Every ingestion failure is a 400. Only state the server cannot serve from
// becomes a 500.
impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Malformed { .. }
            | StoreError::PersistFailure { .. }
            | StoreError::Encode { .. } => AppError::BadRequest(err.to_string()),
            StoreError::Corrupt { .. }
            | StoreError::Unreadable { .. }
            | StoreError::LockPoisoned { .. }
            | StoreError::Config { .. } => AppError::Internal(err.to_string()),
        }
    }
}
