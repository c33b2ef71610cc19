//! Typed errors and HTTP mapping.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Problems with the catalog declarations or process settings. Raised before serving.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("collection '{collection}' in store '{store_id}' declares no properties")]
    NoProperties { store_id: String, collection: String },
    #[error("duplicate entity name: {0}")]
    DuplicateEntity(String),
    #[error("duplicate store id: {0}")]
    DuplicateStore(String),
    #[error("catalog load: {0}")]
    Load(String),
    #[error("invalid setting {name}: {message}")]
    InvalidSetting { name: &'static str, message: String },
}

/// Failures reported by a store implementation.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("rejected: {0}")]
    Rejected(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("invalid key format: {0}")]
    InvalidKeyFormat(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("validation: {0}")]
    Validation(String),
    #[error("no store available")]
    NoStoreAvailable,
    #[error("{message}")]
    Execution {
        message: String,
        details: Option<serde_json::Value>,
    },
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl AppError {
    pub fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "config_error"),
            AppError::Store(StoreError::Rejected(_)) => (StatusCode::CONFLICT, "conflict"),
            AppError::Store(StoreError::Unavailable(_)) => (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable"),
            AppError::Store(StoreError::Db(_)) => (StatusCode::INTERNAL_SERVER_ERROR, "database_error"),
            AppError::InvalidKeyFormat(_) => (StatusCode::BAD_REQUEST, "invalid_key_format"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "not_found"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "validation_error"),
            AppError::NoStoreAvailable => (StatusCode::BAD_REQUEST, "no_store_available"),
            AppError::Execution { .. } => (StatusCode::INTERNAL_SERVER_ERROR, "execution_failure"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let (message, details) = match self {
            AppError::Store(StoreError::Db(e)) => {
                tracing::error!(error = %e, "database error");
                ("database error".to_string(), None)
            }
            AppError::Execution { message, details } => (message, details),
            other => (other.to_string(), None),
        };
        let body = ErrorBody {
            error: ErrorDetail {
                code: code.to_string(),
                message,
                details,
            },
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn taxonomy_maps_to_statuses() {
        assert_eq!(AppError::InvalidKeyFormat("x".into()).status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NotFound("x".into()).status_and_code().0, StatusCode::NOT_FOUND);
        assert_eq!(AppError::Validation("x".into()).status_and_code().0, StatusCode::BAD_REQUEST);
        assert_eq!(AppError::NoStoreAvailable.status_and_code().0, StatusCode::BAD_REQUEST);
        let exec = AppError::Execution { message: "boom".into(), details: None };
        assert_eq!(exec.status_and_code(), (StatusCode::INTERNAL_SERVER_ERROR, "execution_failure"));
    }

    #[test]
    fn database_errors_hide_driver_message() {
        let resp = AppError::Store(StoreError::Db(sqlx::Error::PoolTimedOut)).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
