use axum::{http::StatusCode, Json};
use serde_json::{json, Value};

use crate::store::StoreError;

/// Failures a school operation reports back to the caller. All of them are
/// terminal for the triggering action; nothing here is retried.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Bad input, rejected before any write.
    #[error("{field}: {message}")]
    Validation { field: String, message: String },

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("{0} not found")]
    NotFound(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("export failed: {0}")]
    Export(#[from] csv::Error),
}

impl AppError {
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        AppError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::AccessDenied(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Store(_) | AppError::Export(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AppError> for (StatusCode, Json<Value>) {
    fn from(e: AppError) -> Self {
        let status = e.status_code();
        let body = match &e {
            AppError::Validation { field, message } => {
                json!({ "error": message, "field": field })
            }
            AppError::Store(inner) => {
                tracing::error!("store failure: {inner}");
                json!({ "error": "Something went wrong, please try again" })
            }
            AppError::Export(inner) => {
                tracing::error!("csv export failure: {inner}");
                json!({ "error": "Export failed" })
            }
            other => json!({ "error": other.to_string() }),
        };
        (status, Json(body))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
