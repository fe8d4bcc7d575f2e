use axum::{Json, http::StatusCode, response::IntoResponse};
use thiserror::Error;
use tracing::{error, warn};

use mpj_db::DbError;
use mpj_types::api::ErrorResponse;

/// The outcomes a journal operation can report to a caller. Storage detail
/// never leaves the server; it is logged and replaced by `TransientStorage`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    Validation(String),
    #[error("storage unavailable")]
    TransientStorage,
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::NotFound => StatusCode::NOT_FOUND,
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::TransientStorage => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            ServiceError::NotFound => "NOT_FOUND",
            ServiceError::Validation(_) => "VALIDATION_ERROR",
            ServiceError::TransientStorage => "STORAGE_UNAVAILABLE",
        }
    }
}

impl From<DbError> for ServiceError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound => ServiceError::NotFound,
            DbError::Validation(msg) => ServiceError::Validation(msg),
            DbError::Sqlite(e) => {
                error!("SQLite error: {}", e);
                ServiceError::TransientStorage
            }
            DbError::LockPoisoned(msg) => {
                error!("Database lock poisoned: {}", msg);
                ServiceError::TransientStorage
            }
            DbError::DeadlineExceeded => {
                warn!("Write abandoned after its deadline; rolled back");
                ServiceError::TransientStorage
            }
        }
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> axum::response::Response {
        let message = match &self {
            ServiceError::Validation(msg) => Some(msg.clone()),
            _ => None,
        };
        let body = ErrorResponse {
            error: self.error_code().to_string(),
            message,
        };
        (self.status_code(), Json(body)).into_response()
    }
}
