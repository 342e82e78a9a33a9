use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("Key not found")]
    NotFound,

    #[error("invalid key")]
    InvalidKey,

    #[error("Key expired")]
    KeyExpired,

    #[error("This key used by another hwid!")]
    HwidMismatch,

    #[error("Corrupted record: {0}")]
    CorruptedRecord(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Pool error: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Wire shape for failures: same `ok`/`msg` envelope the success paths use.
#[derive(Serialize)]
struct ErrorBody {
    ok: bool,
    msg: String,
}

impl From<axum::extract::rejection::JsonRejection> for AppError {
    fn from(rejection: axum::extract::rejection::JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound | AppError::InvalidKey => StatusCode::NOT_FOUND,
            AppError::KeyExpired => StatusCode::GONE,
            AppError::HwidMismatch => StatusCode::FORBIDDEN,
            AppError::CorruptedRecord(msg) => {
                tracing::error!("Corrupted record: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Pool(e) => {
                tracing::error!("Pool error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let msg = match &self {
            // Internal failure details stay out of responses.
            AppError::CorruptedRecord(_)
            | AppError::Database(_)
            | AppError::Pool(_)
            | AppError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        };

        (status, Json(ErrorBody { ok: false, msg })).into_response()
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
