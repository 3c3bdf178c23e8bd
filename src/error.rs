// src/error.rs
use axum::{extract::rejection::JsonRejection, response::IntoResponse, Json};
use http::StatusCode;
use serde::Serialize;
use sqlx::error::ErrorKind;
use thiserror::Error;
use uuid::Uuid;

/// Failures while applying or inspecting the embedded migrations.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Migration error: {0}")]
    Migrate(#[from] sqlx::migrate::MigrateError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Schema drift detected for migration versions {0:?}")]
    Drift(Vec<i64>),
}

/// Failures from the poll and coin stores.
///
/// Constraint violations raised by Postgres are classified by kind so that
/// callers can tell a duplicate vote from a dangling reference without
/// matching on SQLSTATE codes.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Poll not found: {0}")]
    PollNotFound(Uuid),

    #[error("Poll {0} is closed for voting")]
    PollClosed(Uuid),

    #[error("Option index {index} is out of range for a poll with {len} options")]
    OptionOutOfRange { index: i32, len: usize },

    #[error("Invalid input: {0}")]
    Invalid(String),

    #[error("Duplicate entry violates {constraint}")]
    Duplicate { constraint: String },

    #[error("Referenced row missing for {constraint}")]
    MissingReference { constraint: String },

    #[error("Check constraint {constraint} failed")]
    CheckFailed { constraint: String },

    #[error("Database error: {0}")]
    Database(sqlx::Error),
}

impl StoreError {
    pub fn invalid(msg: impl Into<String>) -> Self {
        StoreError::Invalid(msg.into())
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }

    /// Name of the violated constraint, if the error came from one.
    pub fn constraint(&self) -> Option<&str> {
        match self {
            StoreError::Duplicate { constraint }
            | StoreError::MissingReference { constraint }
            | StoreError::CheckFailed { constraint } => Some(constraint.as_str()),
            _ => None,
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        let classified = match &err {
            sqlx::Error::Database(db_err) => Some((
                db_err.kind(),
                db_err.constraint().unwrap_or("<unnamed>").to_string(),
            )),
            _ => None,
        };

        match classified {
            Some((ErrorKind::UniqueViolation, constraint)) => StoreError::Duplicate { constraint },
            Some((ErrorKind::ForeignKeyViolation, constraint)) => {
                StoreError::MissingReference { constraint }
            }
            Some((ErrorKind::CheckViolation, constraint)) => StoreError::CheckFailed { constraint },
            _ => StoreError::Database(err),
        }
    }
}

/// Top-level error for the binary and the HTTP surface.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] figment::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Upstream request failed: {0}")]
    Upstream(#[from] reqwest::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Already voted")]
    AlreadyVoted,

    #[error("{}", .0.body_text())]
    BadRequest(#[from] JsonRejection),
}

/// Standardized API error response body
#[derive(Debug, Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::AlreadyVoted => (StatusCode::CONFLICT, "ALREADY_VOTED"),
            AppError::Store(store_err) => match store_err {
                StoreError::PollNotFound(_) | StoreError::MissingReference { .. } => {
                    (StatusCode::NOT_FOUND, "NOT_FOUND")
                }
                StoreError::Duplicate { .. } => (StatusCode::CONFLICT, "CONFLICT"),
                StoreError::PollClosed(_) => (StatusCode::CONFLICT, "POLL_CLOSED"),
                StoreError::OptionOutOfRange { .. }
                | StoreError::Invalid(_)
                | StoreError::CheckFailed { .. } => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
                StoreError::Database(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
            },
            AppError::BadRequest(rejection) => match rejection.status() {
                StatusCode::UNPROCESSABLE_ENTITY => {
                    (StatusCode::UNPROCESSABLE_ENTITY, "UNPROCESSABLE_ENTITY")
                }
                StatusCode::UNSUPPORTED_MEDIA_TYPE => {
                    (StatusCode::UNSUPPORTED_MEDIA_TYPE, "UNSUPPORTED_MEDIA_TYPE")
                }
                StatusCode::PAYLOAD_TOO_LARGE => (StatusCode::PAYLOAD_TOO_LARGE, "PAYLOAD_TOO_LARGE"),
                _ => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            },
            AppError::Upstream(_) => (StatusCode::BAD_GATEWAY, "BAD_GATEWAY"),
            AppError::Config(_) | AppError::Schema(_) | AppError::Database(_) | AppError::Io(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, code) = self.status_and_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "An internal server error occurred.".to_string()
        } else {
            self.to_string()
        };

        let body = ApiErrorResponse {
            error: ApiErrorBody {
                code: code.to_string(),
                message,
            },
        };
        (status, Json(body)).into_response()
    }
}
