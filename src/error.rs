use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failures reported by a user or session store.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A record violated the field-level schema (required / length).
    #[error("{0}")]
    Validation(String),

    /// A uniqueness constraint was violated.
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),

    /// The connection pool could not hand out a client.
    #[error("Pool error: {0}")]
    Pool(#[from] deadpool_postgres::PoolError),

    /// A PostgreSQL error.
    #[error("Database error: {0}")]
    Postgres(#[from] tokio_postgres::Error),

    /// A row was missing an expected column.
    #[error("Missing data: {0}")]
    MissingData(String),
}

/// The application's error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Missing or invalid request fields, or a weak password.
    #[error("{0}")]
    UserInput(String),

    /// A uniqueness conflict, such as a reused email.
    #[error("{0}")]
    Conflict(String),

    /// An unknown email or session.
    #[error("{0}")]
    NotFound(String),

    /// A password that does not match.
    #[error("{0}")]
    Authentication(String),

    /// Login called without both credentials. Answered as a server error.
    #[error("{0}")]
    MissingCredentials(String),

    /// An unclassified store failure.
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// An internal server error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

/// A `Result` type that uses `AppError` as the error type.
pub type Result<T> = std::result::Result<T, AppError>;

impl AppError {
    /// Whether the error is delivered as a regular response carrying an
    /// `errorMessage` rather than as a transport-level failure.
    pub fn is_user_facing(&self) -> bool {
        matches!(
            self,
            AppError::UserInput(_)
                | AppError::Conflict(_)
                | AppError::NotFound(_)
                | AppError::Authentication(_)
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match self {
            AppError::UserInput(ref msg) => {
                tracing::debug!("Rejected input: {}", msg);
                StatusCode::OK
            }

            AppError::Conflict(ref msg) => {
                tracing::info!("Conflict: {}", msg);
                StatusCode::OK
            }

            AppError::NotFound(ref msg) => {
                tracing::debug!("Not found: {}", msg);
                StatusCode::OK
            }

            AppError::Authentication(ref msg) => {
                tracing::warn!("Authentication failed: {}", msg);
                StatusCode::OK
            }

            AppError::MissingCredentials(ref msg) => {
                tracing::warn!("Missing credentials: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }

            AppError::Store(ref e) => {
                tracing::error!("Store error: {}", e);
                StatusCode::INTERNAL_SERVER_ERROR
            }

            AppError::Internal(ref msg) => {
                tracing::error!("Internal error: {}", msg);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        let body = sonic_rs::to_string(&sonic_rs::json!({
            "errorMessage": self.to_string()
        }))
        .unwrap_or_else(|_| r#"{"errorMessage":"Internal server error"}"#.to_string());

        (
            status,
            [(axum::http::header::CONTENT_TYPE, "application/json")],
            body,
        )
            .into_response()
    }
}
