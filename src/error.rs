//! Application error taxonomy.
//!
//! Read-path "not found" outcomes are deliberately **not** errors: malformed
//! ids, unknown shards, and absent or expired entries all collapse into the
//! same observable result so responses never leak which of them occurred.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Errors surfaced by the write path, id generation, storage, and startup.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// The destination is not a well-formed absolute URL.
    #[error("invalid destination url: {0}")]
    InvalidUrl(String),

    /// An insert requested an expiration that has already passed.
    #[error("expiration {0} is already in the past")]
    AlreadyExpired(i64),

    /// Startup configuration is unusable (duplicate shard numbers, bad base
    /// URL, node id out of range). Fatal; the service must not start.
    #[error("configuration error: {0}")]
    Config(String),

    /// A backend operation failed. The current request is terminated and the
    /// failure reported upward, never retried.
    #[error("storage error: {0}")]
    Storage(String),

    /// The system clock moved behind the id generator's last recorded
    /// timestamp. Generation fails rather than risk a duplicate id.
    #[error("clock moved backwards by {0}ms")]
    ClockRegression(u64),

    /// Invariant violation inside the process (e.g. a poisoned lock).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wraps any backend failure as [`AppError::Storage`].
    pub fn storage(err: impl std::fmt::Display) -> Self {
        Self::Storage(err.to_string())
    }

    /// True for the synchronously-rejected write-path validation failures.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidUrl(_) | Self::AlreadyExpired(_))
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        Self::Storage(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = if self.is_validation() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        // Generic bodies only; details stay in the logs.
        let body = match status {
            StatusCode::BAD_REQUEST => "bad request",
            _ => "temporarily error",
        };

        (status, body).into_response()
    }
}
