//! Error types for the Shelfmark server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::NaiveDate;
use serde::Serialize;
use thiserror::Error;

use crate::scheduler::Availability;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Authorization failed: {0}")]
    Authorization(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid lending duration: {0} days")]
    InvalidDuration(i64),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// The book has no free copy today and no explicit start date was given.
    /// Carries the computed availability so the caller can resubmit with a
    /// valid start date.
    #[error("Book is not available for immediate lending")]
    BookUnavailable(Availability),

    /// Commit-time re-validation found the requested window over capacity.
    /// Retryable: the caller may re-check availability and resubmit.
    #[error("Lending capacity exceeded: {0}")]
    CapacityExceeded(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    /// Machine-readable failure reason
    pub error: String,
    pub message: String,
    /// Earliest date a copy frees up, when known (book_unavailable only)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_available_date: Option<NaiveDate>,
    /// True when the book can never be available (zero-copy pool)
    #[serde(skip_serializing_if = "std::ops::Not::not", default)]
    pub never_available: bool,
}

impl AppError {
    /// Client-visible reason string, distinct per failure kind
    pub fn reason(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "unauthenticated",
            AppError::Authorization(_) => "forbidden",
            AppError::NotFound(_) => "not_found",
            AppError::Validation(_) => "invalid_request",
            AppError::InvalidDuration(_) => "invalid_duration",
            AppError::InvalidDate(_) => "invalid_date",
            AppError::BookUnavailable(_) => "book_unavailable",
            AppError::CapacityExceeded(_) => "capacity_exceeded",
            AppError::Conflict(_) => "conflict",
            AppError::Database(_) => "database",
            AppError::Internal(_) => "internal",
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let reason = self.reason().to_string();
        let (status, message, availability) = match &self {
            AppError::Authentication(msg) => (StatusCode::UNAUTHORIZED, msg.clone(), None),
            AppError::Authorization(msg) => (StatusCode::FORBIDDEN, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::InvalidDuration(days) => (
                StatusCode::BAD_REQUEST,
                format!("Lending duration must be 5 or 8 days, got {}", days),
                None,
            ),
            AppError::InvalidDate(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::BookUnavailable(availability) => (
                StatusCode::CONFLICT,
                match availability.next_available_date() {
                    Some(date) => format!(
                        "Book is not currently available; next copy frees on {}",
                        date
                    ),
                    None => "Book is not currently available".to_string(),
                },
                Some(*availability),
            ),
            AppError::CapacityExceeded(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, msg.clone(), None),
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    None,
                )
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    None,
                )
            }
        };

        let body = Json(ErrorResponse {
            error: reason,
            message,
            next_available_date: availability.and_then(|a| a.next_available_date()),
            never_available: matches!(availability, Some(Availability::Never)),
        });

        (status, body).into_response()
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;
