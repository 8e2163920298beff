//! Book catalog model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Book row from the catalog store
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    /// Capacity of the copy pool; immutable once set by catalog management
    pub total_copies: i32,
    pub created_at: DateTime<Utc>,
}

/// Book with its free-copy count as of a reference date.
///
/// `available_copies` is derived from the lending records on every read
/// (total capacity minus the lendings whose interval contains the reference
/// date); it is never stored, so it cannot drift.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct BookSummary {
    pub id: i32,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub total_copies: i32,
    pub available_copies: i32,
}

/// Create book request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBook {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1, max = 100))]
    pub author: String,
    #[validate(length(min = 1, max = 50))]
    pub genre: String,
    #[validate(range(min = 1))]
    pub total_copies: i32,
}
