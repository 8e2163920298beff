//! Book catalog endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::{NaiveDate, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::book::{Book, BookSummary, CreateBook},
    scheduler::Availability,
};

use super::AuthenticatedBorrower;

/// Availability of a book as of today
#[derive(Serialize, ToSchema)]
pub struct AvailabilityResponse {
    pub book: BookSummary,
    pub is_available: bool,
    /// Earliest date a copy frees up; absent when available now or never
    pub next_available_date: Option<NaiveDate>,
    /// Explicit marker for a zero-copy pool, distinct from "available now"
    pub never_available: bool,
}

impl AvailabilityResponse {
    fn new(book: BookSummary, availability: Availability) -> Self {
        Self {
            book,
            is_available: availability.is_available(),
            next_available_date: availability.next_available_date(),
            never_available: availability == Availability::Never,
        }
    }
}

/// List all books with derived availability counts
#[utoipa::path(
    get,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Book catalog", body = Vec<BookSummary>)
    )
)]
pub async fn list_books(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(_claims): AuthenticatedBorrower,
) -> AppResult<Json<Vec<BookSummary>>> {
    let today = Utc::now().date_naive();
    let books = state.services.catalog.list_books(today).await?;
    Ok(Json(books))
}

/// Get a single book
#[utoipa::path(
    get,
    path = "/books/{id}",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Book details", body = BookSummary),
        (status = 404, description = "Book not found")
    )
)]
pub async fn get_book(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(_claims): AuthenticatedBorrower,
    Path(book_id): Path<i32>,
) -> AppResult<Json<BookSummary>> {
    let today = Utc::now().date_naive();
    let book = state.services.catalog.get_book(book_id, today).await?;
    Ok(Json(book))
}

/// Add a book to the catalog
#[utoipa::path(
    post,
    path = "/books",
    tag = "books",
    security(("bearer_auth" = [])),
    request_body = CreateBook,
    responses(
        (status = 201, description = "Book created", body = Book),
        (status = 400, description = "Invalid request"),
        (status = 403, description = "Librarian privileges required")
    )
)]
pub async fn create_book(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
    Json(request): Json<CreateBook>,
) -> AppResult<(StatusCode, Json<Book>)> {
    claims.require_librarian()?;

    let book = state.services.catalog.create_book(request).await?;
    Ok((StatusCode::CREATED, Json(book)))
}

/// Check whether a copy is free now, and if not when one frees up
#[utoipa::path(
    get,
    path = "/books/{id}/availability",
    tag = "books",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Book ID")
    ),
    responses(
        (status = 200, description = "Availability details", body = AvailabilityResponse),
        (status = 404, description = "Book not found")
    )
)]
pub async fn check_availability(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(_claims): AuthenticatedBorrower,
    Path(book_id): Path<i32>,
) -> AppResult<Json<AvailabilityResponse>> {
    let today = Utc::now().date_naive();
    let (book, availability) = state.services.catalog.availability(book_id, today).await?;
    Ok(Json(AvailabilityResponse::new(book, availability)))
}
