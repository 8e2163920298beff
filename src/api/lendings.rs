//! Lending endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::lending::{Dashboard, LendBook, LendingRecord},
};

use super::AuthenticatedBorrower;

/// Lending response with the created or updated record
#[derive(Serialize, ToSchema)]
pub struct LendingResponse {
    pub lending: LendingRecord,
    pub message: String,
}

/// Borrow a book immediately or reserve it for a future date
#[utoipa::path(
    post,
    path = "/lendings",
    tag = "lendings",
    security(("bearer_auth" = [])),
    request_body = LendBook,
    responses(
        (status = 201, description = "Lending created", body = LendingResponse),
        (status = 400, description = "Invalid duration or date"),
        (status = 404, description = "Book not found"),
        (status = 409, description = "Book unavailable or capacity exceeded")
    )
)]
pub async fn lend(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
    Json(request): Json<LendBook>,
) -> AppResult<(StatusCode, Json<LendingResponse>)> {
    let today = Utc::now().date_naive();
    let lending = state
        .services
        .lending
        .lend(claims.borrower_id, request, today)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(LendingResponse {
            message: format!("Book borrowed until {}", lending.lend_end_date),
            lending,
        }),
    ))
}

/// Get the authenticated borrower's lending dashboard
#[utoipa::path(
    get,
    path = "/lendings/dashboard",
    tag = "lendings",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Active, reserved and past lendings", body = Dashboard)
    )
)]
pub async fn dashboard(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
) -> AppResult<Json<Dashboard>> {
    let today = Utc::now().date_naive();
    let dashboard = state
        .services
        .lending
        .dashboard(claims.borrower_id, today)
        .await?;
    Ok(Json(dashboard))
}

/// Return a borrowed book
#[utoipa::path(
    post,
    path = "/lendings/{id}/return",
    tag = "lendings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Lending ID")
    ),
    responses(
        (status = 200, description = "Book returned", body = LendingResponse),
        (status = 404, description = "Lending not found"),
        (status = 409, description = "Already returned or cancelled")
    )
)]
pub async fn return_lending(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
    Path(lending_id): Path<i32>,
) -> AppResult<Json<LendingResponse>> {
    let today = Utc::now().date_naive();
    let lending = state
        .services
        .lending
        .return_lending(lending_id, &claims, today)
        .await?;

    Ok(Json(LendingResponse {
        message: "Book returned".to_string(),
        lending,
    }))
}

/// Cancel a reservation before it begins
#[utoipa::path(
    post,
    path = "/lendings/{id}/cancel",
    tag = "lendings",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Lending ID")
    ),
    responses(
        (status = 200, description = "Reservation cancelled", body = LendingResponse),
        (status = 404, description = "Lending not found"),
        (status = 409, description = "Not a reservation")
    )
)]
pub async fn cancel_lending(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
    Path(lending_id): Path<i32>,
) -> AppResult<Json<LendingResponse>> {
    let lending = state.services.lending.cancel(lending_id, &claims).await?;

    Ok(Json(LendingResponse {
        message: "Reservation cancelled".to_string(),
        lending,
    }))
}
