//! Borrower management endpoints

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;

use crate::{error::AppResult, models::borrower::CreateBorrower, models::lending::Dashboard};

use super::{auth::BorrowerInfo, AuthenticatedBorrower};

/// Create a borrower account
#[utoipa::path(
    post,
    path = "/borrowers",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    request_body = CreateBorrower,
    responses(
        (status = 201, description = "Borrower created", body = BorrowerInfo),
        (status = 403, description = "Librarian privileges required"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_borrower(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
    Json(request): Json<CreateBorrower>,
) -> AppResult<(StatusCode, Json<BorrowerInfo>)> {
    claims.require_librarian()?;

    let borrower = state.services.auth.create_borrower(request).await?;
    Ok((StatusCode::CREATED, Json(borrower.into())))
}

/// Get any borrower's lending dashboard
#[utoipa::path(
    get,
    path = "/borrowers/{id}/lendings",
    tag = "borrowers",
    security(("bearer_auth" = [])),
    params(
        ("id" = i32, Path, description = "Borrower ID")
    ),
    responses(
        (status = 200, description = "Borrower's lendings", body = Dashboard),
        (status = 403, description = "Librarian privileges required"),
        (status = 404, description = "Borrower not found")
    )
)]
pub async fn get_borrower_lendings(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
    Path(borrower_id): Path<i32>,
) -> AppResult<Json<Dashboard>> {
    claims.require_librarian()?;

    let today = Utc::now().date_naive();
    let dashboard = state.services.lending.dashboard(borrower_id, today).await?;
    Ok(Json(dashboard))
}
