//! Authentication endpoints

use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    error::AppResult,
    models::borrower::{Borrower, BorrowerRole},
};

use super::AuthenticatedBorrower;

/// Login request
#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response with bearer token
#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub token_type: String,
    pub borrower: BorrowerInfo,
}

/// Borrower details without credentials
#[derive(Serialize, ToSchema)]
pub struct BorrowerInfo {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: BorrowerRole,
}

impl From<Borrower> for BorrowerInfo {
    fn from(borrower: Borrower) -> Self {
        Self {
            id: borrower.id,
            name: borrower.name,
            email: borrower.email,
            role: borrower.role,
        }
    }
}

/// Authenticate and obtain a bearer token
#[utoipa::path(
    post,
    path = "/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Authenticated", body = LoginResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<crate::AppState>,
    Json(request): Json<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    let (token, borrower) = state
        .services
        .auth
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        token,
        token_type: "Bearer".to_string(),
        borrower: borrower.into(),
    }))
}

/// Get the authenticated borrower's own details
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    security(("bearer_auth" = [])),
    responses(
        (status = 200, description = "Authenticated borrower", body = BorrowerInfo),
        (status = 401, description = "Not authenticated")
    )
)]
pub async fn me(
    State(state): State<crate::AppState>,
    AuthenticatedBorrower(claims): AuthenticatedBorrower,
) -> AppResult<Json<BorrowerInfo>> {
    let borrower = state.services.auth.get_borrower(claims.borrower_id).await?;
    Ok(Json(borrower.into()))
}
