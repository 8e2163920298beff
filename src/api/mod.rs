//! API handlers for Shelfmark REST endpoints

pub mod auth;
pub mod books;
pub mod borrowers;
pub mod health;
pub mod lendings;
pub mod openapi;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::{error::AppError, models::borrower::BorrowerClaims, AppState};

/// Extractor resolving the bearer credential to the authenticated borrower
pub struct AuthenticatedBorrower(pub BorrowerClaims);

#[async_trait]
impl FromRequestParts<AppState> for AuthenticatedBorrower {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Get the Authorization header
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::Authentication("Missing authorization header".to_string()))?;

        // Check for Bearer token
        if !auth_header.starts_with("Bearer ") {
            return Err(AppError::Authentication(
                "Invalid authorization header format".to_string(),
            ));
        }

        let token = &auth_header[7..];

        // Validate JWT token using the secret from configuration
        let claims = BorrowerClaims::from_token(token, &state.config.auth.jwt_secret)
            .map_err(|e| AppError::Authentication(e.to_string()))?;

        Ok(AuthenticatedBorrower(claims))
    }
}
