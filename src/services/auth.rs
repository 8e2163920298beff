//! Authentication and borrower account service

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use validator::Validate;

use crate::{
    config::AuthConfig,
    error::{AppError, AppResult},
    models::borrower::{Borrower, BorrowerClaims, BorrowerRole, CreateBorrower, NewBorrower},
    repository::Repository,
};

#[derive(Clone)]
pub struct AuthService {
    repository: Repository,
    config: AuthConfig,
}

impl AuthService {
    pub fn new(repository: Repository, config: AuthConfig) -> Self {
        Self { repository, config }
    }

    /// Authenticate a borrower by email and return a JWT token
    pub async fn login(&self, email: &str, password: &str) -> AppResult<(String, Borrower)> {
        let borrower = self
            .repository
            .borrowers
            .get_by_email(email)
            .await?
            .ok_or_else(|| AppError::Authentication("Invalid email or password".to_string()))?;

        if !verify_password(&borrower.password, password)? {
            return Err(AppError::Authentication(
                "Invalid email or password".to_string(),
            ));
        }

        let claims = BorrowerClaims::for_borrower(&borrower, self.config.jwt_expiration_hours);
        let token = claims
            .create_token(&self.config.jwt_secret)
            .map_err(|e| AppError::Internal(format!("Failed to create token: {}", e)))?;

        tracing::info!(borrower_id = borrower.id, "borrower logged in");
        Ok((token, borrower))
    }

    /// Create a borrower account (librarian operation)
    pub async fn create_borrower(&self, request: CreateBorrower) -> AppResult<Borrower> {
        request
            .validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;

        let email = request.email.to_lowercase();
        if self.repository.borrowers.get_by_email(&email).await?.is_some() {
            return Err(AppError::Conflict("Email already registered".to_string()));
        }

        let password = hash_password(&request.password)?;
        self.repository
            .borrowers
            .create(NewBorrower {
                name: request.name,
                email,
                password,
                role: request.role.unwrap_or(BorrowerRole::Member),
            })
            .await
    }

    /// Get a borrower by ID
    pub async fn get_borrower(&self, id: i32) -> AppResult<Borrower> {
        self.repository.borrowers.get(id).await
    }
}

/// Verify a password against its Argon2 hash
fn verify_password(hash: &str, password: &str) -> AppResult<bool> {
    let parsed_hash =
        PasswordHash::new(hash).map_err(|_| AppError::Internal("Invalid password hash".to_string()))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash a password using Argon2
fn hash_password(password: &str) -> AppResult<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))?;
    Ok(hash.to_string())
}
