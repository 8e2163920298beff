//! Borrower model and JWT claims

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::AppError;

/// Borrower roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum BorrowerRole {
    Member,
    Librarian,
}

impl BorrowerRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            BorrowerRole::Member => "member",
            BorrowerRole::Librarian => "librarian",
        }
    }
}

impl std::fmt::Display for BorrowerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BorrowerRole {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "member" => Ok(BorrowerRole::Member),
            "librarian" => Ok(BorrowerRole::Librarian),
            _ => Err(format!("Invalid borrower role: {}", s)),
        }
    }
}

// SQLx conversion for BorrowerRole (stored as TEXT)
impl sqlx::Type<Postgres> for BorrowerRole {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for BorrowerRole {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BorrowerRole {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Borrower row from the database
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Borrower {
    pub id: i32,
    pub name: String,
    pub email: String,
    /// Argon2 password hash; never serialized out
    #[serde(skip_serializing)]
    pub password: String,
    pub role: BorrowerRole,
    pub created_at: DateTime<Utc>,
}

/// Create borrower request
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateBorrower {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 8))]
    pub password: String,
    pub role: Option<BorrowerRole>,
}

/// Borrower row ready for insertion, password already hashed
#[derive(Debug, Clone)]
pub struct NewBorrower {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: BorrowerRole,
}

/// JWT claims identifying the authenticated borrower
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BorrowerClaims {
    pub sub: String,
    pub borrower_id: i32,
    pub role: BorrowerRole,
    pub exp: i64,
    pub iat: i64,
}

impl BorrowerClaims {
    pub fn for_borrower(borrower: &Borrower, expiration_hours: u64) -> Self {
        let now = Utc::now().timestamp();
        Self {
            sub: borrower.email.clone(),
            borrower_id: borrower.id,
            role: borrower.role,
            exp: now + (expiration_hours as i64 * 3600),
            iat: now,
        }
    }

    /// Create a new JWT token
    pub fn create_token(&self, secret: &str) -> Result<String, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{encode, EncodingKey, Header};
        encode(
            &Header::default(),
            self,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
    }

    /// Parse JWT token
    pub fn from_token(token: &str, secret: &str) -> Result<Self, jsonwebtoken::errors::Error> {
        use jsonwebtoken::{decode, DecodingKey, Validation};
        let token_data = decode::<Self>(
            token,
            &DecodingKey::from_secret(secret.as_bytes()),
            &Validation::default(),
        )?;
        Ok(token_data.claims)
    }

    pub fn is_librarian(&self) -> bool {
        self.role == BorrowerRole::Librarian
    }

    /// Require librarian privileges
    pub fn require_librarian(&self) -> Result<(), AppError> {
        if self.is_librarian() {
            Ok(())
        } else {
            Err(AppError::Authorization(
                "Librarian privileges required".to_string(),
            ))
        }
    }
}
