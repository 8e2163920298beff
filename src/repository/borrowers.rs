//! Borrowers repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::borrower::{Borrower, NewBorrower},
    repository::BorrowerStore,
};

#[derive(Clone)]
pub struct BorrowersRepository {
    pool: Pool<Postgres>,
}

impl BorrowersRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BorrowerStore for BorrowersRepository {
    async fn get(&self, id: i32) -> AppResult<Borrower> {
        sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Borrower with id {} not found", id)))
    }

    async fn get_by_email(&self, email: &str) -> AppResult<Option<Borrower>> {
        let borrower =
            sqlx::query_as::<_, Borrower>("SELECT * FROM borrowers WHERE lower(email) = lower($1)")
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(borrower)
    }

    async fn create(&self, borrower: NewBorrower) -> AppResult<Borrower> {
        let created = sqlx::query_as::<_, Borrower>(
            r#"
            INSERT INTO borrowers (name, email, password, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&borrower.name)
        .bind(&borrower.email)
        .bind(&borrower.password)
        .bind(borrower.role)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(borrower_id = created.id, "borrower created");
        Ok(created)
    }
}
