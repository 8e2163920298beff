//! Books repository for database operations

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::{AppError, AppResult},
    models::book::{Book, BookSummary, CreateBook},
    repository::BookStore,
};

/// Derived free-copy count: capacity minus the non-terminal lendings whose
/// interval contains the reference date. Recomputed on every read so the
/// count can never drift from the record set.
const SUMMARY_COLUMNS: &str = r#"
    b.id, b.title, b.author, b.genre, b.total_copies,
    (b.total_copies - COALESCE((
        SELECT COUNT(*)
        FROM lendings l
        WHERE l.book_id = b.id
          AND l.status IN ('reserved', 'active', 'overdue')
          AND l.lend_start_date <= $1
          AND l.lend_end_date > $1
    ), 0))::int AS available_copies
"#;

#[derive(Clone)]
pub struct BooksRepository {
    pool: Pool<Postgres>,
}

impl BooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BookStore for BooksRepository {
    async fn get(&self, id: i32) -> AppResult<Book> {
        sqlx::query_as::<_, Book>("SELECT * FROM books WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn get_summary(&self, id: i32, at: NaiveDate) -> AppResult<BookSummary> {
        let query = format!("SELECT {} FROM books b WHERE b.id = $2", SUMMARY_COLUMNS);
        sqlx::query_as::<_, BookSummary>(&query)
            .bind(at)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Book with id {} not found", id)))
    }

    async fn list(&self, at: NaiveDate) -> AppResult<Vec<BookSummary>> {
        let query = format!(
            "SELECT {} FROM books b ORDER BY b.title, b.id",
            SUMMARY_COLUMNS
        );
        let books = sqlx::query_as::<_, BookSummary>(&query)
            .bind(at)
            .fetch_all(&self.pool)
            .await?;
        Ok(books)
    }

    async fn create(&self, book: CreateBook) -> AppResult<Book> {
        let created = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, author, genre, total_copies)
            VALUES ($1, $2, $3, $4)
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.author)
        .bind(&book.genre)
        .bind(book.total_copies)
        .fetch_one(&self.pool)
        .await?;

        tracing::info!(book_id = created.id, title = %created.title, "book created");
        Ok(created)
    }
}
