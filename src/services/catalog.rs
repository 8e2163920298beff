//! Catalog service: book browsing and availability reads

use chrono::NaiveDate;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, BookSummary, CreateBook},
        lending::{LendingRecord, LendingStatus},
    },
    repository::Repository,
    scheduler::{self, Availability},
};

#[derive(Clone)]
pub struct CatalogService {
    repository: Repository,
}

impl CatalogService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// List the catalog with free-copy counts derived as of `at`
    pub async fn list_books(&self, at: NaiveDate) -> AppResult<Vec<BookSummary>> {
        self.repository.books.list(at).await
    }

    /// Get a single book with its derived free-copy count
    pub async fn get_book(&self, id: i32, at: NaiveDate) -> AppResult<BookSummary> {
        self.repository.books.get_summary(id, at).await
    }

    /// Add a book to the catalog
    pub async fn create_book(&self, book: CreateBook) -> AppResult<Book> {
        book.validate()
            .map_err(|e| AppError::Validation(e.to_string()))?;
        self.repository.books.create(book).await
    }

    /// Whether a copy is free as of `as_of` and, if not, when one frees up.
    ///
    /// Runs the lifecycle sweep first so the answer reflects current
    /// calendar state; the read itself takes no locks.
    pub async fn availability(
        &self,
        book_id: i32,
        as_of: NaiveDate,
    ) -> AppResult<(BookSummary, Availability)> {
        self.repository.lendings.sweep(as_of).await?;

        let book = self.repository.books.get_summary(book_id, as_of).await?;
        let records = self
            .repository
            .lendings
            .find_overlapping(book_id, as_of, NaiveDate::MAX, &LendingStatus::non_terminal())
            .await?;
        let intervals: Vec<_> = records.iter().map(LendingRecord::interval).collect();

        let availability = scheduler::availability(book.total_copies, &intervals, as_of);
        Ok((book, availability))
    }
}
