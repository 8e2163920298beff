//! Storage layer: store interfaces and their Postgres implementations

pub mod books;
pub mod borrowers;
pub mod lendings;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres};

use crate::{
    error::AppResult,
    models::{
        book::{Book, BookSummary, CreateBook},
        borrower::{Borrower, NewBorrower},
        lending::{CreateLending, LendingRecord, LendingStatus, LendingWithBook, SweepOutcome},
    },
};

/// Catalog store for books
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BookStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Book>;
    /// Book with the free-copy count derived as of `at`
    async fn get_summary(&self, id: i32, at: NaiveDate) -> AppResult<BookSummary>;
    async fn list(&self, at: NaiveDate) -> AppResult<Vec<BookSummary>>;
    async fn create(&self, book: CreateBook) -> AppResult<Book>;
}

/// Borrower account store
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BorrowerStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<Borrower>;
    async fn get_by_email(&self, email: &str) -> AppResult<Option<Borrower>>;
    async fn create(&self, borrower: NewBorrower) -> AppResult<Borrower>;
}

/// Lending record store.
///
/// `find_overlapping` is the primitive both the availability read path and
/// the allocator build on; its half-open interval semantics (inclusive
/// start, exclusive end) carry the whole engine.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LendingStore: Send + Sync {
    async fn get(&self, id: i32) -> AppResult<LendingRecord>;

    /// Records for `book_id` whose `[lend_start_date, lend_end_date)`
    /// intersects `[start, end)` and whose status is in `statuses`
    async fn find_overlapping(
        &self,
        book_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[LendingStatus],
    ) -> AppResult<Vec<LendingRecord>>;

    /// Atomically re-validate capacity over the requested window and insert
    /// the record; fails with `CapacityExceeded` when the window would push
    /// the overlap count above the book's copy pool at any instant
    async fn allocate(&self, event: CreateLending) -> AppResult<LendingRecord>;

    /// All of a borrower's lendings joined with their books, availability
    /// counts derived as of `at`
    async fn find_by_borrower(&self, borrower_id: i32, at: NaiveDate)
        -> AppResult<Vec<LendingWithBook>>;

    /// Close a non-terminal record as returned; `None` when the record was
    /// already terminal
    async fn mark_returned(&self, id: i32, today: NaiveDate) -> AppResult<Option<LendingRecord>>;

    /// Cancel a reserved record; `None` when it was not reserved
    async fn mark_cancelled(&self, id: i32) -> AppResult<Option<LendingRecord>>;

    /// Lifecycle sweep: reserved records whose start has arrived become
    /// active, active records past their end become overdue. Idempotent.
    async fn sweep(&self, today: NaiveDate) -> AppResult<SweepOutcome>;
}

/// Main repository struct bundling the store implementations
#[derive(Clone)]
pub struct Repository {
    pub books: Arc<dyn BookStore>,
    pub borrowers: Arc<dyn BorrowerStore>,
    pub lendings: Arc<dyn LendingStore>,
}

impl Repository {
    /// Create a repository backed by the given Postgres pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            books: Arc::new(books::BooksRepository::new(pool.clone())),
            borrowers: Arc::new(borrowers::BorrowersRepository::new(pool.clone())),
            lendings: Arc::new(lendings::LendingsRepository::new(pool)),
        }
    }
}
