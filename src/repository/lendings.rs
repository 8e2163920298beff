//! Lendings repository for database operations
//!
//! `allocate` is the single concurrency-critical write path: it re-validates
//! capacity and inserts inside one transaction holding a row lock on the
//! book, so two overlapping requests for the same book serialize at the
//! store and the second one re-checks against committed state.

use async_trait::async_trait;
use chrono::NaiveDate;
use sqlx::{Pool, Postgres, Row};

use crate::{
    error::{AppError, AppResult},
    models::{
        book::BookSummary,
        lending::{CreateLending, LendingRecord, LendingStatus, LendingWithBook, SweepOutcome},
    },
    repository::LendingStore,
    scheduler,
};

#[derive(Clone)]
pub struct LendingsRepository {
    pool: Pool<Postgres>,
}

impl LendingsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn status_names(statuses: &[LendingStatus]) -> Vec<String> {
    statuses.iter().map(|s| s.as_str().to_string()).collect()
}

#[async_trait]
impl LendingStore for LendingsRepository {
    async fn get(&self, id: i32) -> AppResult<LendingRecord> {
        sqlx::query_as::<_, LendingRecord>("SELECT * FROM lendings WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Lending with id {} not found", id)))
    }

    async fn find_overlapping(
        &self,
        book_id: i32,
        start: NaiveDate,
        end: NaiveDate,
        statuses: &[LendingStatus],
    ) -> AppResult<Vec<LendingRecord>> {
        // Half-open intersection: [s, e) meets [start, end) iff s < end and
        // e > start.
        let records = sqlx::query_as::<_, LendingRecord>(
            r#"
            SELECT * FROM lendings
            WHERE book_id = $1
              AND lend_start_date < $2
              AND lend_end_date > $3
              AND status = ANY($4)
            ORDER BY lend_start_date, id
            "#,
        )
        .bind(book_id)
        .bind(end)
        .bind(start)
        .bind(status_names(statuses))
        .fetch_all(&self.pool)
        .await?;
        Ok(records)
    }

    async fn allocate(&self, event: CreateLending) -> AppResult<LendingRecord> {
        let mut tx = self.pool.begin().await?;

        // Per-book mutual exclusion scope: the row lock serializes
        // allocations for this book until commit or rollback.
        let total_copies: i32 =
            sqlx::query_scalar("SELECT total_copies FROM books WHERE id = $1 FOR UPDATE")
                .bind(event.book_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or_else(|| {
                    AppError::NotFound(format!("Book with id {} not found", event.book_id))
                })?;

        // Commit-time re-validation: availability observed at read time can
        // be stale by now, so the occupied count is recomputed over the
        // whole requested window from records visible inside the lock.
        let existing = sqlx::query_as::<_, LendingRecord>(
            r#"
            SELECT * FROM lendings
            WHERE book_id = $1
              AND lend_start_date < $2
              AND lend_end_date > $3
              AND status = ANY($4)
            "#,
        )
        .bind(event.book_id)
        .bind(event.lend_end_date)
        .bind(event.lend_start_date)
        .bind(status_names(&LendingStatus::non_terminal()))
        .fetch_all(&mut *tx)
        .await?;

        let intervals: Vec<_> = existing.iter().map(LendingRecord::interval).collect();
        let candidate = scheduler::Interval::new(event.lend_start_date, event.lend_end_date);
        if !scheduler::fits(total_copies, &intervals, candidate) {
            return Err(AppError::CapacityExceeded(format!(
                "All {} copies of book {} are taken within {}..{}",
                total_copies, event.book_id, event.lend_start_date, event.lend_end_date
            )));
        }

        let record = sqlx::query_as::<_, LendingRecord>(
            r#"
            INSERT INTO lendings (book_id, borrower_id, lend_start_date, lend_end_date, status)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(event.book_id)
        .bind(event.borrower_id)
        .bind(event.lend_start_date)
        .bind(event.lend_end_date)
        .bind(event.status)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            lending_id = record.id,
            book_id = record.book_id,
            borrower_id = record.borrower_id,
            status = %record.status,
            "lending allocated"
        );
        Ok(record)
    }

    async fn find_by_borrower(
        &self,
        borrower_id: i32,
        at: NaiveDate,
    ) -> AppResult<Vec<LendingWithBook>> {
        let rows = sqlx::query(
            r#"
            SELECT l.id, l.book_id, l.borrower_id, l.lend_start_date, l.lend_end_date,
                   l.actual_return_date, l.status, l.created_at,
                   b.title, b.author, b.genre, b.total_copies,
                   (b.total_copies - COALESCE((
                       SELECT COUNT(*)
                       FROM lendings l2
                       WHERE l2.book_id = b.id
                         AND l2.status IN ('reserved', 'active', 'overdue')
                         AND l2.lend_start_date <= $2
                         AND l2.lend_end_date > $2
                   ), 0))::int AS available_copies
            FROM lendings l
            JOIN books b ON l.book_id = b.id
            WHERE l.borrower_id = $1
            ORDER BY l.lend_start_date, l.id
            "#,
        )
        .bind(borrower_id)
        .bind(at)
        .fetch_all(&self.pool)
        .await?;

        let mut result = Vec::with_capacity(rows.len());
        for row in rows {
            result.push(LendingWithBook {
                record: LendingRecord {
                    id: row.get("id"),
                    book_id: row.get("book_id"),
                    borrower_id: row.get("borrower_id"),
                    lend_start_date: row.get("lend_start_date"),
                    lend_end_date: row.get("lend_end_date"),
                    actual_return_date: row.get("actual_return_date"),
                    status: row.get("status"),
                    created_at: row.get("created_at"),
                },
                book: BookSummary {
                    id: row.get("book_id"),
                    title: row.get("title"),
                    author: row.get("author"),
                    genre: row.get("genre"),
                    total_copies: row.get("total_copies"),
                    available_copies: row.get("available_copies"),
                },
            });
        }
        Ok(result)
    }

    async fn mark_returned(&self, id: i32, today: NaiveDate) -> AppResult<Option<LendingRecord>> {
        // Conditional update: only a record still holding a copy can close.
        let record = sqlx::query_as::<_, LendingRecord>(
            r#"
            UPDATE lendings
            SET status = 'returned', actual_return_date = $2
            WHERE id = $1 AND status IN ('reserved', 'active', 'overdue')
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(today)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref returned) = record {
            tracing::info!(lending_id = returned.id, book_id = returned.book_id, "lending returned");
        }
        Ok(record)
    }

    async fn mark_cancelled(&self, id: i32) -> AppResult<Option<LendingRecord>> {
        let record = sqlx::query_as::<_, LendingRecord>(
            r#"
            UPDATE lendings
            SET status = 'cancelled'
            WHERE id = $1 AND status = 'reserved'
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(ref cancelled) = record {
            tracing::info!(lending_id = cancelled.id, book_id = cancelled.book_id, "reservation cancelled");
        }
        Ok(record)
    }

    async fn sweep(&self, today: NaiveDate) -> AppResult<SweepOutcome> {
        // Promotion first, so a reservation whose whole window has already
        // passed goes reserved -> active -> overdue within one sweep.
        let activated = sqlx::query(
            "UPDATE lendings SET status = 'active' WHERE status = 'reserved' AND lend_start_date <= $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await?
        .rows_affected();

        let marked_overdue = sqlx::query(
            "UPDATE lendings SET status = 'overdue' WHERE status = 'active' AND lend_end_date < $1",
        )
        .bind(today)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if activated > 0 || marked_overdue > 0 {
            tracing::debug!(activated, marked_overdue, %today, "lifecycle sweep applied transitions");
        }
        Ok(SweepOutcome {
            activated,
            marked_overdue,
        })
    }
}
