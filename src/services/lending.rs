//! Lending service: allocation, lifecycle, and the borrower dashboard

use chrono::{Duration, NaiveDate};

use crate::{
    error::{AppError, AppResult},
    models::{
        borrower::BorrowerClaims,
        lending::{
            CreateLending, Dashboard, LendBook, LendingRecord, LendingStatus, PERMITTED_DURATIONS,
        },
    },
    repository::Repository,
    scheduler,
};

#[derive(Clone)]
pub struct LendingService {
    repository: Repository,
}

impl LendingService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Borrow a book immediately or reserve it for a future start date.
    ///
    /// Without a start date the request is an immediate borrow and is gated
    /// on availability today; the refusal carries the next free date so the
    /// caller can resubmit with it. An explicit start date skips that gate:
    /// the commit-time re-validation inside the store decides.
    pub async fn lend(
        &self,
        borrower_id: i32,
        request: LendBook,
        today: NaiveDate,
    ) -> AppResult<LendingRecord> {
        if !PERMITTED_DURATIONS.contains(&request.duration_days) {
            return Err(AppError::InvalidDuration(request.duration_days));
        }
        if let Some(start) = request.start_date {
            if start < today {
                return Err(AppError::InvalidDate(format!(
                    "Start date {} is in the past",
                    start
                )));
            }
        }

        self.repository.lendings.sweep(today).await?;
        let book = self.repository.books.get(request.book_id).await?;

        let start = match request.start_date {
            Some(start) => start,
            None => {
                let records = self
                    .repository
                    .lendings
                    .find_overlapping(
                        book.id,
                        today,
                        NaiveDate::MAX,
                        &LendingStatus::non_terminal(),
                    )
                    .await?;
                let intervals: Vec<_> = records.iter().map(LendingRecord::interval).collect();
                let availability = scheduler::availability(book.total_copies, &intervals, today);
                if !availability.is_available() {
                    return Err(AppError::BookUnavailable(availability));
                }
                today
            }
        };

        let end = start + Duration::days(request.duration_days);
        let status = if start == today {
            LendingStatus::Active
        } else {
            LendingStatus::Reserved
        };

        self.repository
            .lendings
            .allocate(CreateLending {
                book_id: book.id,
                borrower_id,
                lend_start_date: start,
                lend_end_date: end,
                status,
            })
            .await
    }

    /// A borrower's lendings partitioned into active, reserved, and history
    pub async fn dashboard(&self, borrower_id: i32, today: NaiveDate) -> AppResult<Dashboard> {
        self.repository.lendings.sweep(today).await?;
        self.repository.borrowers.get(borrower_id).await?;

        let lendings = self
            .repository
            .lendings
            .find_by_borrower(borrower_id, today)
            .await?;
        Ok(Dashboard::partition(lendings, today))
    }

    /// Close a lending as returned, freeing its copy
    pub async fn return_lending(
        &self,
        id: i32,
        actor: &BorrowerClaims,
        today: NaiveDate,
    ) -> AppResult<LendingRecord> {
        let record = self.repository.lendings.get(id).await?;
        authorize(actor, &record)?;
        if record.status.is_terminal() {
            return Err(AppError::Conflict(format!(
                "Lending {} is already {}",
                id, record.status
            )));
        }

        self.repository
            .lendings
            .mark_returned(id, today)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Lending {} was closed concurrently", id)))
    }

    /// Cancel a reservation before it begins
    pub async fn cancel(&self, id: i32, actor: &BorrowerClaims) -> AppResult<LendingRecord> {
        let record = self.repository.lendings.get(id).await?;
        authorize(actor, &record)?;
        if record.status != LendingStatus::Reserved {
            return Err(AppError::Conflict(format!(
                "Only reserved lendings can be cancelled; lending {} is {}",
                id, record.status
            )));
        }

        self.repository
            .lendings
            .mark_cancelled(id)
            .await?
            .ok_or_else(|| AppError::Conflict(format!("Lending {} was closed concurrently", id)))
    }
}

fn authorize(actor: &BorrowerClaims, record: &LendingRecord) -> AppResult<()> {
    if actor.borrower_id == record.borrower_id || actor.is_librarian() {
        Ok(())
    } else {
        Err(AppError::Authorization(
            "Only the borrower or a librarian may modify this lending".to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{Days, Utc};

    use crate::{
        models::{
            book::{Book, BookSummary},
            borrower::BorrowerRole,
            lending::{LendingWithBook, SweepOutcome},
        },
        repository::{MockBookStore, MockBorrowerStore, MockLendingStore},
        scheduler::Availability,
    };

    fn day(n: u64) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, 1)
            .unwrap()
            .checked_add_days(Days::new(n))
            .unwrap()
    }

    fn book(total_copies: i32) -> Book {
        Book {
            id: 1,
            title: "The Great Gatsby".to_string(),
            author: "F. Scott Fitzgerald".to_string(),
            genre: "Classic Fiction".to_string(),
            total_copies,
            created_at: Utc::now(),
        }
    }

    fn record(id: i32, borrower_id: i32, start: u64, end: u64, status: LendingStatus) -> LendingRecord {
        LendingRecord {
            id,
            book_id: 1,
            borrower_id,
            lend_start_date: day(start),
            lend_end_date: day(end),
            actual_return_date: None,
            status,
            created_at: Utc::now(),
        }
    }

    fn claims(borrower_id: i32, role: BorrowerRole) -> BorrowerClaims {
        BorrowerClaims {
            sub: "test@example.org".to_string(),
            borrower_id,
            role,
            exp: 0,
            iat: 0,
        }
    }

    struct Mocks {
        books: MockBookStore,
        borrowers: MockBorrowerStore,
        lendings: MockLendingStore,
    }

    impl Mocks {
        fn new() -> Self {
            Self {
                books: MockBookStore::new(),
                borrowers: MockBorrowerStore::new(),
                lendings: MockLendingStore::new(),
            }
        }

        fn into_service(self) -> LendingService {
            LendingService::new(Repository {
                books: Arc::new(self.books),
                borrowers: Arc::new(self.borrowers),
                lendings: Arc::new(self.lendings),
            })
        }
    }

    fn lend_request(duration_days: i64, start_date: Option<NaiveDate>) -> LendBook {
        LendBook {
            book_id: 1,
            duration_days,
            start_date,
        }
    }

    #[tokio::test]
    async fn lend_rejects_unsupported_duration() {
        let service = Mocks::new().into_service();
        let err = service
            .lend(7, lend_request(6, None), day(0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDuration(6)));
    }

    #[tokio::test]
    async fn lend_rejects_past_start_date() {
        let service = Mocks::new().into_service();
        let err = service
            .lend(7, lend_request(5, Some(day(1))), day(3))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidDate(_)));
    }

    #[tokio::test]
    async fn immediate_lend_without_free_copy_reports_next_date() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_sweep()
            .returning(|_| Ok(SweepOutcome::default()));
        mocks.books.expect_get().returning(|_| Ok(book(1)));
        mocks
            .lendings
            .expect_find_overlapping()
            .returning(|_, _, _, _| Ok(vec![record(10, 2, 0, 5, LendingStatus::Active)]));
        // No allocate expectation: the gate must refuse before the write.
        let service = mocks.into_service();

        let err = service
            .lend(7, lend_request(5, None), day(0))
            .await
            .unwrap_err();
        match err {
            AppError::BookUnavailable(availability) => {
                assert_eq!(availability, Availability::NextOn(day(5)));
            }
            other => panic!("expected BookUnavailable, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn immediate_lend_allocates_active_starting_today() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_sweep()
            .returning(|_| Ok(SweepOutcome::default()));
        mocks.books.expect_get().returning(|_| Ok(book(1)));
        mocks
            .lendings
            .expect_find_overlapping()
            .returning(|_, _, _, _| Ok(vec![]));
        mocks
            .lendings
            .expect_allocate()
            .withf(|event| {
                event.status == LendingStatus::Active
                    && event.lend_start_date == day(0)
                    && event.lend_end_date == day(5)
            })
            .returning(|event| {
                Ok(LendingRecord {
                    id: 1,
                    book_id: event.book_id,
                    borrower_id: event.borrower_id,
                    lend_start_date: event.lend_start_date,
                    lend_end_date: event.lend_end_date,
                    actual_return_date: None,
                    status: event.status,
                    created_at: Utc::now(),
                })
            });
        let service = mocks.into_service();

        let lending = service.lend(7, lend_request(5, None), day(0)).await.unwrap();
        assert_eq!(lending.status, LendingStatus::Active);
        assert_eq!(lending.borrower_id, 7);
    }

    #[tokio::test]
    async fn future_start_allocates_reserved_without_availability_gate() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_sweep()
            .returning(|_| Ok(SweepOutcome::default()));
        mocks.books.expect_get().returning(|_| Ok(book(1)));
        // find_overlapping must not be called: commit-time validation rules.
        mocks
            .lendings
            .expect_allocate()
            .withf(|event| {
                event.status == LendingStatus::Reserved
                    && event.lend_start_date == day(5)
                    && event.lend_end_date == day(13)
            })
            .returning(|event| {
                Ok(LendingRecord {
                    id: 2,
                    book_id: event.book_id,
                    borrower_id: event.borrower_id,
                    lend_start_date: event.lend_start_date,
                    lend_end_date: event.lend_end_date,
                    actual_return_date: None,
                    status: event.status,
                    created_at: Utc::now(),
                })
            });
        let service = mocks.into_service();

        let lending = service
            .lend(7, lend_request(8, Some(day(5))), day(0))
            .await
            .unwrap();
        assert_eq!(lending.status, LendingStatus::Reserved);
    }

    #[tokio::test]
    async fn start_today_with_explicit_date_is_active() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_sweep()
            .returning(|_| Ok(SweepOutcome::default()));
        mocks.books.expect_get().returning(|_| Ok(book(3)));
        mocks
            .lendings
            .expect_allocate()
            .withf(|event| event.status == LendingStatus::Active)
            .returning(|event| {
                Ok(LendingRecord {
                    id: 3,
                    book_id: event.book_id,
                    borrower_id: event.borrower_id,
                    lend_start_date: event.lend_start_date,
                    lend_end_date: event.lend_end_date,
                    actual_return_date: None,
                    status: event.status,
                    created_at: Utc::now(),
                })
            });
        let service = mocks.into_service();

        let lending = service
            .lend(7, lend_request(5, Some(day(0))), day(0))
            .await
            .unwrap();
        assert_eq!(lending.status, LendingStatus::Active);
    }

    #[tokio::test]
    async fn capacity_race_surfaces_as_capacity_exceeded() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_sweep()
            .returning(|_| Ok(SweepOutcome::default()));
        mocks.books.expect_get().returning(|_| Ok(book(1)));
        mocks
            .lendings
            .expect_allocate()
            .returning(|_| Err(AppError::CapacityExceeded("lost the race".to_string())));
        let service = mocks.into_service();

        let err = service
            .lend(7, lend_request(5, Some(day(3))), day(0))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::CapacityExceeded(_)));
    }

    #[tokio::test]
    async fn dashboard_partitions_and_annotates() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_sweep()
            .returning(|_| Ok(SweepOutcome::default()));
        mocks.borrowers.expect_get().returning(|id| {
            Ok(crate::models::borrower::Borrower {
                id,
                name: "Jordan Baker".to_string(),
                email: "jordan@example.org".to_string(),
                password: "hash".to_string(),
                role: BorrowerRole::Member,
                created_at: Utc::now(),
            })
        });
        mocks.lendings.expect_find_by_borrower().returning(|_, _| {
            let summary = BookSummary {
                id: 1,
                title: "The Great Gatsby".to_string(),
                author: "F. Scott Fitzgerald".to_string(),
                genre: "Classic Fiction".to_string(),
                total_copies: 1,
                available_copies: 0,
            };
            Ok(vec![
                LendingWithBook {
                    record: record(1, 7, 0, 5, LendingStatus::Active),
                    book: summary.clone(),
                },
                LendingWithBook {
                    record: record(2, 7, 6, 11, LendingStatus::Reserved),
                    book: summary,
                },
            ])
        });
        let service = mocks.into_service();

        let dashboard = service.dashboard(7, day(2)).await.unwrap();
        assert_eq!(dashboard.active.len(), 1);
        assert_eq!(dashboard.reserved.len(), 1);
        assert_eq!(dashboard.active[0].days_remaining, 3);
        assert_eq!(dashboard.total_books_borrowed, 2);
    }

    #[tokio::test]
    async fn return_refuses_other_borrowers() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_get()
            .returning(|id| Ok(record(id, 7, 0, 5, LendingStatus::Active)));
        let service = mocks.into_service();

        let err = service
            .return_lending(1, &claims(8, BorrowerRole::Member), day(2))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Authorization(_)));
    }

    #[tokio::test]
    async fn librarian_may_return_any_lending() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_get()
            .returning(|id| Ok(record(id, 7, 0, 5, LendingStatus::Active)));
        mocks
            .lendings
            .expect_mark_returned()
            .returning(|id, today| {
                let mut returned = record(id, 7, 0, 5, LendingStatus::Returned);
                returned.actual_return_date = Some(today);
                Ok(Some(returned))
            });
        let service = mocks.into_service();

        let returned = service
            .return_lending(1, &claims(99, BorrowerRole::Librarian), day(2))
            .await
            .unwrap();
        assert_eq!(returned.status, LendingStatus::Returned);
        assert_eq!(returned.actual_return_date, Some(day(2)));
    }

    #[tokio::test]
    async fn return_conflicts_when_already_terminal() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_get()
            .returning(|id| Ok(record(id, 7, 0, 5, LendingStatus::Returned)));
        let service = mocks.into_service();

        let err = service
            .return_lending(1, &claims(7, BorrowerRole::Member), day(6))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn cancel_applies_only_to_reservations() {
        let mut mocks = Mocks::new();
        mocks
            .lendings
            .expect_get()
            .returning(|id| Ok(record(id, 7, 0, 5, LendingStatus::Active)));
        let service = mocks.into_service();

        let err = service
            .cancel(1, &claims(7, BorrowerRole::Member))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }
}
