//! Lending record model and related types

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

use crate::models::book::BookSummary;
use crate::scheduler::Interval;

/// The only two permitted lending durations, in days
pub const PERMITTED_DURATIONS: [i64; 2] = [5, 8];

/// Lifecycle status of a lending record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum LendingStatus {
    /// Future-dated lending that has not begun
    Reserved,
    /// Currently in effect
    Active,
    Returned,
    Overdue,
    Cancelled,
}

impl LendingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LendingStatus::Reserved => "reserved",
            LendingStatus::Active => "active",
            LendingStatus::Returned => "returned",
            LendingStatus::Overdue => "overdue",
            LendingStatus::Cancelled => "cancelled",
        }
    }

    /// Statuses that hold a copy of the pool
    pub fn non_terminal() -> [LendingStatus; 3] {
        [
            LendingStatus::Reserved,
            LendingStatus::Active,
            LendingStatus::Overdue,
        ]
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, LendingStatus::Returned | LendingStatus::Cancelled)
    }
}

impl std::fmt::Display for LendingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for LendingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "reserved" => Ok(LendingStatus::Reserved),
            "active" => Ok(LendingStatus::Active),
            "returned" => Ok(LendingStatus::Returned),
            "overdue" => Ok(LendingStatus::Overdue),
            "cancelled" => Ok(LendingStatus::Cancelled),
            _ => Err(format!("Invalid lending status: {}", s)),
        }
    }
}

// SQLx conversion for LendingStatus (stored as TEXT)
impl sqlx::Type<Postgres> for LendingStatus {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }
}

impl<'r> Decode<'r, Postgres> for LendingStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for LendingStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        let s: String = self.as_str().to_string();
        <String as Encode<Postgres>>::encode(s, buf)
    }
}

/// Lending record: one date-bounded hold on one copy of one book.
///
/// The interval is half-open; the copy frees on `lend_end_date`.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct LendingRecord {
    pub id: i32,
    pub book_id: i32,
    pub borrower_id: i32,
    pub lend_start_date: NaiveDate,
    pub lend_end_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: LendingStatus,
    pub created_at: DateTime<Utc>,
}

impl LendingRecord {
    pub fn interval(&self) -> Interval {
        Interval::new(self.lend_start_date, self.lend_end_date)
    }

    pub fn duration_days(&self) -> i64 {
        (self.lend_end_date - self.lend_start_date).num_days()
    }

    /// Days until the lending is due; negative once overdue
    pub fn days_remaining(&self, today: NaiveDate) -> i64 {
        (self.lend_end_date - today).num_days()
    }

    /// Status the lifecycle sweeper would assign as of `today`.
    ///
    /// Applying this twice with the same `today` yields the same status as
    /// applying it once; the SQL sweep mirrors this function.
    pub fn swept_status(&self, today: NaiveDate) -> LendingStatus {
        match self.status {
            LendingStatus::Reserved if self.lend_start_date > today => LendingStatus::Reserved,
            LendingStatus::Reserved | LendingStatus::Active => {
                if self.lend_end_date < today {
                    LendingStatus::Overdue
                } else {
                    LendingStatus::Active
                }
            }
            other => other,
        }
    }
}

/// Allocation event handed to the store's atomic write path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateLending {
    pub book_id: i32,
    pub borrower_id: i32,
    pub lend_start_date: NaiveDate,
    pub lend_end_date: NaiveDate,
    pub status: LendingStatus,
}

/// Lend request payload
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LendBook {
    pub book_id: i32,
    /// Lending duration in days; must be 5 or 8
    pub duration_days: i64,
    /// Start date for an advance reservation; omit for an immediate borrow
    pub start_date: Option<NaiveDate>,
}

/// Counts of status transitions applied by one lifecycle sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepOutcome {
    pub activated: u64,
    pub marked_overdue: u64,
}

/// Lending joined with its book, as loaded by the store
#[derive(Debug, Clone)]
pub struct LendingWithBook {
    pub record: LendingRecord,
    pub book: BookSummary,
}

/// Dashboard entry annotated with derived calendar fields
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct DashboardEntry {
    pub id: i32,
    pub book: BookSummary,
    pub lend_start_date: NaiveDate,
    pub lend_end_date: NaiveDate,
    pub actual_return_date: Option<NaiveDate>,
    pub status: LendingStatus,
    /// `lend_end_date - today`; negative once overdue
    pub days_remaining: i64,
    pub is_overdue: bool,
}

impl DashboardEntry {
    fn new(lending: LendingWithBook, today: NaiveDate) -> Self {
        let days_remaining = lending.record.days_remaining(today);
        Self {
            id: lending.record.id,
            book: lending.book,
            lend_start_date: lending.record.lend_start_date,
            lend_end_date: lending.record.lend_end_date,
            actual_return_date: lending.record.actual_return_date,
            status: lending.record.status,
            days_remaining,
            is_overdue: lending.record.status == LendingStatus::Overdue,
        }
    }
}

/// A borrower's lendings partitioned by lifecycle stage
#[derive(Debug, Clone, Default, Serialize, ToSchema)]
pub struct Dashboard {
    /// In-effect lendings, overdue ones included
    pub active: Vec<DashboardEntry>,
    /// Future-dated reservations
    pub reserved: Vec<DashboardEntry>,
    /// Returned lendings
    pub history: Vec<DashboardEntry>,
    /// Lifetime count, cancelled reservations excluded
    pub total_books_borrowed: usize,
}

impl Dashboard {
    pub fn partition(lendings: Vec<LendingWithBook>, today: NaiveDate) -> Self {
        let mut dashboard = Dashboard::default();
        for lending in lendings {
            let entry = DashboardEntry::new(lending, today);
            match entry.status {
                LendingStatus::Active | LendingStatus::Overdue => dashboard.active.push(entry),
                LendingStatus::Reserved => dashboard.reserved.push(entry),
                LendingStatus::Returned => dashboard.history.push(entry),
                // Cancelled reservations never held a copy
                LendingStatus::Cancelled => continue,
            }
            dashboard.total_books_borrowed += 1;
        }
        dashboard
    }
}
