//! Lending availability and capacity arithmetic.
//!
//! Copies are fungible units of capacity: a book with `total_copies = N` can
//! sustain at most N concurrently-overlapping lending intervals. This module
//! holds the pure sweep-line computations shared by the availability read
//! path and the allocator's commit-time re-validation. No IO happens here;
//! callers load the relevant lending records and hand over their intervals.

use std::collections::BTreeMap;

use chrono::NaiveDate;

/// Half-open calendar interval `[start, end)`.
///
/// The end date is exclusive: a lending frees its copy on its end date, so
/// `[day 0, day 5)` and `[day 5, day 10)` do not overlap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Interval {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        debug_assert!(end > start, "interval end must be after start");
        Self { start, end }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date < self.end
    }

    pub fn overlaps(&self, other: &Interval) -> bool {
        self.start < other.end && other.start < self.end
    }
}

/// Availability of a book as of a reference date.
///
/// `Never` is the explicit sentinel for a zero-copy pool; it is deliberately
/// distinct from "available now" and from "next copy frees on a known date".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    AvailableNow,
    NextOn(NaiveDate),
    Never,
}

impl Availability {
    pub fn is_available(&self) -> bool {
        matches!(self, Availability::AvailableNow)
    }

    pub fn next_available_date(&self) -> Option<NaiveDate> {
        match self {
            Availability::NextOn(date) => Some(*date),
            _ => None,
        }
    }
}

/// Number of intervals covering `at`.
pub fn occupied_at(intervals: &[Interval], at: NaiveDate) -> usize {
    intervals.iter().filter(|iv| iv.contains(at)).count()
}

/// Compute whether a copy is free at `as_of` and, if not, the earliest date
/// at which one frees up.
///
/// Occupancy changes only at interval endpoints, so the walk visits the
/// endpoint dates after `as_of` in ascending order, applying all starts and
/// ends falling on the same date at once (ends are exclusive, so an interval
/// ending and another starting on the same date hand the copy over without
/// a gap). The first date where the running count drops below capacity is
/// the answer.
pub fn availability(total_copies: i32, intervals: &[Interval], as_of: NaiveDate) -> Availability {
    if total_copies <= 0 {
        return Availability::Never;
    }
    let total = total_copies as i64;

    let occupied = occupied_at(intervals, as_of) as i64;
    if occupied < total {
        return Availability::AvailableNow;
    }

    let mut deltas: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for iv in intervals {
        if iv.end <= as_of {
            continue;
        }
        if iv.start > as_of {
            *deltas.entry(iv.start).or_insert(0) += 1;
        }
        *deltas.entry(iv.end).or_insert(0) -= 1;
    }

    let mut running = occupied;
    let next = deltas.into_iter().find_map(|(date, delta)| {
        running += delta;
        (running < total).then_some(date)
    });

    match next {
        Some(date) => Availability::NextOn(date),
        // Only reachable when no interval covers `as_of` at all, in which
        // case the pool was already reported free above; kept total anyway.
        None => Availability::AvailableNow,
    }
}

/// Commit-time capacity check: would adding `candidate` keep the overlap
/// count within `total_copies` at every instant of the candidate window?
///
/// Same sweep as [`availability`], restricted to the candidate span. The
/// candidate itself counts as one occupied copy across the whole window.
pub fn fits(total_copies: i32, existing: &[Interval], candidate: Interval) -> bool {
    if total_copies <= 0 {
        return false;
    }
    let total = total_copies as i64;

    let mut at_start: i64 = 0;
    let mut deltas: BTreeMap<NaiveDate, i64> = BTreeMap::new();
    for iv in existing {
        if !iv.overlaps(&candidate) {
            continue;
        }
        if iv.start <= candidate.start {
            at_start += 1;
        } else {
            *deltas.entry(iv.start).or_insert(0) += 1;
        }
        if iv.end < candidate.end {
            *deltas.entry(iv.end).or_insert(0) -= 1;
        }
    }

    let mut running = at_start + 1;
    if running > total {
        return false;
    }
    for (_, delta) in deltas {
        running += delta;
        if running > total {
            return false;
        }
    }
    true
}
