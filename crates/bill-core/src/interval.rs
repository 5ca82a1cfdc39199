//! Half-open work-time intervals and day-aligned splitting.
//!
//! Committed work records never span a calendar-day boundary. A raw
//! `[start, end)` request is therefore cut at midnights before it is
//! stored: the pieces are contiguous, non-overlapping, each confined to
//! one day, and their union is exactly the original interval.

use chrono::{Days, Duration, NaiveDateTime, NaiveTime};

use crate::error::EngineError;

/// A half-open time interval `[start, end)` with `start < end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl Interval {
    /// Creates an interval, rejecting `start >= end`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, EngineError> {
        if start >= end {
            return Err(EngineError::EmptyInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Inclusive lower bound.
    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    /// Exclusive upper bound.
    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Length in whole seconds.
    #[must_use]
    pub fn duration_seconds(&self) -> i64 {
        (self.end - self.start).num_seconds()
    }

    /// Half-open overlap test: `[a,b)` and `[c,d)` overlap iff
    /// `a < d && c < b`. Intervals that only share an endpoint do not
    /// overlap.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Whether the interval lies within a single calendar day.
    ///
    /// The end is exclusive, so an interval ending exactly at midnight
    /// still belongs to the preceding day.
    #[must_use]
    pub fn is_day_confined(&self) -> bool {
        self.start.date() == (self.end - Duration::seconds(1)).date()
    }

    /// Cuts the interval at every midnight it crosses.
    ///
    /// Returns the pieces in chronological order; the first starts at
    /// `start`, the last ends at `end`, interior pieces are whole days.
    /// Never empty: a single-day interval comes back unchanged.
    #[must_use]
    pub fn split_by_day(&self) -> Vec<Self> {
        let first_day = self.start.date();
        let last_day = (self.end - Duration::seconds(1)).date();
        if first_day == last_day {
            return vec![*self];
        }

        let mut pieces = Vec::new();
        let mut cursor = self.start;
        let mut day = first_day;
        while day < last_day {
            let next_midnight = (day + Days::new(1)).and_time(NaiveTime::MIN);
            pieces.push(Self {
                start: cursor,
                end: next_midnight,
            });
            cursor = next_midnight;
            day = day + Days::new(1);
        }
        pieces.push(Self {
            start: cursor,
            end: self.end,
        });
        pieces
    }
}
