//! Validation window with optional bounds.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The requested range ends before it starts.
#[derive(Debug, Error)]
#[error("invalid date range: end {end} precedes start {start}")]
pub struct InvalidRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

/// Inclusive date window for a validation run. Either bound may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    /// Build a range, rejecting `end < start` when both bounds are set.
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Result<Self, InvalidRange> {
        if let (Some(s), Some(e)) = (start, end) {
            if e < s {
                return Err(InvalidRange { start: s, end: e });
            }
        }
        Ok(Self { start, end })
    }

    /// Fully open range.
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn is_unbounded(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// Whether a date falls inside the window. Missing bounds are open.
    pub fn contains(&self, date: NaiveDate) -> bool {
        if let Some(start) = self.start {
            if date < start {
                return false;
            }
        }
        if let Some(end) = self.end {
            if date > end {
                return false;
            }
        }
        true
    }

    /// Last `days` days ending at `end` (inclusive).
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        let start = end - chrono::Duration::days(days.saturating_sub(1) as i64);
        Self {
            start: Some(start),
            end: Some(end),
        }
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.start, self.end) {
            (Some(s), Some(e)) => write!(f, "{s}..{e}"),
            (Some(s), None) => write!(f, "{s}.."),
            (None, Some(e)) => write!(f, "..{e}"),
            (None, None) => write!(f, "unbounded"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn rejects_inverted_bounds() {
        let err = DateRange::new(Some(d("2024-02-01")), Some(d("2024-01-01")));
        assert!(err.is_err());
    }

    #[test]
    fn contains_respects_bounds() {
        let range = DateRange::new(Some(d("2024-01-01")), Some(d("2024-01-31"))).unwrap();
        assert!(range.contains(d("2024-01-01")));
        assert!(range.contains(d("2024-01-31")));
        assert!(!range.contains(d("2023-12-31")));
        assert!(!range.contains(d("2024-02-01")));
    }

    #[test]
    fn unbounded_contains_everything() {
        let range = DateRange::unbounded();
        assert!(range.contains(d("1990-06-15")));
        assert!(range.contains(d("2099-01-01")));
    }

    #[test]
    fn trailing_days_is_inclusive() {
        let range = DateRange::trailing_days(d("2024-01-07"), 7);
        assert_eq!(range.start, Some(d("2024-01-01")));
        assert_eq!(range.end, Some(d("2024-01-07")));
    }
}
