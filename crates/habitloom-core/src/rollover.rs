//! Day rollover detection.
//!
//! The controller owns the "current day" pointer. Detection is a pure
//! comparison against the day computed from the injected `now`; advancing
//! the pointer is a separate step so callers can finalize the outgoing day
//! first.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const LAST_TODAY_KEY: &str = "last_today";

/// A transition between two calendar days.
///
/// Only the endpoints are known; days skipped while suspended are not
/// enumerated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayChange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DayRollover {
    current: NaiveDate,
}

impl DayRollover {
    pub fn new(current: NaiveDate) -> Self {
        Self { current }
    }

    /// The day all progress writes currently target.
    pub fn current(&self) -> NaiveDate {
        self.current
    }

    /// Compare against the freshly computed `today`.
    pub fn detect(&self, today: NaiveDate) -> Option<DayChange> {
        (today != self.current).then_some(DayChange {
            from: self.current,
            to: today,
        })
    }

    /// Move the pointer to the new day.
    pub fn advance(&mut self, change: DayChange) {
        self.current = change.to;
    }
}
