use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::accounting::Direction;

/// Why a timer stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    /// Toggled off by the user.
    Manual,
    /// Reached the session ceiling while running.
    AutoStop,
    /// Reached the session ceiling while the app was closed.
    ExpiredOffline,
    /// The calendar day ended.
    Rollover,
    /// Its habit was deleted.
    HabitDeleted,
}

/// Every state change in the tracker produces an Event.
/// Presentation code renders from them; the CLI prints them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    TimerStarted {
        habit_id: String,
        accumulated_secs: u64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        habit_id: String,
        date: NaiveDate,
        elapsed_secs: u64,
        reason: StopReason,
        at: DateTime<Utc>,
    },
    TimerResumed {
        habit_id: String,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    },
    ProgressUpdated {
        habit_id: String,
        date: NaiveDate,
        direction: Direction,
        completions: u32,
        steps_completed: u32,
        money_earned: f64,
        completed: bool,
        at: DateTime<Utc>,
    },
    SkipChanged {
        habit_id: String,
        date: NaiveDate,
        skipped: bool,
        at: DateTime<Utc>,
    },
    MoodSet {
        date: NaiveDate,
        mood: i8,
        at: DateTime<Utc>,
    },
    DayRolledOver {
        from: NaiveDate,
        to: NaiveDate,
        at: DateTime<Utc>,
    },
    HabitDeleted {
        habit_id: String,
        at: DateTime<Utc>,
    },
}
