//! Habit timer engine.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `sample()`
//! periodically, and every call receives `now` explicitly.
//!
//! ## State Transitions
//!
//! ```text
//! Stopped -> Running -> Stopped
//! ```
//!
//! A habit is running exactly when it has an [`ActiveTimer`] entry. Elapsed
//! time is always derived from absolute timestamps:
//!
//! ```text
//! elapsed = min(accumulated + (now - started_at), max_session)
//! ```
//!
//! so the result does not depend on how many ticks were actually delivered.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new(7200);
//! engine.start("read", 0, now);
//! // In a loop:
//! for sample in engine.sample(now) { /* write sample.elapsed_secs */ }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default hard ceiling of one session: two hours.
pub const MAX_SESSION_SECONDS: u64 = 2 * 60 * 60;

/// A running timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActiveTimer {
    /// When this run started (epoch milliseconds).
    pub started_at: i64,
    /// Seconds banked before this run.
    #[serde(default)]
    pub accumulated_time: u64,
}

impl ActiveTimer {
    pub fn new(started_at: DateTime<Utc>, accumulated_time: u64) -> Self {
        Self {
            started_at: started_at.timestamp_millis(),
            accumulated_time,
        }
    }

    /// Derived elapsed seconds at `now`, capped at `max_session_secs`.
    pub fn elapsed_at(&self, now: DateTime<Utc>, max_session_secs: u64) -> u64 {
        let run_ms = now.timestamp_millis().saturating_sub(self.started_at).max(0);
        let run_secs = (run_ms / 1000) as u64;
        self.accumulated_time
            .saturating_add(run_secs)
            .min(max_session_secs)
    }
}

/// Persisted form of the running timers: habit id to entry.
pub type TimerSnapshot = BTreeMap<String, ActiveTimer>;

/// The derived elapsed time of one timer at one instant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimerSample {
    pub habit_id: String,
    pub elapsed_secs: u64,
    /// The timer hit the session ceiling and was removed.
    pub auto_stopped: bool,
}

/// Core timer engine.
///
/// Owns the set of running timers. Operates on wall-clock deltas -- no
/// internal thread.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimerEngine {
    timers: TimerSnapshot,
    max_session_secs: u64,
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new(MAX_SESSION_SECONDS)
    }
}

impl TimerEngine {
    /// Create an engine with no running timers.
    pub fn new(max_session_secs: u64) -> Self {
        Self {
            timers: TimerSnapshot::new(),
            max_session_secs,
        }
    }

    /// Rebuild the running set from a persisted snapshot.
    ///
    /// Entries whose elapsed time already reached the ceiling at `now` are
    /// not resumed; they come back as auto-stopped samples holding exactly
    /// the ceiling. Survivors are returned as running samples so the caller
    /// can sync them immediately.
    pub fn resume(
        snapshot: TimerSnapshot,
        now: DateTime<Utc>,
        max_session_secs: u64,
    ) -> (Self, Vec<TimerSample>) {
        let mut engine = Self::new(max_session_secs);
        engine.timers = snapshot;
        let samples = engine.sample(now);
        (engine, samples)
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn max_session_secs(&self) -> u64 {
        self.max_session_secs
    }

    pub fn is_running(&self, habit_id: &str) -> bool {
        self.timers.contains_key(habit_id)
    }

    pub fn has_running(&self) -> bool {
        !self.timers.is_empty()
    }

    pub fn running_ids(&self) -> impl Iterator<Item = &str> {
        self.timers.keys().map(String::as_str)
    }

    pub fn get(&self, habit_id: &str) -> Option<&ActiveTimer> {
        self.timers.get(habit_id)
    }

    /// Derived elapsed seconds of a running timer.
    pub fn elapsed(&self, habit_id: &str, now: DateTime<Utc>) -> Option<u64> {
        self.timers
            .get(habit_id)
            .map(|t| t.elapsed_at(now, self.max_session_secs))
    }

    /// The state to persist.
    pub fn snapshot(&self) -> &TimerSnapshot {
        &self.timers
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Start a timer seeded with the seconds already tracked today.
    /// Returns false if it was already running.
    pub fn start(&mut self, habit_id: &str, accumulated_secs: u64, now: DateTime<Utc>) -> bool {
        if self.is_running(habit_id) {
            return false;
        }
        self.timers.insert(
            habit_id.to_string(),
            ActiveTimer::new(now, accumulated_secs.min(self.max_session_secs)),
        );
        true
    }

    /// Stop a timer, returning its final elapsed seconds.
    pub fn stop(&mut self, habit_id: &str, now: DateTime<Utc>) -> Option<u64> {
        let timer = self.timers.remove(habit_id)?;
        Some(timer.elapsed_at(now, self.max_session_secs))
    }

    /// Restart a running timer at `now` with `accumulated_secs` banked, so
    /// time credited outside the timer survives the next sample.
    /// Returns false if it was not running.
    pub fn rebase(&mut self, habit_id: &str, accumulated_secs: u64, now: DateTime<Utc>) -> bool {
        let max = self.max_session_secs;
        match self.timers.get_mut(habit_id) {
            Some(timer) => {
                *timer = ActiveTimer::new(now, accumulated_secs.min(max));
                true
            }
            None => false,
        }
    }

    /// Recompute every running timer at `now`. Timers at the ceiling are
    /// removed and reported as auto-stopped.
    pub fn sample(&mut self, now: DateTime<Utc>) -> Vec<TimerSample> {
        let max = self.max_session_secs;
        let samples: Vec<TimerSample> = self
            .timers
            .iter()
            .map(|(id, timer)| {
                let elapsed_secs = timer.elapsed_at(now, max);
                TimerSample {
                    habit_id: id.clone(),
                    elapsed_secs,
                    auto_stopped: elapsed_secs >= max,
                }
            })
            .collect();
        for sample in samples.iter().filter(|s| s.auto_stopped) {
            self.timers.remove(&sample.habit_id);
        }
        samples
    }

    /// Stop every timer, returning the final samples.
    pub fn drain(&mut self, now: DateTime<Utc>) -> Vec<TimerSample> {
        let max = self.max_session_secs;
        std::mem::take(&mut self.timers)
            .into_iter()
            .map(|(habit_id, timer)| {
                let elapsed_secs = timer.elapsed_at(now, max);
                TimerSample {
                    habit_id,
                    elapsed_secs,
                    auto_stopped: elapsed_secs >= max,
                }
            })
            .collect()
    }
}
