//! # Habitloom Core Library
//!
//! This library provides the core logic for Habitloom, a personal habit
//! tracker. All state lives on the device; the `habitloom` CLI is a thin
//! layer over the same core.
//!
//! ## Architecture
//!
//! - **Dates**: timezone-aware "today", week and month grids
//! - **Progress Store**: per-day logs of habit progress and mood
//! - **Timer Engine**: a wall-clock-based set of habit timers that requires
//!   the caller to periodically invoke `tick()`
//! - **Accounting**: the cycle-aware reward policy behind increment/decrement
//! - **Rollover**: detection of calendar day changes
//! - **Storage**: key-value persistence (SQLite or in-memory) and TOML
//!   configuration
//!
//! ## Key Components
//!
//! - [`HabitTracker`]: the operations presentation code calls
//! - [`TimerEngine`]: running timers and their derived elapsed time
//! - [`ProgressStore`]: daily logs
//! - [`Config`]: application configuration management

pub mod accounting;
pub mod dates;
pub mod error;
pub mod events;
pub mod habit;
pub mod progress;
pub mod rollover;
pub mod stats;
pub mod storage;
pub mod timer;
pub mod tracker;

pub use accounting::Direction;
pub use dates::{WeekStart, Zone};
pub use error::{ConfigError, CoreError, Result, StorageError, ValidationError};
pub use events::{Event, StopReason};
pub use habit::{Catalog, Category, Habit, HabitLookup, RewardUnit, StepMode};
pub use progress::{DailyLog, DailyProgress, ProgressPatch, ProgressStore};
pub use rollover::{DayChange, DayRollover};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use timer::{ActiveTimer, TimerEngine, TimerSnapshot, MAX_SESSION_SECONDS};
pub use tracker::HabitTracker;
