//! The tracking surface presentation code calls.
//!
//! [`HabitTracker`] ties the timer engine, the completion accounting and the
//! progress store to one "current day" pointer. Every operation takes the
//! current instant explicitly and first checks for a day rollover, so all
//! writes land on the right calendar date.
//!
//! None of the tracking operations fail: persistence problems are logged
//! and the in-memory state keeps working; impossible actions are no-ops.
//!
//! ```ignore
//! let (mut tracker, _) = HabitTracker::open(kv, &config, Utc::now());
//! tracker.toggle("read", Utc::now());
//! // every second while timers run:
//! tracker.tick(Utc::now());
//! // every minute:
//! tracker.check_day(Utc::now());
//! ```

use chrono::{DateTime, NaiveDate, Utc};
use std::rc::Rc;

use crate::accounting::{self, Direction};
use crate::dates::{self, date_key, parse_date_key, Zone};
use crate::error::ValidationError;
use crate::events::{Event, StopReason};
use crate::habit::{Catalog, Habit, HabitLookup};
use crate::progress::{DailyLog, DailyProgress, ProgressPatch, ProgressStore};
use crate::rollover::{DayRollover, LAST_TODAY_KEY};
use crate::storage::{load_json, save_json, Config, KvStore};
use crate::timer::{TimerEngine, TimerSample, TimerSnapshot};

pub const TIMERS_KEY: &str = "active_timers";

pub struct HabitTracker {
    kv: Rc<dyn KvStore>,
    catalog: Catalog,
    progress: ProgressStore,
    timers: TimerEngine,
    rollover: DayRollover,
    zone: Zone,
}

impl HabitTracker {
    /// Load all state from `kv`, resume persisted timers and catch up with
    /// any day change that happened while the app was closed.
    pub fn open(kv: Rc<dyn KvStore>, config: &Config, now: DateTime<Utc>) -> (Self, Vec<Event>) {
        let zone = config.zone().zone;
        let today = dates::today(now, zone);
        let last_known = load_json::<String>(kv.as_ref(), LAST_TODAY_KEY)
            .and_then(|key| parse_date_key(&key))
            .unwrap_or(today);
        let snapshot: TimerSnapshot = load_json(kv.as_ref(), TIMERS_KEY).unwrap_or_default();

        let mut tracker = Self {
            catalog: Catalog::load(kv.clone()),
            progress: ProgressStore::load(kv.clone()),
            timers: TimerEngine::new(config.timer.max_session_secs()),
            rollover: DayRollover::new(last_known),
            zone,
            kv,
        };

        let mut events = tracker.resume(snapshot, now);
        events.extend(tracker.check_day(now));
        tracker.persist_day();
        (tracker, events)
    }

    // ── Queries ──────────────────────────────────────────────────────

    /// The date progress is currently written to.
    pub fn today(&self) -> NaiveDate {
        self.rollover.current()
    }

    pub fn zone(&self) -> Zone {
        self.zone
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Habit forms edit the catalog directly. Deleting goes through
    /// [`HabitTracker::delete_habit`] so running timers are finalized.
    pub fn catalog_mut(&mut self) -> &mut Catalog {
        &mut self.catalog
    }

    pub fn progress_store(&self) -> &ProgressStore {
        &self.progress
    }

    pub fn timers(&self) -> &TimerEngine {
        &self.timers
    }

    pub fn log(&self, date: NaiveDate) -> DailyLog {
        self.progress.get_log(date)
    }

    pub fn is_running(&self, habit_id: &str) -> bool {
        self.timers.is_running(habit_id)
    }

    /// Live elapsed seconds of a running timer, without writing anything.
    pub fn elapsed(&self, habit_id: &str, now: DateTime<Utc>) -> Option<u64> {
        self.timers.elapsed(habit_id, self.bounded(now))
    }

    /// Today's progress for a habit with a running timer's live value folded in.
    pub fn today_progress(&self, habit_id: &str, now: DateTime<Utc>) -> DailyProgress {
        let mut progress = self.progress.progress(self.today(), habit_id);
        if let Some(elapsed) = self.elapsed(habit_id, now) {
            progress.elapsed_time = elapsed;
        }
        progress
    }

    // ── Timer operations ─────────────────────────────────────────────

    /// Start the habit's timer, or stop it and record the elapsed time.
    ///
    /// A running timer can always be stopped; only starting needs the
    /// habit to exist.
    pub fn toggle(&mut self, habit_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.check_day(now);
        let date = self.today();

        if let Some(elapsed_secs) = self.timers.stop(habit_id, now) {
            log::info!("timer stopped for '{habit_id}' at {elapsed_secs}s");
            self.write_samples(
                date,
                &[TimerSample {
                    habit_id: habit_id.to_string(),
                    elapsed_secs,
                    auto_stopped: false,
                }],
            );
            events.push(Event::TimerStopped {
                habit_id: habit_id.to_string(),
                date,
                elapsed_secs,
                reason: StopReason::Manual,
                at: now,
            });
        } else if self.catalog.get_habit(habit_id).is_some() {
            let accumulated_secs = self.progress.progress(date, habit_id).elapsed_time;
            self.timers.start(habit_id, accumulated_secs, now);
            log::info!("timer started for '{habit_id}' with {accumulated_secs}s banked");
            events.push(Event::TimerStarted {
                habit_id: habit_id.to_string(),
                accumulated_secs,
                at: now,
            });
        } else {
            log::debug!("toggle ignored: unknown habit '{habit_id}'");
            return events;
        }

        self.persist_timers();
        events
    }

    /// Recompute every running timer, auto-stop those at the ceiling and
    /// write all elapsed values with one store write.
    pub fn tick(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.check_day(now);
        if !self.timers.has_running() {
            return events;
        }
        let date = self.today();
        let samples = self.timers.sample(now);
        self.write_samples(date, &samples);

        let mut stopped_any = false;
        for sample in samples.iter().filter(|s| s.auto_stopped) {
            log::info!(
                "timer for '{}' reached the {}s ceiling",
                sample.habit_id,
                sample.elapsed_secs
            );
            stopped_any = true;
            events.push(Event::TimerStopped {
                habit_id: sample.habit_id.clone(),
                date,
                elapsed_secs: sample.elapsed_secs,
                reason: StopReason::AutoStop,
                at: now,
            });
        }
        if stopped_any {
            self.persist_timers();
        }
        events
    }

    /// The app came back to the foreground: catch up with wall-clock time.
    pub fn on_visible(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        self.tick(now)
    }

    /// Replace the running set with a persisted snapshot.
    ///
    /// Entries that overflowed the ceiling while the app was closed are
    /// recorded at exactly the ceiling and dropped; the rest keep running
    /// and are synced into the current day right away. Entries whose habit
    /// no longer exists are recorded and stopped.
    pub fn resume(&mut self, snapshot: TimerSnapshot, now: DateTime<Utc>) -> Vec<Event> {
        let at = self.bounded(now);
        let date = self.today();
        let (engine, samples) = TimerEngine::resume(snapshot, at, self.timers.max_session_secs());
        self.timers = engine;
        self.write_samples(date, &samples);

        let mut events = Vec::with_capacity(samples.len());
        for sample in samples {
            let reason = if sample.auto_stopped {
                log::info!("timer for '{}' expired while closed", sample.habit_id);
                StopReason::ExpiredOffline
            } else if self.catalog.get_habit(&sample.habit_id).is_none() {
                log::warn!("dropping timer for deleted habit '{}'", sample.habit_id);
                self.timers.stop(&sample.habit_id, at);
                StopReason::HabitDeleted
            } else {
                events.push(Event::TimerResumed {
                    habit_id: sample.habit_id,
                    elapsed_secs: sample.elapsed_secs,
                    at: now,
                });
                continue;
            };
            events.push(Event::TimerStopped {
                habit_id: sample.habit_id,
                date,
                elapsed_secs: sample.elapsed_secs,
                reason,
                at: now,
            });
        }
        self.persist_timers();
        events
    }

    // ── Day rollover ─────────────────────────────────────────────────

    /// Detect a calendar day change. Running timers are finalized into the
    /// outgoing day, sampled no later than its local end, and cleared
    /// before the pointer advances.
    pub fn check_day(&mut self, now: DateTime<Utc>) -> Vec<Event> {
        let today = dates::today(now, self.zone);
        let Some(change) = self.rollover.detect(today) else {
            return Vec::new();
        };

        let at = self.bounded(now);
        let samples = self.timers.drain(at);
        self.write_samples(change.from, &samples);

        let mut events: Vec<Event> = samples
            .into_iter()
            .map(|sample| Event::TimerStopped {
                habit_id: sample.habit_id,
                date: change.from,
                elapsed_secs: sample.elapsed_secs,
                reason: StopReason::Rollover,
                at: now,
            })
            .collect();
        if !events.is_empty() {
            self.persist_timers();
        }

        self.rollover.advance(change);
        self.persist_day();
        log::info!("day rolled over from {} to {}", change.from, change.to);
        events.push(Event::DayRolledOver {
            from: change.from,
            to: change.to,
            at: now,
        });
        events
    }

    /// Switch the timezone days are computed in.
    pub fn set_zone(&mut self, zone: Zone, now: DateTime<Utc>) -> Vec<Event> {
        self.zone = zone;
        self.check_day(now)
    }

    // ── Completion accounting ────────────────────────────────────────

    pub fn increment(&mut self, habit_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        self.account(habit_id, Direction::Increment, now)
    }

    /// Undo one increment. A no-op when there is nothing to undo.
    pub fn decrement(&mut self, habit_id: &str, now: DateTime<Utc>) -> Vec<Event> {
        self.account(habit_id, Direction::Decrement, now)
    }

    fn account(&mut self, habit_id: &str, direction: Direction, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.check_day(now);
        let at = self.bounded(now);
        let Some(habit) = self.catalog.get_habit(habit_id) else {
            log::debug!("{direction:?} ignored: unknown habit '{habit_id}'");
            return events;
        };
        let date = self.rollover.current();
        let mut current = self.progress.progress(date, habit_id);
        let live = self.timers.elapsed(habit_id, at);
        if let Some(elapsed) = live {
            current.elapsed_time = elapsed;
        }

        let Some(next) = accounting::next_progress(habit, &current, direction) else {
            log::debug!("{direction:?} of '{habit_id}' changed nothing");
            return events;
        };
        let patch = ProgressPatch::diff(&current, &next);
        let merged = self.progress.merge_progress(date, habit_id, &patch);
        events.push(Event::ProgressUpdated {
            habit_id: habit_id.to_string(),
            date,
            direction,
            completions: merged.completions,
            steps_completed: merged.steps_completed,
            money_earned: merged.money_earned,
            completed: merged.completed,
            at: now,
        });

        // A running timer carries the credited minutes forward.
        if live.is_some() && next.elapsed_time != current.elapsed_time {
            if next.elapsed_time >= self.timers.max_session_secs() {
                self.timers.stop(habit_id, at);
                log::info!("timer for '{habit_id}' passed the ceiling after {direction:?}");
                events.push(Event::TimerStopped {
                    habit_id: habit_id.to_string(),
                    date,
                    elapsed_secs: next.elapsed_time,
                    reason: StopReason::AutoStop,
                    at: now,
                });
            } else {
                self.timers.rebase(habit_id, next.elapsed_time, at);
            }
            self.persist_timers();
        }
        events
    }

    /// Mark a habit as deliberately not done today, or clear the mark.
    pub fn set_skipped(&mut self, habit_id: &str, skipped: bool, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.check_day(now);
        if self.catalog.get_habit(habit_id).is_none() {
            log::debug!("skip ignored: unknown habit '{habit_id}'");
            return events;
        }
        let date = self.today();
        let patch = ProgressPatch {
            skipped: Some(skipped),
            ..ProgressPatch::default()
        };
        self.progress.merge_progress(date, habit_id, &patch);
        events.push(Event::SkipChanged {
            habit_id: habit_id.to_string(),
            date,
            skipped,
            at: now,
        });
        events
    }

    /// Record today's mood, clamped to `[-3, 3]`.
    pub fn set_mood(&mut self, mood: i8, now: DateTime<Utc>) -> Vec<Event> {
        let mut events = self.check_day(now);
        let date = self.today();
        let mood = self.progress.set_mood(date, mood);
        events.push(Event::MoodSet {
            date,
            mood,
            at: now,
        });
        events
    }

    // ── Catalog cascade ──────────────────────────────────────────────

    /// Delete a habit. A running timer is finalized into today's log first.
    pub fn delete_habit(
        &mut self,
        habit_id: &str,
        now: DateTime<Utc>,
    ) -> Result<(Habit, Vec<Event>), ValidationError> {
        if self.catalog.get_habit(habit_id).is_none() {
            return Err(ValidationError::NotFound(habit_id.to_string()));
        }
        let mut events = self.check_day(now);
        let date = self.today();

        if let Some(elapsed_secs) = self.timers.stop(habit_id, now) {
            self.write_samples(
                date,
                &[TimerSample {
                    habit_id: habit_id.to_string(),
                    elapsed_secs,
                    auto_stopped: false,
                }],
            );
            self.persist_timers();
            events.push(Event::TimerStopped {
                habit_id: habit_id.to_string(),
                date,
                elapsed_secs,
                reason: StopReason::HabitDeleted,
                at: now,
            });
        }

        let habit = self.catalog.remove(habit_id)?;
        events.push(Event::HabitDeleted {
            habit_id: habit_id.to_string(),
            at: now,
        });
        Ok((habit, events))
    }

    // ── Internal ─────────────────────────────────────────────────────

    /// `now`, but never past the end of the current day.
    fn bounded(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        now.min(self.zone.day_end(self.rollover.current()))
    }

    /// Write timer samples into `date` with one store write, recomputing
    /// `completed` for habits whose completion depends on tracked time.
    fn write_samples(&mut self, date: NaiveDate, samples: &[TimerSample]) {
        if samples.is_empty() {
            return;
        }
        let patches: Vec<(String, ProgressPatch)> = samples
            .iter()
            .map(|sample| {
                let mut progress = self.progress.progress(date, &sample.habit_id);
                progress.elapsed_time = sample.elapsed_secs;
                let mut patch = ProgressPatch::elapsed(sample.elapsed_secs);
                if let Some(habit) = self.catalog.get_habit(&sample.habit_id) {
                    patch.completed = Some(accounting::is_completed(habit, &progress));
                }
                (sample.habit_id.clone(), patch)
            })
            .collect();
        self.progress
            .merge_batch(date, patches.iter().map(|(id, patch)| (id.as_str(), patch)));
    }

    fn persist_timers(&self) {
        save_json(self.kv.as_ref(), TIMERS_KEY, self.timers.snapshot());
    }

    fn persist_day(&self) {
        save_json(self.kv.as_ref(), LAST_TODAY_KEY, &date_key(self.today()));
    }
}
