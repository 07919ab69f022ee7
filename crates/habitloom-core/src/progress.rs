//! Per-day progress records.
//!
//! A [`DailyLog`] exists per calendar date and maps habit ids to their
//! [`DailyProgress`]. Logs are created lazily on the first write for a date
//! and every write is a field-wise merge of a [`ProgressPatch`]. The whole
//! collection is persisted after each write.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::storage::{load_json, save_json, KvStore};

pub const PROGRESS_KEY: &str = "progress_logs";

pub const MOOD_MIN: i8 = -3;
pub const MOOD_MAX: i8 = 3;

/// One habit's progress on one date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyProgress {
    /// Fragments banked for count and time habits.
    pub completions: u32,
    /// Steps taken in multi-step mode.
    pub steps_completed: u32,
    /// Currency units, kept at cent precision.
    pub money_earned: f64,
    /// Seconds tracked by the timer or credited by actions.
    pub elapsed_time: u64,
    pub completed: bool,
    pub skipped: bool,
}

/// A partial update of a [`DailyProgress`]; `None` fields are left alone.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProgressPatch {
    pub completions: Option<u32>,
    pub steps_completed: Option<u32>,
    pub money_earned: Option<f64>,
    pub elapsed_time: Option<u64>,
    pub completed: Option<bool>,
    pub skipped: Option<bool>,
}

impl ProgressPatch {
    /// The fields that differ between `before` and `after`.
    pub fn diff(before: &DailyProgress, after: &DailyProgress) -> Self {
        fn changed<T: PartialEq + Copy>(a: T, b: T) -> Option<T> {
            (a != b).then_some(b)
        }
        Self {
            completions: changed(before.completions, after.completions),
            steps_completed: changed(before.steps_completed, after.steps_completed),
            money_earned: changed(before.money_earned, after.money_earned),
            elapsed_time: changed(before.elapsed_time, after.elapsed_time),
            completed: changed(before.completed, after.completed),
            skipped: changed(before.skipped, after.skipped),
        }
    }

    pub fn elapsed(seconds: u64) -> Self {
        Self {
            elapsed_time: Some(seconds),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Merge into `progress`, clamping numeric fields at zero.
    pub fn apply_to(&self, progress: &mut DailyProgress) {
        if let Some(v) = self.completions {
            progress.completions = v;
        }
        if let Some(v) = self.steps_completed {
            progress.steps_completed = v;
        }
        if let Some(v) = self.money_earned {
            progress.money_earned = v.max(0.0);
        }
        if let Some(v) = self.elapsed_time {
            progress.elapsed_time = v;
        }
        if let Some(v) = self.completed {
            progress.completed = v;
        }
        if let Some(v) = self.skipped {
            progress.skipped = v;
        }
    }
}

/// Everything recorded for one calendar date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DailyLog {
    /// Mood in `[-3, 3]`.
    pub mood: i8,
    pub habits: BTreeMap<String, DailyProgress>,
}

impl DailyLog {
    pub fn progress(&self, habit_id: &str) -> DailyProgress {
        self.habits.get(habit_id).cloned().unwrap_or_default()
    }
}

/// The date-keyed collection of [`DailyLog`]s.
pub struct ProgressStore {
    kv: Rc<dyn KvStore>,
    logs: BTreeMap<NaiveDate, DailyLog>,
}

impl ProgressStore {
    /// Load the collection; a missing or corrupt value starts empty.
    pub fn load(kv: Rc<dyn KvStore>) -> Self {
        let logs = load_json(kv.as_ref(), PROGRESS_KEY).unwrap_or_default();
        Self { kv, logs }
    }

    /// The log for `date`, or an empty placeholder that is not stored.
    pub fn get_log(&self, date: NaiveDate) -> DailyLog {
        self.logs.get(&date).cloned().unwrap_or_default()
    }

    pub fn progress(&self, date: NaiveDate, habit_id: &str) -> DailyProgress {
        self.logs
            .get(&date)
            .map(|log| log.progress(habit_id))
            .unwrap_or_default()
    }

    pub fn logs(&self) -> &BTreeMap<NaiveDate, DailyLog> {
        &self.logs
    }

    /// Merge `patch` into the habit's progress for `date` and persist.
    pub fn merge_progress(
        &mut self,
        date: NaiveDate,
        habit_id: &str,
        patch: &ProgressPatch,
    ) -> DailyProgress {
        let merged = self.merge_in_memory(date, habit_id, patch);
        self.persist();
        merged
    }

    /// Merge several patches for one date with a single write.
    pub fn merge_batch<'a, I>(&mut self, date: NaiveDate, patches: I)
    where
        I: IntoIterator<Item = (&'a str, &'a ProgressPatch)>,
    {
        let mut touched = false;
        for (habit_id, patch) in patches {
            self.merge_in_memory(date, habit_id, patch);
            touched = true;
        }
        if touched {
            self.persist();
        }
    }

    /// Set the mood for `date`, clamped to `[-3, 3]`.
    pub fn set_mood(&mut self, date: NaiveDate, mood: i8) -> i8 {
        let mood = mood.clamp(MOOD_MIN, MOOD_MAX);
        self.logs.entry(date).or_default().mood = mood;
        self.persist();
        mood
    }

    fn merge_in_memory(
        &mut self,
        date: NaiveDate,
        habit_id: &str,
        patch: &ProgressPatch,
    ) -> DailyProgress {
        let progress = self
            .logs
            .entry(date)
            .or_default()
            .habits
            .entry(habit_id.to_string())
            .or_default();
        patch.apply_to(progress);
        progress.clone()
    }

    fn persist(&self) {
        save_json(self.kv.as_ref(), PROGRESS_KEY, &self.logs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 4, d).unwrap()
    }

    #[test]
    fn get_log_does_not_create_placeholder() {
        let kv = Rc::new(MemoryStore::new());
        let store = ProgressStore::load(kv.clone());
        let log = store.get_log(day(1));
        assert_eq!(log.mood, 0);
        assert!(log.habits.is_empty());
        assert!(store.logs().is_empty());
        assert!(kv.raw(PROGRESS_KEY).is_none());
    }

    #[test]
    fn merge_is_field_wise() {
        let kv = Rc::new(MemoryStore::new());
        let mut store = ProgressStore::load(kv);
        store.merge_progress(
            day(1),
            "read",
            &ProgressPatch {
                completions: Some(2),
                completed: Some(true),
                ..Default::default()
            },
        );
        let merged = store.merge_progress(day(1), "read", &ProgressPatch::elapsed(90));
        assert_eq!(merged.completions, 2);
        assert!(merged.completed);
        assert_eq!(merged.elapsed_time, 90);

        // Other dates are untouched.
        assert_eq!(store.progress(day(2), "read"), DailyProgress::default());
    }

    #[test]
    fn mood_is_clamped_and_persisted() {
        let kv = Rc::new(MemoryStore::new());
        let mut store = ProgressStore::load(kv.clone());
        assert_eq!(store.set_mood(day(3), 7), 3);
        assert_eq!(store.set_mood(day(4), -9), -3);

        let reloaded = ProgressStore::load(kv);
        assert_eq!(reloaded.get_log(day(3)).mood, 3);
        assert_eq!(reloaded.get_log(day(4)).mood, -3);
    }

    #[test]
    fn batch_merge_writes_all_habits() {
        let kv = Rc::new(MemoryStore::new());
        let mut store = ProgressStore::load(kv.clone());
        let a = ProgressPatch::elapsed(10);
        let b = ProgressPatch::elapsed(20);
        store.merge_batch(day(5), [("a", &a), ("b", &b)]);

        let reloaded = ProgressStore::load(kv);
        assert_eq!(reloaded.progress(day(5), "a").elapsed_time, 10);
        assert_eq!(reloaded.progress(day(5), "b").elapsed_time, 20);
    }

    #[test]
    fn persisted_shape_uses_date_keys_and_camel_case() {
        let kv = Rc::new(MemoryStore::new());
        let mut store = ProgressStore::load(kv.clone());
        store.merge_progress(
            day(6),
            "walk",
            &ProgressPatch {
                steps_completed: Some(1),
                ..Default::default()
            },
        );
        let raw: serde_json::Value = serde_json::from_str(&kv.raw(PROGRESS_KEY).unwrap()).unwrap();
        assert_eq!(raw["2024-04-06"]["habits"]["walk"]["stepsCompleted"], 1);
        assert_eq!(raw["2024-04-06"]["mood"], 0);
    }

    #[test]
    fn older_shapes_load_with_defaults() {
        let kv = Rc::new(MemoryStore::new());
        kv.insert_raw(
            PROGRESS_KEY,
            r#"{"2024-04-07":{"habits":{"walk":{"completions":3}}}}"#,
        );
        let store = ProgressStore::load(kv);
        let p = store.progress(day(7), "walk");
        assert_eq!(p.completions, 3);
        assert_eq!(p.elapsed_time, 0);
        assert!(!p.skipped);
    }

    #[test]
    fn diff_reports_only_changes() {
        let before = DailyProgress::default();
        let after = DailyProgress {
            completions: 1,
            completed: true,
            ..Default::default()
        };
        let patch = ProgressPatch::diff(&before, &after);
        assert_eq!(patch.completions, Some(1));
        assert_eq!(patch.completed, Some(true));
        assert_eq!(patch.elapsed_time, None);
        assert!(ProgressPatch::diff(&after, &after).is_empty());
    }
}
