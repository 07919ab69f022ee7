//! Aggregated statistics over daily logs.
//!
//! Read-only views for dashboards: one summary per day, totals over a
//! window of days, and per-habit completion streaks.

use chrono::{Duration, NaiveDate};
use serde::Serialize;

use crate::habit::Habit;
use crate::progress::{DailyLog, ProgressStore};

/// What happened on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub mood: i8,
    pub habits_completed: usize,
    pub habits_skipped: usize,
    /// Fragments banked across all habits.
    pub fragments: u64,
    pub money_earned: f64,
    pub tracked_minutes: u64,
    pub daily_minimum_total: usize,
    pub daily_minimum_done: usize,
}

impl DaySummary {
    /// Every daily-minimum habit was completed or skipped.
    pub fn daily_minimum_met(&self) -> bool {
        self.daily_minimum_done >= self.daily_minimum_total
    }
}

/// Summarize `log` against the current habit list.
///
/// Progress recorded for habits that no longer exist still counts toward
/// fragments, money and minutes.
pub fn day_summary(habits: &[Habit], date: NaiveDate, log: &DailyLog) -> DaySummary {
    let mut summary = DaySummary {
        date,
        mood: log.mood,
        habits_completed: 0,
        habits_skipped: 0,
        fragments: 0,
        money_earned: 0.0,
        tracked_minutes: 0,
        daily_minimum_total: 0,
        daily_minimum_done: 0,
    };

    let mut tracked_secs = 0u64;
    for progress in log.habits.values() {
        summary.fragments += progress.completions as u64;
        summary.money_earned += progress.money_earned;
        tracked_secs += progress.elapsed_time;
        if progress.completed {
            summary.habits_completed += 1;
        }
        if progress.skipped {
            summary.habits_skipped += 1;
        }
    }
    summary.tracked_minutes = tracked_secs / 60;
    summary.money_earned = (summary.money_earned * 100.0).round() / 100.0;

    for habit in habits.iter().filter(|h| h.daily_minimum) {
        summary.daily_minimum_total += 1;
        let progress = log.progress(&habit.id);
        if progress.completed || progress.skipped {
            summary.daily_minimum_done += 1;
        }
    }
    summary
}

/// One summary per date, in the order given.
pub fn summarize(habits: &[Habit], store: &ProgressStore, dates: &[NaiveDate]) -> Vec<DaySummary> {
    dates
        .iter()
        .map(|&date| day_summary(habits, date, &store.get_log(date)))
        .collect()
}

/// Totals over a window of days.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeriodTotals {
    pub days: usize,
    pub days_with_minimum_met: usize,
    pub fragments: u64,
    pub money_earned: f64,
    pub tracked_minutes: u64,
    /// Mean mood over days that have a log entry with a mood set.
    pub average_mood: Option<f64>,
}

pub fn totals(summaries: &[DaySummary]) -> PeriodTotals {
    let moods: Vec<i8> = summaries
        .iter()
        .map(|s| s.mood)
        .filter(|&m| m != 0)
        .collect();
    let average_mood = if moods.is_empty() {
        None
    } else {
        Some(moods.iter().map(|&m| m as f64).sum::<f64>() / moods.len() as f64)
    };

    PeriodTotals {
        days: summaries.len(),
        days_with_minimum_met: summaries.iter().filter(|s| s.daily_minimum_met()).count(),
        fragments: summaries.iter().map(|s| s.fragments).sum(),
        money_earned: (summaries.iter().map(|s| s.money_earned).sum::<f64>() * 100.0).round()
            / 100.0,
        tracked_minutes: summaries.iter().map(|s| s.tracked_minutes).sum(),
        average_mood,
    }
}

/// Consecutive completed days for a habit, counting back from `today`.
///
/// An unfinished today does not break the streak (it starts counting from
/// yesterday), and skipped days are passed over without counting.
pub fn streak(store: &ProgressStore, habit_id: &str, today: NaiveDate) -> u32 {
    let mut count = 0;
    let mut date = today;
    if !store.progress(today, habit_id).completed {
        date = today - Duration::days(1);
    }
    loop {
        let progress = store.progress(date, habit_id);
        if progress.completed {
            count += 1;
        } else if !progress.skipped {
            break;
        }
        match date.pred_opt() {
            Some(prev) => date = prev,
            None => break,
        }
        if store.logs().range(..=date).next().is_none() {
            break;
        }
    }
    count
}
