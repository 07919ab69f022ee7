//! Property tests for the reward policy and timer arithmetic.

use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;

use habitloom_core::accounting::{next_progress, steps_per_cycle};
use habitloom_core::{ActiveTimer, DailyProgress, Direction, Habit, MAX_SESSION_SECONDS};

fn apply_or_keep(habit: &Habit, progress: &DailyProgress, direction: Direction) -> DailyProgress {
    next_progress(habit, progress, direction).unwrap_or_else(|| progress.clone())
}

proptest! {
    #[test]
    fn increment_then_decrement_round_trips(
        reward in 1u32..50,
        minutes in proptest::option::of(0u32..240),
        completions in 0u32..1000,
        elapsed in 0u64..100_000,
    ) {
        let mut habit = Habit::new("Count").with_reward(reward);
        habit.one_time_value = minutes;
        let start = DailyProgress {
            completions,
            elapsed_time: elapsed,
            completed: completions > 0,
            ..Default::default()
        };

        let up = apply_or_keep(&habit, &start, Direction::Increment);
        let back = apply_or_keep(&habit, &up, Direction::Decrement);
        prop_assert_eq!(back.completions, start.completions);
        prop_assert_eq!(back.completed, start.completed);
        prop_assert_eq!(back.elapsed_time, start.elapsed_time);
    }

    #[test]
    fn completions_are_whole_cycles(
        step in 1u32..20,
        cycles_in_goal in 1u32..10,
        reward in 1u32..5,
        n in 0u32..200,
    ) {
        let habit = Habit::new("Steps")
            .with_goal((step * cycles_in_goal) as f64)
            .with_steps(step as f64)
            .with_reward(reward);
        let k = steps_per_cycle(&habit);
        prop_assert_eq!(k, cycles_in_goal);

        let mut progress = DailyProgress::default();
        let mut reached = false;
        for i in 1..=n {
            progress = apply_or_keep(&habit, &progress, Direction::Increment);
            prop_assert_eq!(progress.completions, (i / k) * reward);
            if reached {
                // Once completed, further increments never clear it.
                prop_assert!(progress.completed);
            }
            reached |= progress.completed;
        }
        prop_assert_eq!(progress.steps_completed, n);
        prop_assert_eq!(progress.completed, n >= k);
    }

    #[test]
    fn multi_step_increment_decrement_is_inverse(
        step in 1u32..10,
        cycles_in_goal in 1u32..6,
        reward in 1u32..5,
        n in 0u32..50,
    ) {
        let habit = Habit::new("Steps")
            .with_goal((step * cycles_in_goal) as f64)
            .with_steps(step as f64)
            .with_reward(reward);
        let mut progress = DailyProgress::default();
        for _ in 0..n {
            progress = apply_or_keep(&habit, &progress, Direction::Increment);
        }
        let up = apply_or_keep(&habit, &progress, Direction::Increment);
        let back = apply_or_keep(&habit, &up, Direction::Decrement);
        prop_assert_eq!(back, progress);
    }

    #[test]
    fn derived_elapsed_matches_formula(
        accumulated in 0u64..10_000,
        run_secs in 0i64..20_000,
        extra_ms in 0i64..1000,
    ) {
        let started = Utc.with_ymd_and_hms(2024, 1, 1, 6, 0, 0).unwrap();
        let timer = ActiveTimer::new(started, accumulated);
        let now = started + Duration::seconds(run_secs) + Duration::milliseconds(extra_ms);
        let expected = (accumulated + run_secs as u64).min(MAX_SESSION_SECONDS);
        prop_assert_eq!(timer.elapsed_at(now, MAX_SESSION_SECONDS), expected);
    }
}
