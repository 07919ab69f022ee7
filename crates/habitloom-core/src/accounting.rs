//! Cycle-aware reward policy.
//!
//! Turns an increment or decrement of a habit into the new state of its
//! [`DailyProgress`]. Rewards are only granted for whole cycles:
//!
//! ```text
//! stepsPerCycle = floor(goal / stepValue)      (multi-step, both set)
//! completions   = floor(steps / stepsPerCycle) * rewardValue
//! ```
//!
//! A decrement is the algebraic inverse of an increment, so an increment
//! followed by a decrement restores the previous state. `completed` is never
//! assigned by the branches themselves; [`is_completed`] derives it after
//! every change.

use serde::{Deserialize, Serialize};

use crate::habit::{Habit, RewardUnit, StepMode};
use crate::progress::DailyProgress;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Increment,
    Decrement,
}

/// Steps making up one reward cycle; 0 when the habit is not fully configured.
pub fn steps_per_cycle(habit: &Habit) -> u32 {
    if habit.step_mode != StepMode::Multi {
        return 0;
    }
    match (habit.goal, habit.step_value) {
        (Some(goal), Some(step)) if goal > 0.0 && step > 0.0 => {
            (goal / step).floor().min(u32::MAX as f64) as u32
        }
        _ => 0,
    }
}

/// Minutes credited to `elapsedTime` by one single-step action.
///
/// A minutes habit's goal wins; otherwise the one-time value applies.
pub fn minutes_per_action(habit: &Habit) -> u64 {
    match habit.goal {
        Some(goal) if habit.reward_unit == RewardUnit::Minutes && goal > 0.0 => goal.round() as u64,
        _ => habit.one_time_value.unwrap_or(0) as u64,
    }
}

/// Currency credited by one money action: the step value, else the goal.
pub fn money_per_action(habit: &Habit) -> f64 {
    habit
        .step_value
        .or(habit.goal)
        .filter(|v| v.is_finite() && *v > 0.0)
        .map(round_cents)
        .unwrap_or(0.0)
}

/// Whether `progress` meets the habit's completion condition.
pub fn is_completed(habit: &Habit, progress: &DailyProgress) -> bool {
    match (habit.reward_unit, habit.step_mode) {
        (_, StepMode::Multi) => {
            let cycle = steps_per_cycle(habit);
            cycle > 0 && progress.steps_completed >= cycle
        }
        (RewardUnit::Money, StepMode::Single) => progress.money_earned > 0.0,
        (RewardUnit::Times, StepMode::Single) => progress.completions > 0,
        (RewardUnit::Minutes, StepMode::Single) => {
            let goal_secs = match habit.goal {
                Some(goal) if goal > 0.0 => (goal * 60.0).round() as u64,
                _ => 0,
            };
            progress.completions > 0 || (goal_secs > 0 && progress.elapsed_time >= goal_secs)
        }
    }
}

/// The progress after applying `direction` to `current`.
///
/// Returns `None` when the action is impossible (undoing with nothing to
/// undo) or changes nothing.
pub fn next_progress(
    habit: &Habit,
    current: &DailyProgress,
    direction: Direction,
) -> Option<DailyProgress> {
    let mut next = current.clone();
    let cycle = steps_per_cycle(habit);

    match (habit.reward_unit, habit.step_mode, direction) {
        (RewardUnit::Money, StepMode::Single, Direction::Increment) => {
            next.money_earned = round_cents(next.money_earned + money_per_action(habit));
        }
        (RewardUnit::Money, StepMode::Single, Direction::Decrement) => {
            next.money_earned = round_cents(next.money_earned - money_per_action(habit)).max(0.0);
        }
        (RewardUnit::Money, StepMode::Multi, Direction::Increment) => {
            next.steps_completed = next.steps_completed.saturating_add(1);
            next.money_earned = round_cents(next.money_earned + money_per_action(habit));
        }
        (RewardUnit::Money, StepMode::Multi, Direction::Decrement) => {
            next.steps_completed = next.steps_completed.saturating_sub(1);
            next.money_earned = round_cents(next.money_earned - money_per_action(habit)).max(0.0);
        }
        (_, StepMode::Single, Direction::Increment) => {
            next.completions = next.completions.saturating_add(habit.reward_value);
            next.elapsed_time = next
                .elapsed_time
                .saturating_add(minutes_per_action(habit) * 60);
        }
        (_, StepMode::Single, Direction::Decrement) => {
            if current.completions == 0 {
                return None;
            }
            next.completions = next.completions.saturating_sub(habit.reward_value);
            next.elapsed_time = next
                .elapsed_time
                .saturating_sub(minutes_per_action(habit) * 60);
        }
        (_, StepMode::Multi, Direction::Increment) => {
            next.steps_completed = next.steps_completed.saturating_add(1);
            next.completions = cycle_rewards(next.steps_completed, cycle, habit.reward_value);
        }
        (_, StepMode::Multi, Direction::Decrement) => {
            if current.steps_completed == 0 {
                return None;
            }
            next.steps_completed -= 1;
            next.completions = cycle_rewards(next.steps_completed, cycle, habit.reward_value);
        }
    }

    next.completed = is_completed(habit, &next);
    (next != *current).then_some(next)
}

fn cycle_rewards(steps: u32, cycle: u32, reward_value: u32) -> u32 {
    if cycle == 0 {
        return 0;
    }
    (steps / cycle).saturating_mul(reward_value)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn step(habit: &Habit, progress: &DailyProgress, direction: Direction) -> DailyProgress {
        next_progress(habit, progress, direction).unwrap_or_else(|| progress.clone())
    }

    #[test]
    fn cycle_size_from_goal_and_step() {
        let habit = Habit::new("Run").with_goal(100.0).with_steps(25.0);
        assert_eq!(steps_per_cycle(&habit), 4);
        let uneven = Habit::new("Run").with_goal(10.0).with_steps(3.0);
        assert_eq!(steps_per_cycle(&uneven), 3);
        let missing_goal = Habit::new("Run").with_steps(3.0);
        assert_eq!(steps_per_cycle(&missing_goal), 0);
        let single = Habit::new("Run").with_goal(10.0).with_step_value(3.0);
        assert_eq!(steps_per_cycle(&single), 0);
    }

    #[test]
    fn multi_step_example_scenario() {
        let habit = Habit::new("Pushups")
            .with_goal(100.0)
            .with_steps(25.0)
            .with_reward(2);
        let mut p = DailyProgress::default();
        for _ in 0..4 {
            p = step(&habit, &p, Direction::Increment);
        }
        assert_eq!((p.steps_completed, p.completions, p.completed), (4, 2, true));

        p = step(&habit, &p, Direction::Increment);
        assert_eq!((p.steps_completed, p.completions, p.completed), (5, 2, true));

        p = step(&habit, &p, Direction::Decrement);
        assert_eq!((p.steps_completed, p.completions, p.completed), (4, 2, true));

        p = step(&habit, &p, Direction::Decrement);
        assert_eq!((p.steps_completed, p.completions, p.completed), (3, 0, false));
    }

    #[test]
    fn unconfigured_multi_step_never_completes() {
        let habit = Habit::new("Vague").with_steps(5.0);
        let mut p = DailyProgress::default();
        for _ in 0..10 {
            p = step(&habit, &p, Direction::Increment);
        }
        assert_eq!(p.steps_completed, 10);
        assert_eq!(p.completions, 0);
        assert!(!p.completed);
    }

    #[test]
    fn single_count_credits_minutes() {
        let habit = Habit::new("Stretch")
            .with_reward(3)
            .with_one_time_minutes(10);
        let p = step(&habit, &DailyProgress::default(), Direction::Increment);
        assert_eq!(p.completions, 3);
        assert_eq!(p.elapsed_time, 600);
        assert!(p.completed);

        let back = step(&habit, &p, Direction::Decrement);
        assert_eq!(back, DailyProgress::default());
    }

    #[test]
    fn minutes_goal_takes_precedence_over_one_time_value() {
        let habit = Habit::new("Read")
            .with_unit(RewardUnit::Minutes)
            .with_goal(30.0)
            .with_one_time_minutes(5);
        assert_eq!(minutes_per_action(&habit), 30);
        let count = Habit::new("Water").with_goal(8.0).with_one_time_minutes(1);
        assert_eq!(minutes_per_action(&count), 1);
    }

    #[test]
    fn decrement_without_completions_is_noop() {
        let habit = Habit::new("Floss");
        assert_eq!(
            next_progress(&habit, &DailyProgress::default(), Direction::Decrement),
            None
        );
        let multi = Habit::new("Laps").with_goal(4.0).with_steps(1.0);
        assert_eq!(
            next_progress(&multi, &DailyProgress::default(), Direction::Decrement),
            None
        );
    }

    #[test]
    fn decrement_clamps_elapsed_at_zero() {
        let habit = Habit::new("Plan").with_one_time_minutes(15);
        let current = DailyProgress {
            completions: 1,
            elapsed_time: 120,
            completed: true,
            ..Default::default()
        };
        let p = step(&habit, &current, Direction::Decrement);
        assert_eq!(p.elapsed_time, 0);
        assert_eq!(p.completions, 0);
        assert!(!p.completed);
    }

    #[test]
    fn money_single_step() {
        let habit = Habit::new("No takeout")
            .with_unit(RewardUnit::Money)
            .with_step_value(4.5)
            .normalized();
        let p = step(&habit, &DailyProgress::default(), Direction::Increment);
        assert_eq!(p.money_earned, 4.5);
        assert!(p.completed);
        assert_eq!(p.completions, 0);

        let p = step(&habit, &p, Direction::Decrement);
        assert_eq!(p.money_earned, 0.0);
        assert!(!p.completed);
        assert_eq!(
            next_progress(&habit, &p, Direction::Decrement),
            None
        );
    }

    #[test]
    fn money_multi_step_completes_on_cycle() {
        let habit = Habit::new("Piggy bank")
            .with_unit(RewardUnit::Money)
            .with_goal(10.0)
            .with_steps(2.5)
            .normalized();
        let mut p = DailyProgress::default();
        for _ in 0..3 {
            p = step(&habit, &p, Direction::Increment);
        }
        assert_eq!(p.money_earned, 7.5);
        assert!(!p.completed);
        p = step(&habit, &p, Direction::Increment);
        assert_eq!((p.steps_completed, p.money_earned, p.completed), (4, 10.0, true));
        assert_eq!(p.completions, 0);

        p = step(&habit, &p, Direction::Decrement);
        assert_eq!((p.steps_completed, p.money_earned, p.completed), (3, 7.5, false));
    }

    #[test]
    fn money_rounds_to_cents() {
        let habit = Habit::new("Coins")
            .with_unit(RewardUnit::Money)
            .with_step_value(0.1);
        let mut p = DailyProgress::default();
        for _ in 0..3 {
            p = step(&habit, &p, Direction::Increment);
        }
        assert_eq!(p.money_earned, 0.3);
    }

    #[test]
    fn timer_reaching_minutes_goal_completes() {
        let habit = Habit::new("Practice")
            .with_unit(RewardUnit::Minutes)
            .with_goal(20.0);
        let mut p = DailyProgress {
            elapsed_time: 19 * 60,
            ..Default::default()
        };
        assert!(!is_completed(&habit, &p));
        p.elapsed_time = 20 * 60;
        assert!(is_completed(&habit, &p));
    }
}
