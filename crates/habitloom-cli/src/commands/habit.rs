use chrono::Utc;
use clap::{Subcommand, ValueEnum};
use habitloom_core::{Category, Habit, RewardUnit};

use super::{open_tracker, print_events};

#[derive(Clone, Copy, ValueEnum)]
pub enum UnitArg {
    Times,
    Minutes,
    Money,
}

impl From<UnitArg> for RewardUnit {
    fn from(unit: UnitArg) -> Self {
        match unit {
            UnitArg::Times => RewardUnit::Times,
            UnitArg::Minutes => RewardUnit::Minutes,
            UnitArg::Money => RewardUnit::Money,
        }
    }
}

#[derive(Subcommand)]
pub enum HabitAction {
    /// Create a habit
    Add {
        /// Display name
        name: String,
        /// Explicit id (generated when omitted)
        #[arg(long)]
        id: Option<String>,
        #[arg(long, value_enum, default_value = "times")]
        unit: UnitArg,
        /// Target magnitude in the habit's unit
        #[arg(long)]
        goal: Option<f64>,
        /// Size of one step; enables multi-step mode
        #[arg(long)]
        step: Option<f64>,
        /// Money per action for single-step money habits
        #[arg(long)]
        amount: Option<f64>,
        /// Fragments granted per completed unit
        #[arg(long, default_value = "1")]
        reward: u32,
        /// Minutes credited per action when no minutes goal is set
        #[arg(long)]
        one_time: Option<u32>,
        #[arg(long)]
        category: Option<String>,
        /// Pin as a main habit (at most two)
        #[arg(long)]
        main: bool,
        /// Counts toward the daily minimum
        #[arg(long)]
        daily_minimum: bool,
        /// Keep visible after completion
        #[arg(long)]
        keep_visible: bool,
    },
    /// List habits with today's progress
    List,
    /// Delete a habit (stops its timer first)
    Remove { id: String },
    /// Pin or unpin a main habit
    Main {
        id: String,
        /// Unpin instead
        #[arg(long)]
        off: bool,
    },
}

#[derive(Subcommand)]
pub enum CategoryAction {
    /// Create a category
    Add {
        id: String,
        name: String,
        #[arg(long, default_value = "#3b82f6")]
        color: String,
    },
    /// List categories
    List,
    /// Delete a category
    Remove { id: String },
}

pub fn run(action: HabitAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut tracker, _config) = open_tracker()?;

    match action {
        HabitAction::Add {
            name,
            id,
            unit,
            goal,
            step,
            amount,
            reward,
            one_time,
            category,
            main,
            daily_minimum,
            keep_visible,
        } => {
            let mut habit = Habit::new(name).with_unit(unit.into()).with_reward(reward);
            if let Some(id) = id {
                habit = habit.with_id(id);
            }
            if let Some(goal) = goal {
                habit = habit.with_goal(goal);
            }
            if let Some(step) = step {
                habit = habit.with_steps(step);
            } else if let Some(amount) = amount {
                habit = habit.with_step_value(amount);
            }
            habit.one_time_value = one_time;
            habit.category_id = category;
            habit.is_main = main;
            habit.daily_minimum = daily_minimum;
            habit.keep_visible = keep_visible;

            let added = tracker.catalog_mut().add(habit)?;
            println!("{}", serde_json::to_string_pretty(added)?);
        }
        HabitAction::List => {
            let now = Utc::now();
            let rows: Vec<serde_json::Value> = tracker
                .catalog()
                .habits()
                .iter()
                .map(|habit| {
                    serde_json::json!({
                        "habit": habit,
                        "today": tracker.today_progress(&habit.id, now),
                        "running": tracker.is_running(&habit.id),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        HabitAction::Remove { id } => {
            let (_habit, events) = tracker.delete_habit(&id, Utc::now())?;
            print_events(&events)?;
        }
        HabitAction::Main { id, off } => {
            tracker.catalog_mut().set_main(&id, !off)?;
            println!("ok");
        }
    }
    Ok(())
}

pub fn run_category(action: CategoryAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut tracker, _config) = open_tracker()?;

    match action {
        CategoryAction::Add { id, name, color } => {
            tracker.catalog_mut().add_category(Category {
                id,
                name,
                color_hex: color,
            })?;
            println!("ok");
        }
        CategoryAction::List => {
            println!(
                "{}",
                serde_json::to_string_pretty(tracker.catalog().categories())?
            );
        }
        CategoryAction::Remove { id } => {
            tracker.catalog_mut().remove_category(&id)?;
            println!("ok");
        }
    }
    Ok(())
}
