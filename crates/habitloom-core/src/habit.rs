//! Habit definitions and the catalog that owns them.
//!
//! The catalog is edited by forms outside the tracking core; the core only
//! looks habits up through [`HabitLookup`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use crate::error::ValidationError;
use crate::storage::{load_json, save_json, KvStore};

pub const HABITS_KEY: &str = "habits";
pub const CATEGORIES_KEY: &str = "categories";

/// Maximum number of habits that may be pinned as "main".
pub const MAX_MAIN_HABITS: usize = 2;

/// Unit a habit's goal and rewards are measured in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum RewardUnit {
    #[default]
    #[serde(rename = "times")]
    Times,
    #[serde(rename = "minutes")]
    Minutes,
    #[serde(rename = "$")]
    Money,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepMode {
    #[default]
    Single,
    Multi,
}

fn default_reward_value() -> u32 {
    1
}

/// A habit definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Habit {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub reward_unit: RewardUnit,
    #[serde(default)]
    pub step_mode: StepMode,
    /// Target magnitude in the reward unit.
    #[serde(default)]
    pub goal: Option<f64>,
    /// Magnitude of a single step in multi-step mode, or money per action.
    #[serde(default)]
    pub step_value: Option<f64>,
    /// Fragments granted per completed unit. Always 0 for money habits.
    #[serde(default = "default_reward_value")]
    pub reward_value: u32,
    /// Minutes credited per action when no minutes goal is set.
    #[serde(default)]
    pub one_time_value: Option<u32>,
    #[serde(default)]
    pub is_main: bool,
    #[serde(default)]
    pub daily_minimum: bool,
    #[serde(default)]
    pub keep_visible: bool,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

impl Habit {
    /// A single-step count habit with default rewards.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            category_id: None,
            reward_unit: RewardUnit::Times,
            step_mode: StepMode::Single,
            goal: None,
            step_value: None,
            reward_value: 1,
            one_time_value: None,
            is_main: false,
            daily_minimum: false,
            keep_visible: false,
            created_at: Utc::now(),
        }
    }

    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn with_unit(mut self, unit: RewardUnit) -> Self {
        self.reward_unit = unit;
        self
    }

    pub fn with_goal(mut self, goal: f64) -> Self {
        self.goal = Some(goal);
        self
    }

    /// Switch to multi-step mode with the given step size.
    pub fn with_steps(mut self, step_value: f64) -> Self {
        self.step_mode = StepMode::Multi;
        self.step_value = Some(step_value);
        self
    }

    pub fn with_step_value(mut self, step_value: f64) -> Self {
        self.step_value = Some(step_value);
        self
    }

    pub fn with_reward(mut self, reward_value: u32) -> Self {
        self.reward_value = reward_value;
        self
    }

    pub fn with_one_time_minutes(mut self, minutes: u32) -> Self {
        self.one_time_value = Some(minutes);
        self
    }

    pub fn with_daily_minimum(mut self, daily_minimum: bool) -> Self {
        self.daily_minimum = daily_minimum;
        self
    }

    pub fn is_multi_step(&self) -> bool {
        self.step_mode == StepMode::Multi
    }

    /// Enforce the unit rules: money habits never grant fragments.
    pub fn normalized(mut self) -> Self {
        if self.reward_unit == RewardUnit::Money {
            self.reward_value = 0;
        }
        self
    }

    fn validate(&self) -> Result<(), ValidationError> {
        if self.id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "id".into(),
                message: "must not be empty".into(),
            });
        }
        // A single-step count with no reward could be incremented but never undone.
        if self.reward_unit != RewardUnit::Money && !self.is_multi_step() && self.reward_value == 0 {
            return Err(ValidationError::InvalidValue {
                field: "rewardValue".into(),
                message: "must be at least 1".into(),
            });
        }
        if self.is_multi_step() {
            if let Some(step) = self.step_value {
                if step <= 0.0 || !step.is_finite() {
                    return Err(ValidationError::InvalidValue {
                        field: "stepValue".into(),
                        message: format!("must be positive, got {step}"),
                    });
                }
            }
        }
        if let Some(goal) = self.goal {
            if goal < 0.0 || !goal.is_finite() {
                return Err(ValidationError::InvalidValue {
                    field: "goal".into(),
                    message: format!("must not be negative, got {goal}"),
                });
            }
        }
        Ok(())
    }
}

/// A habit category. Only presentation reads these.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: String,
    pub name: String,
    #[serde(default = "default_color")]
    pub color_hex: String,
}

fn default_color() -> String {
    "#3b82f6".into()
}

/// Read access to habit definitions.
pub trait HabitLookup {
    fn get_habit(&self, id: &str) -> Option<&Habit>;
}

/// Ordered habit and category lists, persisted through a [`KvStore`].
pub struct Catalog {
    kv: Rc<dyn KvStore>,
    habits: Vec<Habit>,
    categories: Vec<Category>,
}

impl Catalog {
    /// Load both lists; missing or corrupt values start empty.
    pub fn load(kv: Rc<dyn KvStore>) -> Self {
        let habits: Vec<Habit> = load_json(kv.as_ref(), HABITS_KEY).unwrap_or_default();
        let categories = load_json(kv.as_ref(), CATEGORIES_KEY).unwrap_or_default();
        Self {
            kv,
            habits: habits.into_iter().map(Habit::normalized).collect(),
            categories,
        }
    }

    pub fn habits(&self) -> &[Habit] {
        &self.habits
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn main_habits(&self) -> impl Iterator<Item = &Habit> {
        self.habits.iter().filter(|h| h.is_main)
    }

    /// Append a new habit.
    pub fn add(&mut self, habit: Habit) -> Result<&Habit, ValidationError> {
        let habit = habit.normalized();
        habit.validate()?;
        if self.habits.iter().any(|h| h.id == habit.id) {
            return Err(ValidationError::DuplicateId(habit.id));
        }
        if habit.is_main && self.main_habits().count() >= MAX_MAIN_HABITS {
            return Err(ValidationError::TooManyMainHabits {
                max: MAX_MAIN_HABITS,
            });
        }
        self.habits.push(habit);
        self.persist_habits();
        Ok(&self.habits[self.habits.len() - 1])
    }

    /// Replace an existing habit definition, keeping its position.
    pub fn update(&mut self, habit: Habit) -> Result<(), ValidationError> {
        let habit = habit.normalized();
        habit.validate()?;
        let pinned_elsewhere = self
            .habits
            .iter()
            .filter(|h| h.is_main && h.id != habit.id)
            .count();
        if habit.is_main && pinned_elsewhere >= MAX_MAIN_HABITS {
            return Err(ValidationError::TooManyMainHabits {
                max: MAX_MAIN_HABITS,
            });
        }
        let slot = self
            .habits
            .iter_mut()
            .find(|h| h.id == habit.id)
            .ok_or_else(|| ValidationError::NotFound(habit.id.clone()))?;
        *slot = habit;
        self.persist_habits();
        Ok(())
    }

    /// Pin or unpin a habit as main.
    pub fn set_main(&mut self, id: &str, is_main: bool) -> Result<(), ValidationError> {
        let mut habit = self
            .get_habit(id)
            .cloned()
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        habit.is_main = is_main;
        self.update(habit)
    }

    /// Remove a habit. Public deletes go through
    /// [`crate::HabitTracker::delete_habit`] so its timer is finalized.
    pub(crate) fn remove(&mut self, id: &str) -> Result<Habit, ValidationError> {
        let idx = self
            .habits
            .iter()
            .position(|h| h.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let removed = self.habits.remove(idx);
        self.persist_habits();
        Ok(removed)
    }

    pub fn add_category(&mut self, category: Category) -> Result<(), ValidationError> {
        if self.categories.iter().any(|c| c.id == category.id) {
            return Err(ValidationError::DuplicateId(category.id));
        }
        self.categories.push(category);
        save_json(self.kv.as_ref(), CATEGORIES_KEY, &self.categories);
        Ok(())
    }

    pub fn remove_category(&mut self, id: &str) -> Result<Category, ValidationError> {
        let idx = self
            .categories
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| ValidationError::NotFound(id.to_string()))?;
        let removed = self.categories.remove(idx);
        for habit in self.habits.iter_mut() {
            if habit.category_id.as_deref() == Some(id) {
                habit.category_id = None;
            }
        }
        save_json(self.kv.as_ref(), CATEGORIES_KEY, &self.categories);
        self.persist_habits();
        Ok(removed)
    }

    fn persist_habits(&self) {
        save_json(self.kv.as_ref(), HABITS_KEY, &self.habits);
    }
}

impl HabitLookup for Catalog {
    fn get_habit(&self, id: &str) -> Option<&Habit> {
        self.habits.iter().find(|h| h.id == id)
    }
}
