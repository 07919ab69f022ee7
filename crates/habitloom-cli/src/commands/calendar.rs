use chrono::{Datelike, Utc};
use clap::Subcommand;
use habitloom_core::dates::{date_key, month_calendar, week_days};

use super::open_tracker;

#[derive(Subcommand)]
pub enum CalendarAction {
    /// Dates of a week
    Week {
        #[arg(
            long,
            default_value = "0",
            allow_negative_numbers = true,
            value_parser = clap::value_parser!(i32).range(-5200..=5200)
        )]
        offset: i32,
    },
    /// Month grid padded to whole weeks, with completed-habit counts
    Month {
        #[arg(long)]
        year: Option<i32>,
        #[arg(long)]
        month: Option<u32>,
    },
}

pub fn run(action: CalendarAction) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, config) = open_tracker()?;
    let week_start = config.calendar.week_start;

    match action {
        CalendarAction::Week { offset } => {
            let days = week_days(Utc::now(), tracker.zone(), offset, week_start);
            let keys: Vec<String> = days.iter().copied().map(date_key).collect();
            println!("{}", serde_json::to_string_pretty(&keys)?);
        }
        CalendarAction::Month { year, month } => {
            let today = tracker.today();
            let year = year.unwrap_or(today.year());
            let month = month.unwrap_or(today.month());
            let grid = month_calendar(year, month, week_start);
            if grid.is_empty() {
                return Err(format!("invalid month: {year}-{month}").into());
            }
            let cells: Vec<serde_json::Value> = grid
                .iter()
                .map(|day| {
                    let log = tracker.log(day.date);
                    serde_json::json!({
                        "date": day.date,
                        "day_of_month": day.day_of_month,
                        "is_current_month": day.is_current_month,
                        "completed": log.habits.values().filter(|p| p.completed).count(),
                        "mood": log.mood,
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&cells)?);
        }
    }
    Ok(())
}
