use chrono::Utc;
use clap::Subcommand;
use habitloom_core::dates::{last_n_days, week_days};
use habitloom_core::stats::{self, summarize, totals};

use super::open_tracker;

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's summary
    Today,
    /// One week of summaries plus totals
    Week {
        /// Weeks relative to the current one (-1 = last week)
        #[arg(
            long,
            default_value = "0",
            allow_negative_numbers = true,
            value_parser = clap::value_parser!(i32).range(-5200..=5200)
        )]
        offset: i32,
    },
    /// Summaries for the trailing N days plus totals
    Last {
        #[arg(default_value = "30", value_parser = clap::value_parser!(u32).range(1..=36_600))]
        days: u32,
    },
    /// Current completion streak of a habit
    Streak { id: String },
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let (tracker, config) = open_tracker()?;
    let habits = tracker.catalog().habits();
    let store = tracker.progress_store();
    let now = Utc::now();

    match action {
        StatsAction::Today => {
            let summary = summarize(habits, store, &[tracker.today()]);
            println!("{}", serde_json::to_string_pretty(&summary[0])?);
        }
        StatsAction::Week { offset } => {
            let days = week_days(now, tracker.zone(), offset, config.calendar.week_start);
            let summaries = summarize(habits, store, &days);
            let report = serde_json::json!({ "days": summaries, "totals": totals(&summaries) });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatsAction::Last { days } => {
            let days = last_n_days(now, tracker.zone(), days as usize);
            let summaries = summarize(habits, store, &days);
            let report = serde_json::json!({ "days": summaries, "totals": totals(&summaries) });
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        StatsAction::Streak { id } => {
            let streak = stats::streak(store, &id, tracker.today());
            println!("{}", serde_json::json!({ "habit_id": id, "streak": streak }));
        }
    }
    Ok(())
}
