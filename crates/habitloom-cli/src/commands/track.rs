use chrono::Utc;
use clap::Subcommand;

use super::{open_tracker, print_events};

#[derive(Subcommand)]
pub enum TrackAction {
    /// Record one action (or one step) for a habit
    Inc { id: String },
    /// Undo one action (or one step)
    Dec { id: String },
    /// Mark a habit as not being done today
    Skip {
        id: String,
        /// Clear the mark instead
        #[arg(long)]
        undo: bool,
    },
    /// Set today's mood, from -3 to 3
    Mood {
        #[arg(allow_negative_numbers = true)]
        value: i8,
    },
    /// Print today's log as JSON
    Today,
}

pub fn run(action: TrackAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut tracker, _config) = open_tracker()?;
    let now = Utc::now();

    let events = match action {
        TrackAction::Inc { id } => tracker.increment(&id, now),
        TrackAction::Dec { id } => tracker.decrement(&id, now),
        TrackAction::Skip { id, undo } => tracker.set_skipped(&id, !undo, now),
        TrackAction::Mood { value } => tracker.set_mood(value, now),
        TrackAction::Today => {
            let date = tracker.today();
            let log = tracker.log(date);
            println!(
                "{}",
                serde_json::to_string_pretty(&serde_json::json!({ "date": date, "log": log }))?
            );
            return Ok(());
        }
    };

    if events.is_empty() {
        println!("{{\"type\": \"unchanged\"}}");
    }
    print_events(&events)
}
