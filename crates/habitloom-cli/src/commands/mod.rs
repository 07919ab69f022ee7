pub mod calendar;
pub mod config;
pub mod habit;
pub mod stats;
pub mod timer;
pub mod track;

use chrono::Utc;
use habitloom_core::storage::Database;
use habitloom_core::{Config, Event, HabitTracker};
use std::rc::Rc;

/// Open the on-disk store and bring the tracker up to date with the clock.
pub fn open_tracker() -> habitloom_core::Result<(HabitTracker, Config)> {
    let config = Config::load();
    let zone = config.zone();
    if zone.fell_back {
        log::warn!(
            "timezone '{}' is unknown, using the system timezone",
            config.calendar.timezone
        );
    }
    let db = Database::open()?;
    let (tracker, events) = HabitTracker::open(Rc::new(db), &config, Utc::now());
    for event in &events {
        log::info!("{event:?}");
    }
    Ok((tracker, config))
}

pub fn print_events(events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string_pretty(event)?);
    }
    Ok(())
}
