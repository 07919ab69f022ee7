use chrono::Utc;
use clap::Subcommand;
use habitloom_core::{Config, HabitLookup, HabitTracker};
use std::time::Duration;
use tokio::time::{interval, MissedTickBehavior};

use super::{open_tracker, print_events};

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start or stop a habit's timer
    Toggle { id: String },
    /// Print running timers with their live elapsed time as JSON
    Status,
    /// Stay in the foreground ticking running timers until they all stop
    Watch,
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let (mut tracker, config) = open_tracker()?;

    match action {
        TimerAction::Toggle { id } => {
            if tracker.catalog().get_habit(&id).is_none() && !tracker.is_running(&id) {
                return Err(format!("unknown habit: {id}").into());
            }
            let events = tracker.toggle(&id, Utc::now());
            print_events(&events)?;
        }
        TimerAction::Status => {
            let events = tracker.on_visible(Utc::now());
            print_events(&events)?;
            println!("{}", serde_json::to_string_pretty(&status(&tracker))?);
        }
        TimerAction::Watch => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_time()
                .build()?;
            runtime.block_on(watch(tracker, &config))?;
        }
    }
    Ok(())
}

fn status(tracker: &HabitTracker) -> serde_json::Value {
    let now = Utc::now();
    let running: Vec<serde_json::Value> = tracker
        .timers()
        .running_ids()
        .map(|id| {
            serde_json::json!({
                "habit_id": id,
                "elapsed_secs": tracker.elapsed(id, now),
            })
        })
        .collect();
    serde_json::json!({
        "date": tracker.today(),
        "max_session_secs": tracker.timers().max_session_secs(),
        "running": running,
    })
}

/// Drive the per-second tick and the coarse day check until no timer runs.
async fn watch(mut tracker: HabitTracker, config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let mut tick = interval(Duration::from_secs(config.timer.tick_interval_secs.max(1)));
    let mut day_check = interval(Duration::from_secs(config.timer.rollover_check_secs.max(1)));
    tick.set_missed_tick_behavior(MissedTickBehavior::Skip);
    day_check.set_missed_tick_behavior(MissedTickBehavior::Skip);

    while tracker.timers().has_running() {
        let events = tokio::select! {
            _ = tick.tick() => tracker.tick(Utc::now()),
            _ = day_check.tick() => tracker.check_day(Utc::now()),
        };
        print_events(&events)?;

        let now = Utc::now();
        let line: Vec<String> = tracker
            .timers()
            .running_ids()
            .filter_map(|id| tracker.elapsed(id, now).map(|secs| format!("{id} {}", clock(secs))))
            .collect();
        if !line.is_empty() {
            eprint!("\r{}", line.join("  "));
        }
    }
    eprintln!();
    Ok(())
}

fn clock(secs: u64) -> String {
    format!("{:02}:{:02}:{:02}", secs / 3600, secs / 60 % 60, secs % 60)
}
