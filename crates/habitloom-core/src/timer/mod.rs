mod engine;

pub use engine::{ActiveTimer, TimerEngine, TimerSample, TimerSnapshot, MAX_SESSION_SECONDS};
