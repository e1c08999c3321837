mod manager;
mod schedule;
mod ticker;

pub use manager::{Progress, TimerManager, TimerState, TimerStatus, TIMER_STORAGE_KEY};
pub use schedule::{phase_secs, PhaseKind, PomodoroState};
pub use ticker::Ticker;
