use serde::{Deserialize, Serialize};

use crate::achievements::AchievementLevel;
use crate::task::TimerMethod;
use crate::timer::PomodoroState;

/// Every state change in the system produces an Event.
/// Front ends render them; timestamps are epoch milliseconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        task_id: String,
        session_id: String,
        method: TimerMethod,
        at: i64,
    },
    TimerPaused {
        session_id: String,
        elapsed_secs: u64,
        at: i64,
    },
    TimerResumed {
        session_id: String,
        paused_ms: i64,
        at: i64,
    },
    TimerStopped {
        task_id: String,
        session_id: String,
        duration_secs: u64,
        total_time_spent: u64,
        at: i64,
    },
    PomodoroPhaseChanged {
        pomodoro: PomodoroState,
        phase_secs: u64,
    },
    StreakCheckedIn {
        current_streak: u32,
        longest_streak: u32,
        day: String,
    },
    AchievementUnlocked {
        id: String,
        title: String,
        level: AchievementLevel,
        at: i64,
    },
}
