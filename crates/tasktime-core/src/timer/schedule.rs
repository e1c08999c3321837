//! Phase lengths per timer method and the pomodoro work/break cycle.

use serde::{Deserialize, Serialize};

use crate::storage::TimerConfig;
use crate::task::TimerMethod;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PhaseKind {
    Work,
    Break,
    LongBreak,
}

/// Position in the pomodoro cycle.
///
/// `current_session` counts work sessions from 1 up to
/// `sessions_before_long_break`. The break that follows the last one is a
/// long break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PomodoroState {
    pub current_session: u32,
    pub is_break: bool,
    #[serde(default)]
    pub is_long_break: bool,
}

impl Default for PomodoroState {
    fn default() -> Self {
        Self {
            current_session: 1,
            is_break: false,
            is_long_break: false,
        }
    }
}

impl PomodoroState {
    pub fn phase(&self) -> PhaseKind {
        match (self.is_break, self.is_long_break) {
            (false, _) => PhaseKind::Work,
            (true, false) => PhaseKind::Break,
            (true, true) => PhaseKind::LongBreak,
        }
    }

    /// The state after the current phase finishes.
    pub fn advance(&self, sessions_before_long_break: u32) -> Self {
        let cycle = sessions_before_long_break.max(1);
        if self.is_break {
            Self {
                current_session: if self.current_session < cycle {
                    self.current_session + 1
                } else {
                    1
                },
                is_break: false,
                is_long_break: false,
            }
        } else {
            Self {
                current_session: self.current_session,
                is_break: true,
                is_long_break: self.current_session >= cycle,
            }
        }
    }
}

/// Length of the current phase in seconds; `None` for open-ended methods.
pub fn phase_secs(method: TimerMethod, pomodoro: &PomodoroState, settings: &TimerConfig) -> Option<u64> {
    match method {
        TimerMethod::Regular => None,
        TimerMethod::FiveMin => Some(settings.five_min_secs),
        TimerMethod::Pomodoro => Some(match pomodoro.phase() {
            PhaseKind::Work => settings.pomodoro_work_secs,
            PhaseKind::Break => settings.pomodoro_break_secs,
            PhaseKind::LongBreak => settings.pomodoro_long_break_secs,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_cycle_reaches_long_break_after_four_sessions() {
        let mut state = PomodoroState::default();
        let mut phases = Vec::new();
        for _ in 0..9 {
            phases.push((state.current_session, state.phase()));
            state = state.advance(4);
        }
        assert_eq!(
            phases,
            vec![
                (1, PhaseKind::Work),
                (1, PhaseKind::Break),
                (2, PhaseKind::Work),
                (2, PhaseKind::Break),
                (3, PhaseKind::Work),
                (3, PhaseKind::Break),
                (4, PhaseKind::Work),
                (4, PhaseKind::LongBreak),
                (1, PhaseKind::Work),
            ]
        );
    }

    #[test]
    fn zero_cycle_length_behaves_like_one() {
        let state = PomodoroState::default().advance(0);
        assert_eq!(state.phase(), PhaseKind::LongBreak);
        assert_eq!(state.advance(0), PomodoroState::default());
    }

    #[test]
    fn phase_lengths_follow_settings() {
        let settings = TimerConfig::default();
        let work = PomodoroState::default();
        let long = PomodoroState {
            current_session: 4,
            is_break: true,
            is_long_break: true,
        };
        assert_eq!(phase_secs(TimerMethod::Regular, &work, &settings), None);
        assert_eq!(phase_secs(TimerMethod::FiveMin, &work, &settings), Some(300));
        assert_eq!(phase_secs(TimerMethod::Pomodoro, &work, &settings), Some(1500));
        assert_eq!(phase_secs(TimerMethod::Pomodoro, &work.advance(4), &settings), Some(300));
        assert_eq!(phase_secs(TimerMethod::Pomodoro, &long, &settings), Some(900));
    }
}
