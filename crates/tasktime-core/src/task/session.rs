//! A single timed interval bound to a task.
//!
//! ## Duration rule
//!
//! ```text
//! running at stop:  floor((end      - start) / 1000) - floor(pause_ms / 1000)
//! paused at stop:   floor((pausedAt - start) / 1000) - floor(pause_ms / 1000)
//! ```
//!
//! Both halves are floored separately, so the result can differ by one second
//! from flooring the net elapsed time. Negative spans (clock went backwards)
//! count as zero.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerSession {
    pub id: String,
    pub task_id: String,
    /// Epoch milliseconds.
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Seconds. Zero until the session is stopped.
    #[serde(default)]
    pub duration: u64,
    #[serde(default)]
    pub is_completed: bool,
    #[serde(default)]
    pub is_paused: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at: Option<i64>,
    /// Accumulated pause time in milliseconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pause_duration: Option<i64>,
}

impl TimerSession {
    pub(crate) fn begin(task_id: &str, now_ms: i64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            task_id: task_id.to_string(),
            start_time: now_ms,
            end_time: None,
            duration: 0,
            is_completed: false,
            is_paused: false,
            paused_at: None,
            pause_duration: None,
        }
    }

    pub fn pause_duration_ms(&self) -> i64 {
        self.pause_duration.unwrap_or(0)
    }

    /// Seconds of work in this session as of `now_ms`.
    ///
    /// Completed sessions report their frozen `duration`.
    pub fn duration_at(&self, now_ms: i64) -> u64 {
        if self.is_completed {
            return self.duration;
        }
        let until = match (self.is_paused, self.paused_at) {
            (true, Some(paused_at)) => paused_at,
            _ => now_ms,
        };
        floor_secs(until - self.start_time).saturating_sub(floor_secs(self.pause_duration_ms()))
    }

    /// Returns `false` when the session cannot be paused (already paused or completed).
    pub(crate) fn pause(&mut self, now_ms: i64) -> bool {
        if self.is_completed || self.is_paused {
            return false;
        }
        self.is_paused = true;
        self.paused_at = Some(now_ms);
        true
    }

    /// Returns `false` when the session is not paused.
    pub(crate) fn resume(&mut self, now_ms: i64) -> bool {
        if self.is_completed || !self.is_paused {
            return false;
        }
        let paused_for = self
            .paused_at
            .map(|at| (now_ms - at).max(0))
            .unwrap_or(0);
        self.pause_duration = Some(self.pause_duration_ms() + paused_for);
        self.paused_at = None;
        self.is_paused = false;
        true
    }

    /// Freeze the session and return its final duration in seconds.
    pub(crate) fn complete(&mut self, now_ms: i64) -> u64 {
        let duration = self.duration_at(now_ms);
        self.duration = duration;
        self.end_time = Some(now_ms);
        self.is_completed = true;
        self.is_paused = false;
        duration
    }
}

fn floor_secs(ms: i64) -> u64 {
    if ms <= 0 {
        0
    } else {
        (ms / 1000) as u64
    }
}
