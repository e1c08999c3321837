//! Task, category and timer-session records.
//!
//! These are plain data types. All mutation goes through
//! [`Repository`](crate::repository::Repository), which keeps the
//! `total_time_spent` cache consistent with the session list.

mod category;
mod session;

pub use category::{default_categories, Category, CategoryColor, CategoryUpdate, NewCategory};
pub use session::TimerSession;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How a task is timed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum TimerMethod {
    /// Open-ended stopwatch.
    #[default]
    Regular,
    /// Alternating work and break intervals.
    Pomodoro,
    /// A single five-minute push.
    FiveMin,
}

impl TimerMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimerMethod::Regular => "regular",
            TimerMethod::Pomodoro => "pomodoro",
            TimerMethod::FiveMin => "fiveMin",
        }
    }

    pub fn all() -> [TimerMethod; 3] {
        [TimerMethod::Regular, TimerMethod::Pomodoro, TimerMethod::FiveMin]
    }
}

impl fmt::Display for TimerMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimerMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "regular" => Ok(TimerMethod::Regular),
            "pomodoro" => Ok(TimerMethod::Pomodoro),
            "fiveMin" | "five-min" | "five_min" => Ok(TimerMethod::FiveMin),
            other => Err(format!("unknown timer method: {other}")),
        }
    }
}

/// A trackable task and its full session history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category_id: String,
    #[serde(default)]
    pub timer_method: TimerMethod,
    /// Seconds; cached sum of completed session durations.
    #[serde(default)]
    pub total_time_spent: u64,
    #[serde(default)]
    pub is_active: bool,
    /// Epoch milliseconds.
    pub created_at: i64,
    /// Epoch milliseconds.
    pub updated_at: i64,
    #[serde(default)]
    pub sessions: Vec<TimerSession>,
}

impl Task {
    pub fn completed_sessions(&self) -> impl Iterator<Item = &TimerSession> {
        self.sessions.iter().filter(|s| s.is_completed)
    }

    pub fn has_completed_session(&self) -> bool {
        self.sessions.iter().any(|s| s.is_completed)
    }

    /// Sum of completed session durations, recomputed from the history.
    pub fn recorded_time(&self) -> u64 {
        self.completed_sessions().map(|s| s.duration).sum()
    }

    /// The session that has been started but not stopped, if any.
    pub fn open_session(&self) -> Option<&TimerSession> {
        self.sessions.iter().find(|s| !s.is_completed)
    }

    pub fn session(&self, session_id: &str) -> Option<&TimerSession> {
        self.sessions.iter().find(|s| s.id == session_id)
    }
}

/// Input for [`Repository::add_task`](crate::repository::Repository::add_task).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewTask {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Falls back to the first category when absent.
    #[serde(default)]
    pub category_id: Option<String>,
    #[serde(default)]
    pub timer_method: TimerMethod,
}

impl NewTask {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category_id: impl Into<String>) -> Self {
        self.category_id = Some(category_id.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_method(mut self, method: TimerMethod) -> Self {
        self.timer_method = method;
        self
    }
}

/// The user-editable fields of a task. `None` leaves a field untouched.
///
/// `description: Some(None)` clears the description.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub name: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<String>,
    pub timer_method: Option<TimerMethod>,
}

impl TaskUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.category_id.is_none()
            && self.timer_method.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timer_method_wire_names() {
        assert_eq!(serde_json::to_string(&TimerMethod::FiveMin).unwrap(), "\"fiveMin\"");
        assert_eq!(
            serde_json::from_str::<TimerMethod>("\"pomodoro\"").unwrap(),
            TimerMethod::Pomodoro
        );
        assert_eq!("five-min".parse::<TimerMethod>().unwrap(), TimerMethod::FiveMin);
        assert!("tabata".parse::<TimerMethod>().is_err());
    }

    #[test]
    fn task_deserializes_from_camel_case_document() {
        let json = r#"{
            "id": "1",
            "name": "Write report",
            "categoryId": "work",
            "timerMethod": "regular",
            "totalTimeSpent": 30,
            "isActive": false,
            "createdAt": 0,
            "updatedAt": 0,
            "sessions": [{
                "id": "s1", "taskId": "1", "startTime": 0, "endTime": 30000,
                "duration": 30, "isCompleted": true, "isPaused": false
            }]
        }"#;
        let task: Task = serde_json::from_str(json).unwrap();
        assert_eq!(task.category_id, "work");
        assert_eq!(task.recorded_time(), 30);
        assert!(task.has_completed_session());
        assert!(task.open_session().is_none());
    }

    #[test]
    fn empty_update_is_detected() {
        assert!(TaskUpdate::default().is_empty());
        let update = TaskUpdate {
            timer_method: Some(TimerMethod::Pomodoro),
            ..TaskUpdate::default()
        };
        assert!(!update.is_empty());
    }
}
