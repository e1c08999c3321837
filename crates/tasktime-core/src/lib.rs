//! # Tasktime Core Library
//!
//! Core logic for a personal task and time tracker. Every operation is
//! available through the [`Tracker`] service object; the `tasktime` CLI is a
//! thin layer over the same library.
//!
//! ## Architecture
//!
//! - **Repository**: tasks, categories and their timer sessions, persisted as
//!   one JSON document through the [`Storage`] port
//! - **Timer**: start/pause/resume/stop state machine for the single active
//!   session, plus the pomodoro cycle and a display [`Ticker`]
//! - **Streak**: consecutive-day check-ins
//! - **Achievements**: static catalog evaluated against repository and streak
//!   metrics
//! - **Api**: optional REST client for a sync backend
//!
//! State changes return [`Event`]s that front ends render.

pub mod achievements;
pub mod api;
pub mod error;
pub mod events;
pub mod repository;
pub mod storage;
pub mod streak;
pub mod task;
pub mod time;
pub mod timer;
pub mod tracker;

pub use achievements::{AchievementEngine, AchievementMetrics, AchievementView};
pub use api::{ApiClient, ApiError, ApiErrorKind};
pub use error::{ConfigError, CoreError, EntityKind, Result, StorageError};
pub use events::Event;
pub use repository::{Repository, Summary};
pub use storage::{Config, MemoryStorage, SqliteStorage, Storage};
pub use streak::{CheckInOutcome, StreakTracker};
pub use task::{Category, NewCategory, NewTask, Task, TaskUpdate, TimerMethod, TimerSession};
pub use time::{Clock, ManualClock, SystemClock};
pub use timer::{Progress, Ticker, TimerManager, TimerStatus};
pub use tracker::Tracker;
