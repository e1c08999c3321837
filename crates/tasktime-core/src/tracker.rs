//! Service object wiring the stores together.
//!
//! A front end builds one [`Tracker`] at startup and routes every operation
//! through it. Task deletion, timer transitions and check-ins go through the
//! tracker so the timer and the achievement state stay consistent with the
//! repository.

use std::sync::Arc;

use tracing::{debug, info};

use crate::achievements::{AchievementEngine, AchievementMetrics};
use crate::error::Result;
use crate::events::Event;
use crate::repository::Repository;
use crate::storage::{Config, MemoryStorage, SharedStorage, SqliteStorage, StorageBackend};
use crate::streak::{CheckInOutcome, StreakTracker};
use crate::task::{CategoryUpdate, NewCategory, NewTask, TaskUpdate, TimerMethod};
use crate::time::{day_key, SharedClock, SystemClock};
use crate::timer::{Progress, TimerManager};

pub struct Tracker {
    config: Config,
    clock: SharedClock,
    repo: Repository,
    timer: TimerManager,
    streak: StreakTracker,
    achievements: AchievementEngine,
}

impl Tracker {
    /// Open the backend named in `config` with the system clock.
    pub fn open(config: Config) -> Result<Self> {
        let storage: SharedStorage = match config.storage.backend {
            StorageBackend::Sqlite => match config.storage.path.as_deref() {
                Some(path) => Arc::new(SqliteStorage::open_at(path)?),
                None => Arc::new(SqliteStorage::open()?),
            },
            StorageBackend::Memory => Arc::new(MemoryStorage::new()),
        };
        Self::with_storage(storage, Arc::new(SystemClock), config)
    }

    pub fn with_storage(storage: SharedStorage, clock: SharedClock, config: Config) -> Result<Self> {
        let repo = Repository::load(storage.clone(), clock.clone())?;
        let mut timer = TimerManager::load(storage.clone(), config.timer.clone())?;
        timer.reconcile(&repo)?;
        let streak = StreakTracker::load(storage.clone(), clock.clone())?;
        let achievements = AchievementEngine::load(storage, clock.clone())?;
        debug!(tasks = repo.tasks().len(), "tracker opened");
        Ok(Self {
            config,
            clock,
            repo,
            timer,
            streak,
            achievements,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn repository(&self) -> &Repository {
        &self.repo
    }

    pub fn timer(&self) -> &TimerManager {
        &self.timer
    }

    pub fn streak(&self) -> &StreakTracker {
        &self.streak
    }

    pub fn achievements(&self) -> &AchievementEngine {
        &self.achievements
    }

    pub fn metrics(&self) -> AchievementMetrics {
        AchievementMetrics::collect(&self.repo, &self.streak)
    }

    // ── Tasks and categories ─────────────────────────────────────────

    pub fn add_task(&mut self, input: NewTask) -> Result<String> {
        self.repo.add_task(input)
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<()> {
        self.repo.update_task(id, update)
    }

    /// Delete a task. A timer running on it goes back to idle.
    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        let deleted = self.repo.delete_task(id)?;
        if deleted && self.timer.current_task_id() == Some(id) {
            info!(task_id = %id, "resetting timer of deleted task");
            self.timer.clear()?;
        }
        Ok(deleted)
    }

    pub fn add_category(&mut self, input: NewCategory) -> Result<String> {
        self.repo.add_category(input)
    }

    pub fn update_category(&mut self, id: &str, update: CategoryUpdate) -> Result<()> {
        self.repo.update_category(id, update)
    }

    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        self.repo.delete_category(id)
    }

    // ── Timer ────────────────────────────────────────────────────────

    /// Start timing `task_id`, using the task's own method unless one is given.
    pub fn start_timer(&mut self, task_id: &str, method: Option<TimerMethod>) -> Result<Event> {
        let method = match method {
            Some(method) => method,
            None => self.repo.task(task_id)?.timer_method,
        };
        self.timer.start(&mut self.repo, task_id, method)
    }

    pub fn pause_timer(&mut self) -> Result<Option<Event>> {
        self.timer.pause(&mut self.repo)
    }

    pub fn resume_timer(&mut self) -> Result<Option<Event>> {
        self.timer.resume(&mut self.repo)
    }

    /// Stop the active session and re-evaluate achievements.
    ///
    /// Returns the stop event followed by any unlock events; empty when idle.
    pub fn stop_timer(&mut self) -> Result<Vec<Event>> {
        let Some(stopped) = self.timer.stop(&mut self.repo)? else {
            return Ok(Vec::new());
        };
        let mut events = vec![stopped];
        events.extend(self.check_achievements()?);
        Ok(events)
    }

    /// Abandon the active session without recording any time.
    pub fn reset_timer(&mut self) -> Result<()> {
        self.timer.reset(&mut self.repo)
    }

    pub fn next_phase(&mut self) -> Result<Option<Event>> {
        self.timer.handle_pomodoro_state_change(&self.repo)
    }

    /// Refresh the display elapsed time from the session record.
    ///
    /// Returns `None` when no session is active.
    pub fn refresh_elapsed(&mut self) -> Option<Progress> {
        let live = self.timer.live_elapsed_secs(&self.repo);
        self.timer
            .update_elapsed_time(live)
            .then(|| self.timer.progress())
    }

    // ── Streak and achievements ──────────────────────────────────────

    /// Check in for today and re-evaluate achievements.
    pub fn check_in(&mut self) -> Result<(CheckInOutcome, Vec<Event>)> {
        let outcome = self.streak.check_in_today()?;
        let mut events = Vec::new();
        if outcome != CheckInOutcome::AlreadyCheckedIn {
            events.push(Event::StreakCheckedIn {
                current_streak: self.streak.current_streak(),
                longest_streak: self.streak.longest_streak(),
                day: day_key(self.clock.now_ms()),
            });
        }
        events.extend(self.check_achievements()?);
        Ok((outcome, events))
    }

    pub fn check_achievements(&mut self) -> Result<Vec<Event>> {
        let metrics = self.metrics();
        let unlocked = self.achievements.check(&metrics)?;
        Ok(unlocked.iter().map(Event::from).collect())
    }

    pub fn reset_streak(&mut self) -> Result<()> {
        self.streak.reset()
    }

    pub fn reset_achievements(&mut self) -> Result<()> {
        self.achievements.reset()
    }
}
