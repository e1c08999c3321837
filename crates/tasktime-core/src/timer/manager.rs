//! Session lifecycle manager.
//!
//! Drives the single active timer session. The manager only holds ids; the
//! session records themselves live in the [`Repository`] and every transition
//! goes through it.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused -> (stop) -> Idle
//! ```
//!
//! Transitions from the wrong state are silent no-ops returning `Ok(None)`.
//! The only errors are a second `start` while a session is active and ids
//! the repository does not know.

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::schedule::{phase_secs, PomodoroState};
use crate::error::{CoreError, Result};
use crate::events::Event;
use crate::repository::Repository;
use crate::storage::{load_json, save_json, SharedStorage, TimerConfig};
use crate::task::{TimerMethod, TimerSession};

pub const TIMER_STORAGE_KEY: &str = "timer-storage";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

/// Persisted manager state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimerState {
    #[serde(default)]
    pub status: TimerStatus,
    #[serde(default)]
    pub current_task_id: Option<String>,
    #[serde(default)]
    pub current_session_id: Option<String>,
    /// Display value in seconds, refreshed by ticks and on pause.
    #[serde(default)]
    pub elapsed_time: u64,
    #[serde(default)]
    pub timer_method: TimerMethod,
    #[serde(default)]
    pub pomodoro_state: PomodoroState,
    /// Elapsed seconds at which the current pomodoro phase began.
    #[serde(default)]
    pub phase_started_at: u64,
}

impl TimerState {
    pub fn is_active(&self) -> bool {
        self.status != TimerStatus::Idle
    }

    /// Seconds spent in the current phase.
    pub fn phase_elapsed(&self) -> u64 {
        self.elapsed_time.saturating_sub(self.phase_started_at)
    }
}

/// Elapsed time against the current phase target.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub method: TimerMethod,
    pub elapsed_secs: u64,
    /// `None` for open-ended timing.
    pub target_secs: Option<u64>,
    /// `elapsed / target` clamped to `[0, 1]`.
    pub fraction: Option<f64>,
}

pub struct TimerManager {
    storage: SharedStorage,
    settings: TimerConfig,
    state: TimerState,
}

impl TimerManager {
    pub fn load(storage: SharedStorage, settings: TimerConfig) -> Result<Self> {
        let state = load_json::<TimerState>(storage.as_ref(), TIMER_STORAGE_KEY)?.unwrap_or_default();
        Ok(Self {
            storage,
            settings,
            state,
        })
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn settings(&self) -> &TimerConfig {
        &self.settings
    }

    pub fn current_session_id(&self) -> Option<&str> {
        self.state.current_session_id.as_deref()
    }

    pub fn current_task_id(&self) -> Option<&str> {
        self.state.current_task_id.as_deref()
    }

    /// Work seconds of the active session computed from its record, 0 when idle.
    pub fn live_elapsed_secs(&self, repo: &Repository) -> u64 {
        self.current_session(repo)
            .map(|s| s.duration_at(repo.now_ms()))
            .unwrap_or(0)
    }

    pub fn target_secs(&self) -> Option<u64> {
        phase_secs(self.state.timer_method, &self.state.pomodoro_state, &self.settings)
    }

    pub fn progress(&self) -> Progress {
        let elapsed = self.state.phase_elapsed();
        let target = self.target_secs();
        Progress {
            method: self.state.timer_method,
            elapsed_secs: elapsed,
            target_secs: target,
            fraction: target.map(|t| {
                if t == 0 {
                    1.0
                } else {
                    (elapsed as f64 / t as f64).clamp(0.0, 1.0)
                }
            }),
        }
    }

    /// True once a bounded phase has run its full length.
    pub fn phase_complete(&self) -> bool {
        self.state.is_active()
            && self
                .target_secs()
                .is_some_and(|t| self.state.phase_elapsed() >= t)
    }

    // ── Transitions ──────────────────────────────────────────────────

    pub fn start(&mut self, repo: &mut Repository, task_id: &str, method: TimerMethod) -> Result<Event> {
        if let Some(session_id) = self.state.current_session_id.as_ref().filter(|_| self.state.is_active()) {
            warn!(session_id = %session_id, "start rejected, a session is already running");
            return Err(CoreError::AlreadyRunning {
                session_id: session_id.clone(),
            });
        }

        let session_id = repo.start_session(task_id)?;
        let at = repo.now_ms();
        self.state = TimerState {
            status: TimerStatus::Running,
            current_task_id: Some(task_id.to_string()),
            current_session_id: Some(session_id.clone()),
            elapsed_time: 0,
            timer_method: method,
            pomodoro_state: PomodoroState::default(),
            phase_started_at: 0,
        };
        self.persist()?;
        debug!(task_id, session_id = %session_id, method = %method, "timer started");

        Ok(Event::TimerStarted {
            task_id: task_id.to_string(),
            session_id,
            method,
            at,
        })
    }

    pub fn pause(&mut self, repo: &mut Repository) -> Result<Option<Event>> {
        let Some(session_id) = self.active_session(TimerStatus::Running) else {
            return Ok(None);
        };
        if !repo.pause_session(&session_id)? {
            return Ok(None);
        }

        let at = repo.now_ms();
        let elapsed = repo.session(&session_id)?.duration_at(at);
        self.state.status = TimerStatus::Paused;
        self.state.elapsed_time = elapsed;
        self.persist()?;
        debug!(session_id = %session_id, elapsed, "timer paused");

        Ok(Some(Event::TimerPaused {
            session_id,
            elapsed_secs: elapsed,
            at,
        }))
    }

    pub fn resume(&mut self, repo: &mut Repository) -> Result<Option<Event>> {
        let Some(session_id) = self.active_session(TimerStatus::Paused) else {
            return Ok(None);
        };
        let paused_at = repo.session(&session_id)?.paused_at;
        if !repo.resume_session(&session_id)? {
            return Ok(None);
        }

        let at = repo.now_ms();
        let paused_ms = paused_at.map(|p| (at - p).max(0)).unwrap_or(0);
        self.state.status = TimerStatus::Running;
        self.persist()?;
        debug!(session_id = %session_id, paused_ms, "timer resumed");

        Ok(Some(Event::TimerResumed {
            session_id,
            paused_ms,
            at,
        }))
    }

    pub fn stop(&mut self, repo: &mut Repository) -> Result<Option<Event>> {
        if !self.state.is_active() {
            return Ok(None);
        }
        let (Some(task_id), Some(session_id)) = (
            self.state.current_task_id.clone(),
            self.state.current_session_id.clone(),
        ) else {
            warn!("active timer without a session, resetting");
            self.clear()?;
            return Ok(None);
        };

        let duration = repo.stop_session(&session_id)?;
        let total = repo.task(&task_id)?.total_time_spent;
        let at = repo.now_ms();
        self.state = TimerState::default();
        self.persist()?;
        debug!(task_id = %task_id, session_id = %session_id, duration, "timer stopped");

        Ok(Some(Event::TimerStopped {
            task_id,
            session_id,
            duration_secs: duration,
            total_time_spent: total,
            at,
        }))
    }

    /// Abandon the active session without recording it.
    ///
    /// The open session is removed from the repository so a later load does
    /// not adopt it again.
    pub fn reset(&mut self, repo: &mut Repository) -> Result<()> {
        if let Some(session_id) = self.state.current_session_id.clone() {
            if repo.discard_session(&session_id)? {
                debug!(session_id = %session_id, "timer reset");
            }
        }
        self.clear()
    }

    /// Drop manager state only. The repository is left as is.
    pub(crate) fn clear(&mut self) -> Result<()> {
        self.state = TimerState::default();
        self.persist()
    }

    /// Display-only elapsed update. Returns `false` (and changes nothing) when idle.
    pub fn update_elapsed_time(&mut self, secs: u64) -> bool {
        if !self.state.is_active() {
            return false;
        }
        self.state.elapsed_time = secs;
        true
    }

    /// Advance the pomodoro cycle: work -> break -> next work session.
    ///
    /// The new phase starts at the session's current elapsed time, read from
    /// its record. No-op for non-pomodoro methods and when idle.
    pub fn handle_pomodoro_state_change(&mut self, repo: &Repository) -> Result<Option<Event>> {
        if !self.state.is_active() || self.state.timer_method != TimerMethod::Pomodoro {
            return Ok(None);
        }

        self.state.elapsed_time = self.live_elapsed_secs(repo);

        let next = self
            .state
            .pomodoro_state
            .advance(self.settings.sessions_before_long_break);
        self.state.pomodoro_state = next;
        self.state.phase_started_at = self.state.elapsed_time;
        self.persist()?;

        let phase_secs = self.target_secs().unwrap_or(0);
        debug!(
            session = next.current_session,
            is_break = next.is_break,
            is_long_break = next.is_long_break,
            "pomodoro phase changed"
        );
        Ok(Some(Event::PomodoroPhaseChanged {
            pomodoro: next,
            phase_secs,
        }))
    }

    /// Bring persisted manager state in line with the repository after a load.
    ///
    /// A state pointing at a missing or completed session is dropped. An idle
    /// manager adopts a session the repository still has open.
    pub fn reconcile(&mut self, repo: &Repository) -> Result<()> {
        if self.state.is_active() {
            match self.current_session(repo) {
                Some(session) if !session.is_completed => {
                    let status = if session.is_paused {
                        TimerStatus::Paused
                    } else {
                        TimerStatus::Running
                    };
                    if status != self.state.status {
                        self.state.status = status;
                        self.persist()?;
                    }
                }
                _ => {
                    warn!(session_id = ?self.state.current_session_id, "dropping stale timer state");
                    self.clear()?;
                }
            }
            return Ok(());
        }

        let open = repo
            .tasks()
            .iter()
            .find_map(|task| task.open_session().map(|s| (task, s)));
        if let Some((task, session)) = open {
            debug!(session_id = %session.id, "adopting open session");
            self.state = TimerState {
                status: if session.is_paused {
                    TimerStatus::Paused
                } else {
                    TimerStatus::Running
                },
                current_task_id: Some(task.id.clone()),
                current_session_id: Some(session.id.clone()),
                elapsed_time: session.duration_at(repo.now_ms()),
                timer_method: task.timer_method,
                pomodoro_state: PomodoroState::default(),
                phase_started_at: 0,
            };
            self.persist()?;
        }
        Ok(())
    }

    fn current_session<'a>(&self, repo: &'a Repository) -> Option<&'a TimerSession> {
        self.state
            .current_session_id
            .as_deref()
            .and_then(|id| repo.session(id).ok())
    }

    fn active_session(&self, status: TimerStatus) -> Option<String> {
        if self.state.status != status {
            return None;
        }
        self.state.current_session_id.clone()
    }

    fn persist(&self) -> Result<()> {
        save_json(self.storage.as_ref(), TIMER_STORAGE_KEY, &self.state)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::task::NewTask;
    use crate::time::ManualClock;

    struct Fixture {
        repo: Repository,
        timer: TimerManager,
        clock: Arc<ManualClock>,
        storage: Arc<MemoryStorage>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let storage = Arc::new(MemoryStorage::new());
        let repo = Repository::load(storage.clone(), clock.clone()).unwrap();
        let timer = TimerManager::load(storage.clone(), TimerConfig::default()).unwrap();
        Fixture {
            repo,
            timer,
            clock,
            storage,
        }
    }

    #[test]
    fn pause_resume_stop_scenario() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("write")).unwrap();

        let started = f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        assert!(matches!(started, Event::TimerStarted { .. }));
        assert_eq!(f.timer.status(), TimerStatus::Running);
        assert!(f.repo.task(&task).unwrap().is_active);

        f.clock.advance_secs(100);
        let paused = f.timer.pause(&mut f.repo).unwrap();
        assert!(matches!(paused, Some(Event::TimerPaused { elapsed_secs: 100, .. })));

        f.clock.advance_secs(30);
        let resumed = f.timer.resume(&mut f.repo).unwrap();
        assert!(matches!(resumed, Some(Event::TimerResumed { paused_ms: 30_000, .. })));

        f.clock.advance_secs(270);
        match f.timer.stop(&mut f.repo).unwrap() {
            Some(Event::TimerStopped {
                duration_secs,
                total_time_spent,
                ..
            }) => {
                assert_eq!(duration_secs, 370);
                assert_eq!(total_time_spent, 370);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(f.timer.status(), TimerStatus::Idle);
        assert!(!f.repo.task(&task).unwrap().is_active);
    }

    #[test]
    fn stop_while_paused_ignores_time_after_pause() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        f.clock.advance_secs(50);
        f.timer.pause(&mut f.repo).unwrap();
        f.clock.advance_secs(500);
        f.timer.stop(&mut f.repo).unwrap();
        assert_eq!(f.repo.task(&task).unwrap().total_time_spent, 50);
    }

    #[test]
    fn wrong_state_transitions_are_silent() {
        let mut f = fixture();
        assert_eq!(f.timer.pause(&mut f.repo).unwrap(), None);
        assert_eq!(f.timer.resume(&mut f.repo).unwrap(), None);
        assert_eq!(f.timer.stop(&mut f.repo).unwrap(), None);

        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        assert_eq!(f.timer.resume(&mut f.repo).unwrap(), None);
        f.timer.pause(&mut f.repo).unwrap();
        assert_eq!(f.timer.pause(&mut f.repo).unwrap(), None);
    }

    #[test]
    fn second_start_is_rejected() {
        let mut f = fixture();
        let a = f.repo.add_task(NewTask::new("a")).unwrap();
        let b = f.repo.add_task(NewTask::new("b")).unwrap();
        f.timer.start(&mut f.repo, &a, TimerMethod::Regular).unwrap();
        let err = f.timer.start(&mut f.repo, &b, TimerMethod::Regular).unwrap_err();
        assert!(matches!(err, CoreError::AlreadyRunning { .. }));
        assert!(f.repo.task(&b).unwrap().sessions.is_empty());
    }

    #[test]
    fn unknown_task_cannot_start() {
        let mut f = fixture();
        assert!(matches!(
            f.timer.start(&mut f.repo, "ghost", TimerMethod::Regular),
            Err(CoreError::NotFound { .. })
        ));
        assert_eq!(f.timer.status(), TimerStatus::Idle);
    }

    #[test]
    fn elapsed_updates_are_ignored_when_idle() {
        let mut f = fixture();
        assert!(!f.timer.update_elapsed_time(42));
        assert_eq!(f.timer.state().elapsed_time, 0);

        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        assert!(f.timer.update_elapsed_time(42));
        f.timer.stop(&mut f.repo).unwrap();
        assert!(!f.timer.update_elapsed_time(43));
        assert_eq!(f.timer.state().elapsed_time, 0);
    }

    #[test]
    fn progress_is_clamped_for_bounded_methods() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::FiveMin).unwrap();

        f.timer.update_elapsed_time(150);
        assert_eq!(f.timer.progress().fraction, Some(0.5));
        assert!(!f.timer.phase_complete());

        f.timer.update_elapsed_time(900);
        let progress = f.timer.progress();
        assert_eq!(progress.target_secs, Some(300));
        assert_eq!(progress.fraction, Some(1.0));
        assert!(f.timer.phase_complete());
    }

    #[test]
    fn regular_progress_has_no_target() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        f.timer.update_elapsed_time(10_000);
        let progress = f.timer.progress();
        assert_eq!(progress.elapsed_secs, 10_000);
        assert_eq!(progress.target_secs, None);
        assert_eq!(progress.fraction, None);
        assert!(!f.timer.phase_complete());
    }

    #[test]
    fn pomodoro_phases_restart_the_phase_clock() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Pomodoro).unwrap();

        f.clock.advance_secs(1500);
        f.timer.update_elapsed_time(1500);
        assert!(f.timer.phase_complete());
        let event = f.timer.handle_pomodoro_state_change(&f.repo).unwrap();
        assert!(matches!(
            event,
            Some(Event::PomodoroPhaseChanged { phase_secs: 300, .. })
        ));
        assert!(f.timer.state().pomodoro_state.is_break);
        assert_eq!(f.timer.progress().elapsed_secs, 0);

        f.timer.update_elapsed_time(1560);
        assert_eq!(f.timer.progress().elapsed_secs, 60);
    }

    #[test]
    fn phase_change_uses_session_time_not_stale_display() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Pomodoro).unwrap();
        f.clock.advance_secs(1500);

        // no tick has refreshed the display value
        let mut reloaded = TimerManager::load(f.storage.clone(), TimerConfig::default()).unwrap();
        reloaded.reconcile(&f.repo).unwrap();
        assert_eq!(reloaded.state().elapsed_time, 0);

        reloaded.handle_pomodoro_state_change(&f.repo).unwrap();
        assert_eq!(reloaded.state().phase_started_at, 1500);
        reloaded.update_elapsed_time(reloaded.live_elapsed_secs(&f.repo));
        let progress = reloaded.progress();
        assert_eq!(progress.elapsed_secs, 0);
        assert_eq!(progress.target_secs, Some(300));
        assert_eq!(progress.fraction, Some(0.0));
        assert!(!reloaded.phase_complete());
    }

    #[test]
    fn phase_change_is_noop_for_other_methods() {
        let mut f = fixture();
        assert_eq!(f.timer.handle_pomodoro_state_change(&f.repo).unwrap(), None);
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::FiveMin).unwrap();
        assert_eq!(f.timer.handle_pomodoro_state_change(&f.repo).unwrap(), None);
    }

    #[test]
    fn state_survives_reload_and_reconciles() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        f.clock.advance_secs(20);

        let mut reloaded = TimerManager::load(f.storage.clone(), TimerConfig::default()).unwrap();
        reloaded.reconcile(&f.repo).unwrap();
        assert_eq!(reloaded.status(), TimerStatus::Running);
        assert_eq!(reloaded.live_elapsed_secs(&f.repo), 20);
        reloaded.stop(&mut f.repo).unwrap();
        assert_eq!(f.repo.task(&task).unwrap().total_time_spent, 20);
    }

    #[test]
    fn reconcile_drops_state_for_deleted_task() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        f.repo.delete_task(&task).unwrap();

        f.timer.reconcile(&f.repo).unwrap();
        assert_eq!(f.timer.status(), TimerStatus::Idle);
        assert_eq!(f.timer.current_session_id(), None);
    }

    #[test]
    fn idle_manager_adopts_orphaned_open_session() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();

        // timer state lost, session still open in the repository
        let mut fresh = TimerManager::load(Arc::new(MemoryStorage::new()), TimerConfig::default()).unwrap();
        assert_eq!(fresh.status(), TimerStatus::Idle);
        fresh.reconcile(&f.repo).unwrap();
        assert_eq!(fresh.status(), TimerStatus::Running);
        assert_eq!(fresh.current_task_id(), Some(task.as_str()));
    }

    #[test]
    fn reset_discards_the_open_session() {
        let mut f = fixture();
        let task = f.repo.add_task(NewTask::new("x")).unwrap();
        f.timer.start(&mut f.repo, &task, TimerMethod::Regular).unwrap();
        f.clock.advance_secs(60);
        f.timer.reset(&mut f.repo).unwrap();
        assert_eq!(f.timer.status(), TimerStatus::Idle);

        f.clock.advance_secs(3600);
        let mut reloaded = TimerManager::load(f.storage.clone(), TimerConfig::default()).unwrap();
        reloaded.reconcile(&f.repo).unwrap();
        assert_eq!(reloaded.status(), TimerStatus::Idle);
        assert_eq!(reloaded.stop(&mut f.repo).unwrap(), None);

        let task = f.repo.task(&task).unwrap();
        assert!(!task.is_active);
        assert!(task.sessions.is_empty());
        assert_eq!(task.total_time_spent, 0);
    }
}
