//! Task/category repository.
//!
//! Owns every task, category and timer session. The whole collection lives
//! in one document under [`TASK_STORAGE_KEY`] and is written back after each
//! mutation. Mutations are applied to a copy and only swapped in once the
//! write succeeded, so a failed save leaves the in-memory state untouched.
//!
//! Invariant: for every task, `total_time_spent` equals the sum of the
//! durations of its completed sessions.

mod queries;

pub use queries::Summary;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};
use uuid::Uuid;

use crate::error::{CoreError, EntityKind, Result};
use crate::storage::{load_json, save_json, SharedStorage};
use crate::task::{
    default_categories, Category, CategoryUpdate, NewCategory, NewTask, Task, TaskUpdate,
    TimerSession,
};
use crate::time::SharedClock;

pub const TASK_STORAGE_KEY: &str = "task-storage";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct TaskDocument {
    #[serde(default)]
    tasks: Vec<Task>,
    #[serde(default = "default_categories")]
    categories: Vec<Category>,
}

impl Default for TaskDocument {
    fn default() -> Self {
        Self {
            tasks: Vec::new(),
            categories: default_categories(),
        }
    }
}

pub struct Repository {
    storage: SharedStorage,
    clock: SharedClock,
    doc: TaskDocument,
}

impl Repository {
    /// Load the persisted collection, seeding the default categories on first run.
    pub fn load(storage: SharedStorage, clock: SharedClock) -> Result<Self> {
        let doc = match load_json::<TaskDocument>(storage.as_ref(), TASK_STORAGE_KEY)? {
            Some(doc) => doc,
            None => {
                let doc = TaskDocument::default();
                save_json(storage.as_ref(), TASK_STORAGE_KEY, &doc)?;
                debug!("seeded {} default categories", doc.categories.len());
                doc
            }
        };
        Ok(Self {
            storage,
            clock,
            doc,
        })
    }

    pub(crate) fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    // ── Reads ────────────────────────────────────────────────────────

    pub fn tasks(&self) -> &[Task] {
        &self.doc.tasks
    }

    pub fn categories(&self) -> &[Category] {
        &self.doc.categories
    }

    pub fn find_task(&self, id: &str) -> Option<&Task> {
        self.doc.tasks.iter().find(|t| t.id == id)
    }

    pub fn task(&self, id: &str) -> Result<&Task> {
        self.find_task(id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Task, id))
    }

    pub fn category(&self, id: &str) -> Result<&Category> {
        self.doc
            .categories
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| CoreError::not_found(EntityKind::Category, id))
    }

    pub fn session(&self, session_id: &str) -> Result<&TimerSession> {
        self.doc
            .tasks
            .iter()
            .find_map(|t| t.session(session_id))
            .ok_or_else(|| CoreError::not_found(EntityKind::Session, session_id))
    }

    // ── Tasks ────────────────────────────────────────────────────────

    pub fn add_task(&mut self, input: NewTask) -> Result<String> {
        let name = validate_name(&input.name)?;
        let category_id = match input.category_id {
            Some(id) => self.category(&id)?.id.clone(),
            None => self
                .doc
                .categories
                .first()
                .map(|c| c.id.clone())
                .ok_or_else(|| CoreError::invalid("categoryId", "no categories exist"))?,
        };

        let now = self.now_ms();
        let task = Task {
            id: Uuid::new_v4().to_string(),
            name,
            description: input.description.filter(|d| !d.trim().is_empty()),
            category_id,
            timer_method: input.timer_method,
            total_time_spent: 0,
            is_active: false,
            created_at: now,
            updated_at: now,
            sessions: Vec::new(),
        };
        let id = task.id.clone();

        self.commit(|doc| {
            doc.tasks.push(task);
            Ok(())
        })?;
        debug!(task_id = %id, "task added");
        Ok(id)
    }

    pub fn update_task(&mut self, id: &str, update: TaskUpdate) -> Result<()> {
        self.task(id)?;
        let name = update.name.as_deref().map(validate_name).transpose()?;
        if let Some(category_id) = update.category_id.as_deref() {
            self.category(category_id)?;
        }

        let now = self.now_ms();
        self.commit(|doc| {
            let task = task_mut(doc, id)?;
            if let Some(name) = name {
                task.name = name;
            }
            if let Some(description) = update.description {
                task.description = description.filter(|d| !d.trim().is_empty());
            }
            if let Some(category_id) = update.category_id {
                task.category_id = category_id;
            }
            if let Some(method) = update.timer_method {
                task.timer_method = method;
            }
            task.updated_at = now;
            Ok(())
        })
    }

    /// Remove a task and its sessions. Returns `false` if there was nothing to remove.
    pub fn delete_task(&mut self, id: &str) -> Result<bool> {
        if self.find_task(id).is_none() {
            return Ok(false);
        }
        self.commit(|doc| {
            doc.tasks.retain(|t| t.id != id);
            Ok(())
        })?;
        debug!(task_id = %id, "task deleted");
        Ok(true)
    }

    // ── Categories ───────────────────────────────────────────────────

    pub fn add_category(&mut self, input: NewCategory) -> Result<String> {
        let category = Category {
            id: Uuid::new_v4().to_string(),
            name: validate_name(&input.name)?,
            color: input.color,
            icon: input.icon,
            is_custom: true,
        };
        let id = category.id.clone();
        self.commit(|doc| {
            doc.categories.push(category);
            Ok(())
        })?;
        Ok(id)
    }

    pub fn update_category(&mut self, id: &str, update: CategoryUpdate) -> Result<()> {
        self.category(id)?;
        let name = update.name.as_deref().map(validate_name).transpose()?;
        self.commit(|doc| {
            let category = doc
                .categories
                .iter_mut()
                .find(|c| c.id == id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Category, id))?;
            if let Some(name) = name {
                category.name = name;
            }
            if let Some(color) = update.color {
                category.color = color;
            }
            if let Some(icon) = update.icon {
                category.icon = icon;
            }
            Ok(())
        })
    }

    /// Delete a custom category. Tasks that used it move to the first default category.
    ///
    /// # Errors
    /// `Forbidden` for default categories, `NotFound` for unknown ids.
    pub fn delete_category(&mut self, id: &str) -> Result<()> {
        let category = self.category(id)?;
        if !category.is_custom {
            warn!(category_id = %id, "refusing to delete default category");
            return Err(CoreError::Forbidden(format!(
                "default category '{id}' cannot be deleted"
            )));
        }

        let fallback = self
            .doc
            .categories
            .iter()
            .find(|c| !c.is_custom)
            .or_else(|| self.doc.categories.iter().find(|c| c.id != id))
            .map(|c| c.id.clone());
        let now = self.now_ms();

        self.commit(|doc| {
            doc.categories.retain(|c| c.id != id);
            if let Some(fallback) = &fallback {
                for task in doc.tasks.iter_mut().filter(|t| t.category_id == id) {
                    task.category_id = fallback.clone();
                    task.updated_at = now;
                }
            }
            Ok(())
        })?;
        debug!(category_id = %id, reassigned_to = ?fallback, "category deleted");
        Ok(())
    }

    // ── Sessions ─────────────────────────────────────────────────────

    /// Open a new session on `task_id` and mark the task active.
    pub(crate) fn start_session(&mut self, task_id: &str) -> Result<String> {
        self.task(task_id)?;
        let session = TimerSession::begin(task_id, self.now_ms());
        let session_id = session.id.clone();
        self.commit(|doc| {
            let task = task_mut(doc, task_id)?;
            task.is_active = true;
            task.sessions.push(session);
            Ok(())
        })?;
        Ok(session_id)
    }

    /// Returns `false` when the session was not in a pausable state.
    pub(crate) fn pause_session(&mut self, session_id: &str) -> Result<bool> {
        let now = self.now_ms();
        self.update_session(session_id, |session| Ok(session.pause(now)))
    }

    /// Returns `false` when the session was not paused.
    pub(crate) fn resume_session(&mut self, session_id: &str) -> Result<bool> {
        let now = self.now_ms();
        self.update_session(session_id, |session| Ok(session.resume(now)))
    }

    /// Complete the session and fold its duration into the task total.
    ///
    /// Stopping an already completed session returns its recorded duration
    /// without counting it twice.
    pub(crate) fn stop_session(&mut self, session_id: &str) -> Result<u64> {
        let existing = self.session(session_id)?;
        if existing.is_completed {
            return Ok(existing.duration);
        }
        let task_id = existing.task_id.clone();
        let now = self.now_ms();

        let mut duration = 0;
        self.commit(|doc| {
            let task = task_mut(doc, &task_id)?;
            let session = task
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Session, session_id))?;
            duration = session.complete(now);
            task.total_time_spent += duration;
            task.is_active = false;
            task.updated_at = now;
            Ok(())
        })?;
        Ok(duration)
    }

    /// Drop an open session without recording it and deactivate its task.
    ///
    /// Returns `false` for a missing or already completed session.
    pub(crate) fn discard_session(&mut self, session_id: &str) -> Result<bool> {
        let Ok(existing) = self.session(session_id) else {
            return Ok(false);
        };
        if existing.is_completed {
            return Ok(false);
        }
        let task_id = existing.task_id.clone();
        let now = self.now_ms();

        self.commit(|doc| {
            let task = task_mut(doc, &task_id)?;
            task.sessions.retain(|s| s.id != session_id);
            task.is_active = false;
            task.updated_at = now;
            Ok(())
        })?;
        debug!(task_id = %task_id, session_id, "session discarded");
        Ok(true)
    }

    fn update_session<F>(&mut self, session_id: &str, apply: F) -> Result<bool>
    where
        F: FnOnce(&mut TimerSession) -> Result<bool>,
    {
        let task_id = self.session(session_id)?.task_id.clone();
        let mut changed = false;
        self.commit(|doc| {
            let session = task_mut(doc, &task_id)?
                .sessions
                .iter_mut()
                .find(|s| s.id == session_id)
                .ok_or_else(|| CoreError::not_found(EntityKind::Session, session_id))?;
            changed = apply(session)?;
            Ok(())
        })?;
        Ok(changed)
    }

    /// Apply `mutate` to a copy of the document, persist it, then swap it in.
    fn commit<F>(&mut self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut TaskDocument) -> Result<()>,
    {
        let mut next = self.doc.clone();
        mutate(&mut next)?;
        save_json(self.storage.as_ref(), TASK_STORAGE_KEY, &next)?;
        self.doc = next;
        Ok(())
    }
}

fn task_mut<'a>(doc: &'a mut TaskDocument, id: &str) -> Result<&'a mut Task> {
    doc.tasks
        .iter_mut()
        .find(|t| t.id == id)
        .ok_or_else(|| CoreError::not_found(EntityKind::Task, id))
}

fn validate_name(name: &str) -> Result<String> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(CoreError::invalid("name", "must not be empty"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemoryStorage, Storage};
    use crate::task::{CategoryColor, TimerMethod};
    use crate::time::{Clock, ManualClock};
    use std::sync::Arc;

    fn repo() -> (Repository, Arc<ManualClock>, Arc<MemoryStorage>) {
        let clock = Arc::new(ManualClock::new(1_700_000_000_000));
        let storage = Arc::new(MemoryStorage::new());
        let repo = Repository::load(storage.clone(), clock.clone()).unwrap();
        (repo, clock, storage)
    }

    fn custom(name: &str) -> NewCategory {
        NewCategory {
            name: name.into(),
            color: CategoryColor::new("#000000", "#FFFFFF"),
            icon: "🎯".into(),
        }
    }

    fn assert_totals_consistent(repo: &Repository) {
        for task in repo.tasks() {
            assert_eq!(task.total_time_spent, task.recorded_time(), "task {}", task.id);
        }
    }

    #[test]
    fn first_load_seeds_and_persists_defaults() {
        let (repo, _, storage) = repo();
        assert_eq!(repo.categories().len(), 6);
        assert!(storage.load(TASK_STORAGE_KEY).unwrap().is_some());
    }

    #[test]
    fn add_task_defaults() {
        let (mut repo, clock, _) = repo();
        let id = repo.add_task(NewTask::new("  Write report  ")).unwrap();
        let task = repo.task(&id).unwrap();
        assert_eq!(task.name, "Write report");
        assert_eq!(task.category_id, "work");
        assert_eq!(task.total_time_spent, 0);
        assert!(!task.is_active);
        assert!(task.sessions.is_empty());
        assert_eq!(task.created_at, clock.now_ms());
        assert_eq!(task.updated_at, clock.now_ms());
    }

    #[test]
    fn add_task_validates_input() {
        let (mut repo, _, _) = repo();
        assert!(matches!(
            repo.add_task(NewTask::new("   ")),
            Err(CoreError::InvalidInput { .. })
        ));
        assert!(matches!(
            repo.add_task(NewTask::new("x").with_category("nope")),
            Err(CoreError::NotFound { kind: EntityKind::Category, .. })
        ));
        assert!(repo.tasks().is_empty());
    }

    #[test]
    fn update_task_merges_named_fields_only() {
        let (mut repo, clock, _) = repo();
        let id = repo
            .add_task(NewTask::new("Read").with_category("reading").with_description("ch. 3"))
            .unwrap();
        clock.advance_secs(5);
        repo.update_task(
            &id,
            TaskUpdate {
                timer_method: Some(TimerMethod::Pomodoro),
                ..TaskUpdate::default()
            },
        )
        .unwrap();
        let task = repo.task(&id).unwrap();
        assert_eq!(task.name, "Read");
        assert_eq!(task.description.as_deref(), Some("ch. 3"));
        assert_eq!(task.timer_method, TimerMethod::Pomodoro);
        assert_eq!(task.updated_at, task.created_at + 5_000);

        repo.update_task(
            &id,
            TaskUpdate {
                description: Some(None),
                ..TaskUpdate::default()
            },
        )
        .unwrap();
        assert!(repo.task(&id).unwrap().description.is_none());
    }

    #[test]
    fn update_task_errors() {
        let (mut repo, _, _) = repo();
        assert!(matches!(
            repo.update_task("missing", TaskUpdate::default()),
            Err(CoreError::NotFound { kind: EntityKind::Task, .. })
        ));
        let id = repo.add_task(NewTask::new("x")).unwrap();
        let bad = TaskUpdate {
            category_id: Some("ghost".into()),
            ..TaskUpdate::default()
        };
        assert!(repo.update_task(&id, bad).is_err());
        assert_eq!(repo.task(&id).unwrap().category_id, "work");
    }

    #[test]
    fn delete_task_is_idempotent() {
        let (mut repo, _, _) = repo();
        let id = repo.add_task(NewTask::new("x")).unwrap();
        assert!(repo.delete_task(&id).unwrap());
        assert!(!repo.delete_task(&id).unwrap());
        assert!(repo.find_task(&id).is_none());
    }

    #[test]
    fn default_category_cannot_be_deleted() {
        let (mut repo, _, _) = repo();
        let before = repo.categories().to_vec();
        assert!(matches!(repo.delete_category("work"), Err(CoreError::Forbidden(_))));
        assert_eq!(repo.categories(), before.as_slice());
    }

    #[test]
    fn deleting_custom_category_reassigns_tasks() {
        let (mut repo, _, _) = repo();
        let cat = repo.add_category(custom("Side project")).unwrap();
        assert!(repo.category(&cat).unwrap().is_custom);
        let task = repo.add_task(NewTask::new("Ship it").with_category(&cat)).unwrap();

        repo.delete_category(&cat).unwrap();
        assert!(repo.category(&cat).is_err());
        assert_eq!(repo.categories().len(), 6);
        assert_eq!(repo.task(&task).unwrap().category_id, "work");
        assert!(matches!(
            repo.delete_category(&cat),
            Err(CoreError::NotFound { kind: EntityKind::Category, .. })
        ));
    }

    #[test]
    fn update_category_keeps_custom_flag() {
        let (mut repo, _, _) = repo();
        repo.update_category(
            "work",
            CategoryUpdate {
                name: Some("Job".into()),
                ..CategoryUpdate::default()
            },
        )
        .unwrap();
        let work = repo.category("work").unwrap();
        assert_eq!(work.name, "Job");
        assert!(!work.is_custom);
        assert!(repo.update_category("ghost", CategoryUpdate::default()).is_err());
    }

    #[test]
    fn session_primitives_keep_total_consistent() {
        let (mut repo, clock, _) = repo();
        let id = repo.add_task(NewTask::new("x")).unwrap();

        let s1 = repo.start_session(&id).unwrap();
        assert!(repo.task(&id).unwrap().is_active);
        clock.advance_secs(100);
        assert!(repo.pause_session(&s1).unwrap());
        assert!(!repo.pause_session(&s1).unwrap());
        clock.advance_secs(30);
        assert!(repo.resume_session(&s1).unwrap());
        clock.advance_secs(270);
        assert_eq!(repo.stop_session(&s1).unwrap(), 370);
        assert_totals_consistent(&repo);

        // stopping twice does not double count
        assert_eq!(repo.stop_session(&s1).unwrap(), 370);
        assert_eq!(repo.task(&id).unwrap().total_time_spent, 370);
        assert!(!repo.task(&id).unwrap().is_active);

        let s2 = repo.start_session(&id).unwrap();
        clock.advance_secs(30);
        repo.stop_session(&s2).unwrap();
        assert_eq!(repo.task(&id).unwrap().total_time_spent, 400);
        assert_totals_consistent(&repo);
    }

    #[test]
    fn discarding_an_open_session_records_nothing() {
        let (mut repo, clock, _) = repo();
        let id = repo.add_task(NewTask::new("x")).unwrap();
        let done = repo.start_session(&id).unwrap();
        clock.advance_secs(40);
        repo.stop_session(&done).unwrap();

        let open = repo.start_session(&id).unwrap();
        clock.advance_secs(60);
        assert!(repo.discard_session(&open).unwrap());
        let task = repo.task(&id).unwrap();
        assert!(!task.is_active);
        assert_eq!(task.sessions.len(), 1);
        assert_eq!(task.total_time_spent, 40);
        assert_totals_consistent(&repo);

        // completed and unknown sessions are left alone
        assert!(!repo.discard_session(&done).unwrap());
        assert!(!repo.discard_session("nope").unwrap());
        assert_eq!(repo.task(&id).unwrap().sessions.len(), 1);
    }

    #[test]
    fn unknown_session_is_not_found() {
        let (mut repo, _, _) = repo();
        assert!(matches!(
            repo.pause_session("nope"),
            Err(CoreError::NotFound { kind: EntityKind::Session, .. })
        ));
        assert!(repo.stop_session("nope").is_err());
    }

    #[test]
    fn state_survives_reload() {
        let (mut repo, clock, storage) = repo();
        let id = repo.add_task(NewTask::new("persist me")).unwrap();
        let cat = repo.add_category(custom("Mine")).unwrap();

        let reloaded = Repository::load(storage, clock).unwrap();
        assert_eq!(reloaded.task(&id).unwrap().name, "persist me");
        assert!(reloaded.category(&cat).unwrap().is_custom);
    }
}
