//! Achievement evaluation.
//!
//! The catalog is static. Persisted state is only the set of unlocked ids
//! (with their unlock time) and the last recorded progress of each entry.
//! Unlocking is monotonic: once unlocked an entry is never re-evaluated, so
//! its progress stays frozen even if the underlying metric drops.

mod catalog;

pub use catalog::{find, AchievementDef, AchievementLevel, AchievementType, Metric, ACHIEVEMENTS};

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::Result;
use crate::events::Event;
use crate::repository::Repository;
use crate::storage::{load_json, save_json, SharedStorage};
use crate::streak::StreakTracker;
use crate::time::SharedClock;

pub const ACHIEVEMENT_STORAGE_KEY: &str = "achievement-storage";

/// Snapshot of every value the catalog is measured against.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementMetrics {
    pub completed_tasks: u64,
    pub total_time_spent: u64,
    pub current_streak: u64,
    pub used_categories: u64,
    pub custom_categories: u64,
}

impl AchievementMetrics {
    pub fn collect(repo: &Repository, streak: &StreakTracker) -> Self {
        Self {
            completed_tasks: repo.tasks_with_completed_sessions() as u64,
            total_time_spent: repo.total_time_spent(),
            current_streak: u64::from(streak.current_streak()),
            used_categories: repo.used_category_ids().len() as u64,
            custom_categories: repo.custom_categories_count() as u64,
        }
    }

    pub fn value(&self, metric: Metric) -> u64 {
        match metric {
            Metric::CompletedTasks => self.completed_tasks,
            Metric::TotalTimeSpent => self.total_time_spent,
            Metric::CurrentStreak => self.current_streak,
            Metric::UsedCategories => self.used_categories,
            Metric::CustomCategories => self.custom_categories,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AchievementState {
    /// id -> unlock time (epoch ms)
    #[serde(default)]
    unlocked: BTreeMap<String, i64>,
    #[serde(default)]
    progress: BTreeMap<String, u64>,
}

/// Catalog entry joined with its persisted state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AchievementView {
    #[serde(flatten)]
    pub def: AchievementDef,
    pub unlocked: bool,
    pub progress: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<i64>,
}

impl AchievementView {
    pub fn id(&self) -> &'static str {
        self.def.id
    }
}

pub struct AchievementEngine {
    storage: SharedStorage,
    clock: SharedClock,
    state: AchievementState,
}

impl AchievementEngine {
    pub fn load(storage: SharedStorage, clock: SharedClock) -> Result<Self> {
        let state = load_json::<AchievementState>(storage.as_ref(), ACHIEVEMENT_STORAGE_KEY)?.unwrap_or_default();
        Ok(Self {
            storage,
            clock,
            state,
        })
    }

    pub fn is_unlocked(&self, id: &str) -> bool {
        self.state.unlocked.contains_key(id)
    }

    /// Re-evaluate every locked entry against `metrics`.
    ///
    /// Returns the entries unlocked by this pass. Progress of locked entries is
    /// overwritten with the current metric value.
    pub fn check(&mut self, metrics: &AchievementMetrics) -> Result<Vec<AchievementView>> {
        let now = self.clock.now_ms();
        let mut next = self.state.clone();
        let mut newly = Vec::new();

        for def in ACHIEVEMENTS {
            if next.unlocked.contains_key(def.id) {
                continue;
            }
            let value = metrics.value(def.metric);
            next.progress.insert(def.id.to_string(), value);
            if value >= def.requirement {
                next.unlocked.insert(def.id.to_string(), now);
                newly.push(def.id);
            }
        }

        if next != self.state {
            save_json(self.storage.as_ref(), ACHIEVEMENT_STORAGE_KEY, &next)?;
            self.state = next;
        }

        Ok(newly
            .into_iter()
            .filter_map(find)
            .map(|def| {
                info!(id = def.id, level = ?def.level, "achievement unlocked");
                self.view(def)
            })
            .collect())
    }

    /// The full catalog joined with unlock state and progress.
    pub fn achievements(&self) -> Vec<AchievementView> {
        ACHIEVEMENTS.iter().map(|def| self.view(def)).collect()
    }

    pub fn unlocked_count(&self) -> usize {
        self.state.unlocked.len()
    }

    pub fn reset(&mut self) -> Result<()> {
        let next = AchievementState::default();
        save_json(self.storage.as_ref(), ACHIEVEMENT_STORAGE_KEY, &next)?;
        self.state = next;
        Ok(())
    }

    fn view(&self, def: &AchievementDef) -> AchievementView {
        let unlocked_at = self.state.unlocked.get(def.id).copied();
        AchievementView {
            def: *def,
            unlocked: unlocked_at.is_some(),
            progress: self.state.progress.get(def.id).copied().unwrap_or(0),
            unlocked_at,
        }
    }
}

impl From<&AchievementView> for Event {
    fn from(view: &AchievementView) -> Self {
        Event::AchievementUnlocked {
            id: view.def.id.to_string(),
            title: view.def.title.to_string(),
            level: view.def.level,
            at: view.unlocked_at.unwrap_or_default(),
        }
    }
}
