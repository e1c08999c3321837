//! Aggregate queries over the session history.
//!
//! Every query is a full scan recomputed on demand. Only completed sessions
//! count, and a session belongs to the local calendar day of its start time.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use super::Repository;
use crate::task::{Task, TimerSession};
use crate::time::{day_key_for, local_date, week_start};

/// Everything the stats screen shows, computed in one pass per field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub day: String,
    pub total_time_today: u64,
    pub completed_tasks_today: usize,
    pub total_time_spent: u64,
    pub tasks_with_completed_sessions: usize,
    pub completed_sessions: usize,
    pub used_categories: usize,
    pub custom_categories: usize,
}

impl Repository {
    /// Local calendar date of the repository clock.
    pub fn today(&self) -> NaiveDate {
        local_date(self.now_ms())
    }

    fn completed_sessions(&self) -> impl Iterator<Item = (&Task, &TimerSession)> {
        self.tasks()
            .iter()
            .flat_map(|task| task.completed_sessions().map(move |s| (task, s)))
    }

    /// Seconds recorded today.
    pub fn total_time_today(&self) -> u64 {
        self.time_spent_on_day(self.today())
    }

    /// Distinct tasks with at least one session completed today.
    pub fn completed_tasks_today(&self) -> usize {
        let today = self.today();
        self.tasks()
            .iter()
            .filter(|task| {
                task.completed_sessions()
                    .any(|s| local_date(s.start_time) == today)
            })
            .count()
    }

    pub fn time_spent_on_day(&self, date: NaiveDate) -> u64 {
        self.completed_sessions()
            .filter(|(_, s)| local_date(s.start_time) == date)
            .map(|(_, s)| s.duration)
            .sum()
    }

    /// Seconds per day for the Sunday-to-Saturday week containing `date`.
    ///
    /// All seven day keys are present, zero-filled.
    pub fn time_spent_by_week(&self, date: NaiveDate) -> BTreeMap<String, u64> {
        let start = week_start(date);
        let mut days: BTreeMap<String, u64> = (0..7)
            .map(|i| (day_key_for(start + Duration::days(i)), 0))
            .collect();

        for (_, session) in self.completed_sessions() {
            let key = day_key_for(local_date(session.start_time));
            if let Some(total) = days.get_mut(&key) {
                *total += session.duration;
            }
        }
        days
    }

    /// Tasks with any session (completed or not) started on `date`.
    pub fn tasks_by_day(&self, date: NaiveDate) -> Vec<&Task> {
        self.tasks()
            .iter()
            .filter(|task| {
                task.sessions
                    .iter()
                    .any(|s| local_date(s.start_time) == date)
            })
            .collect()
    }

    /// Category ids of tasks that have at least one completed session, sorted.
    pub fn used_category_ids(&self) -> Vec<String> {
        self.tasks()
            .iter()
            .filter(|task| task.has_completed_session())
            .map(|task| task.category_id.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn custom_categories_count(&self) -> usize {
        self.categories().iter().filter(|c| c.is_custom).count()
    }

    /// Sum of every task's cached total, in seconds.
    pub fn total_time_spent(&self) -> u64 {
        self.tasks().iter().map(|t| t.total_time_spent).sum()
    }

    pub fn tasks_with_completed_sessions(&self) -> usize {
        self.tasks()
            .iter()
            .filter(|t| t.has_completed_session())
            .count()
    }

    pub fn summary(&self) -> Summary {
        Summary {
            day: day_key_for(self.today()),
            total_time_today: self.total_time_today(),
            completed_tasks_today: self.completed_tasks_today(),
            total_time_spent: self.total_time_spent(),
            tasks_with_completed_sessions: self.tasks_with_completed_sessions(),
            completed_sessions: self.completed_sessions().count(),
            used_categories: self.used_category_ids().len(),
            custom_categories: self.custom_categories_count(),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::storage::MemoryStorage;
    use crate::task::{CategoryColor, NewCategory, NewTask};
    use crate::time::{Clock, ManualClock};

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    struct Fixture {
        repo: Repository,
        clock: Arc<ManualClock>,
    }

    impl Fixture {
        // Wednesday
        fn new() -> Self {
            let clock = Arc::new(ManualClock::at_local_date(date(2024, 5, 15)));
            let repo = Repository::load(Arc::new(MemoryStorage::new()), clock.clone()).unwrap();
            Self { repo, clock }
        }

        fn record(&mut self, task_id: &str, secs: i64) {
            let session = self.repo.start_session(task_id).unwrap();
            self.clock.advance_secs(secs);
            self.repo.stop_session(&session).unwrap();
        }
    }

    #[test]
    fn today_totals_ignore_open_sessions_and_other_days() {
        let mut f = Fixture::new();
        let a = f.repo.add_task(NewTask::new("a")).unwrap();
        let b = f.repo.add_task(NewTask::new("b").with_category("code")).unwrap();
        let c = f.repo.add_task(NewTask::new("c")).unwrap();

        f.record(&a, 60);
        f.record(&a, 30);
        f.record(&b, 10);
        // open session on c does not count
        f.repo.start_session(&c).unwrap();

        assert_eq!(f.repo.total_time_today(), 100);
        assert_eq!(f.repo.completed_tasks_today(), 2);
        assert_eq!(f.repo.tasks_by_day(f.repo.today()).len(), 3);

        f.clock.advance_days(1);
        assert_eq!(f.repo.total_time_today(), 0);
        assert_eq!(f.repo.completed_tasks_today(), 0);
        assert_eq!(f.repo.time_spent_on_day(date(2024, 5, 15)), 100);
    }

    #[test]
    fn week_is_zero_filled_sunday_to_saturday() {
        let mut f = Fixture::new();
        let a = f.repo.add_task(NewTask::new("a")).unwrap();
        f.record(&a, 120);
        f.clock.advance_days(2); // Friday
        f.record(&a, 45);
        f.clock.advance_days(2); // next Sunday, outside the week
        f.record(&a, 999);

        let week = f.repo.time_spent_by_week(date(2024, 5, 15));
        assert_eq!(week.len(), 7);
        assert_eq!(week.keys().next().map(String::as_str), Some("2024-05-12"));
        assert_eq!(week["2024-05-15"], 120);
        assert_eq!(week["2024-05-17"], 45);
        assert_eq!(week["2024-05-18"], 0);
        assert_eq!(week.values().sum::<u64>(), 165);
    }

    #[test]
    fn used_categories_need_completed_sessions() {
        let mut f = Fixture::new();
        let a = f.repo.add_task(NewTask::new("a").with_category("sport")).unwrap();
        let b = f.repo.add_task(NewTask::new("b").with_category("code")).unwrap();
        f.repo.add_task(NewTask::new("idle").with_category("study")).unwrap();
        f.record(&a, 5);
        f.record(&b, 5);
        f.record(&a, 5);

        assert_eq!(f.repo.used_category_ids(), vec!["code".to_string(), "sport".to_string()]);
        assert_eq!(f.repo.tasks_with_completed_sessions(), 2);
        assert_eq!(f.repo.total_time_spent(), 15);
    }

    #[test]
    fn summary_collects_all_counters() {
        let mut f = Fixture::new();
        f.repo
            .add_category(NewCategory {
                name: "Garden".into(),
                color: CategoryColor::new("#00FF00", "#000000"),
                icon: "🌻".into(),
            })
            .unwrap();
        let a = f.repo.add_task(NewTask::new("a")).unwrap();
        f.record(&a, 90);

        let summary = f.repo.summary();
        assert_eq!(summary.day, "2024-05-15");
        assert_eq!(summary.total_time_today, 90);
        assert_eq!(summary.completed_sessions, 1);
        assert_eq!(summary.used_categories, 1);
        assert_eq!(summary.custom_categories, 1);
        assert_eq!(f.clock.now_ms() - f.repo.task(&a).unwrap().created_at, 90_000);
    }
}
