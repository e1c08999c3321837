use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementType {
    Task,
    Time,
    Streak,
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AchievementLevel {
    Bronze,
    Silver,
    Gold,
    Platinum,
}

/// The measurement an achievement's requirement is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    /// Tasks with at least one completed session.
    CompletedTasks,
    /// Sum of every task's total, in seconds.
    TotalTimeSpent,
    CurrentStreak,
    /// Distinct categories of tasks with completed sessions.
    UsedCategories,
    CustomCategories,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AchievementDef {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    #[serde(rename = "type")]
    pub kind: AchievementType,
    pub level: AchievementLevel,
    pub requirement: u64,
    #[serde(skip)]
    pub metric: Metric,
}

const HOUR: u64 = 60 * 60;

pub static ACHIEVEMENTS: &[AchievementDef] = &[
    AchievementDef {
        id: "first_task",
        title: "First Step",
        description: "Complete your first task",
        icon: "🎯",
        kind: AchievementType::Task,
        level: AchievementLevel::Bronze,
        requirement: 1,
        metric: Metric::CompletedTasks,
    },
    AchievementDef {
        id: "task_master",
        title: "Task Master",
        description: "Complete 50 tasks",
        icon: "✅",
        kind: AchievementType::Task,
        level: AchievementLevel::Silver,
        requirement: 50,
        metric: Metric::CompletedTasks,
    },
    AchievementDef {
        id: "task_champion",
        title: "Task Champion",
        description: "Complete 200 tasks",
        icon: "🏆",
        kind: AchievementType::Task,
        level: AchievementLevel::Gold,
        requirement: 200,
        metric: Metric::CompletedTasks,
    },
    AchievementDef {
        id: "time_tracker",
        title: "Timekeeper",
        description: "Track 1 hour of time",
        icon: "⏱️",
        kind: AchievementType::Time,
        level: AchievementLevel::Bronze,
        requirement: HOUR,
        metric: Metric::TotalTimeSpent,
    },
    AchievementDef {
        id: "time_wizard",
        title: "Time Wizard",
        description: "Track 10 hours of time",
        icon: "🧙",
        kind: AchievementType::Time,
        level: AchievementLevel::Silver,
        requirement: 10 * HOUR,
        metric: Metric::TotalTimeSpent,
    },
    AchievementDef {
        id: "time_lord",
        title: "Time Lord",
        description: "Track 50 hours of time",
        icon: "⌛",
        kind: AchievementType::Time,
        level: AchievementLevel::Gold,
        requirement: 50 * HOUR,
        metric: Metric::TotalTimeSpent,
    },
    AchievementDef {
        id: "first_streak",
        title: "Habit Forming",
        description: "Use the app 3 days in a row",
        icon: "🔥",
        kind: AchievementType::Streak,
        level: AchievementLevel::Bronze,
        requirement: 3,
        metric: Metric::CurrentStreak,
    },
    AchievementDef {
        id: "weekly_streak",
        title: "Weekly Habit",
        description: "Use the app 7 days in a row",
        icon: "📅",
        kind: AchievementType::Streak,
        level: AchievementLevel::Silver,
        requirement: 7,
        metric: Metric::CurrentStreak,
    },
    AchievementDef {
        id: "monthly_streak",
        title: "Monthly Habit",
        description: "Use the app 30 days in a row",
        icon: "📆",
        kind: AchievementType::Streak,
        level: AchievementLevel::Gold,
        requirement: 30,
        metric: Metric::CurrentStreak,
    },
    AchievementDef {
        id: "category_explorer",
        title: "Category Explorer",
        description: "Use 3 different categories",
        icon: "🔍",
        kind: AchievementType::Category,
        level: AchievementLevel::Bronze,
        requirement: 3,
        metric: Metric::UsedCategories,
    },
    AchievementDef {
        id: "category_master",
        title: "Category Master",
        description: "Create your first category",
        icon: "🎨",
        kind: AchievementType::Category,
        level: AchievementLevel::Silver,
        requirement: 1,
        metric: Metric::CustomCategories,
    },
    AchievementDef {
        id: "category_guru",
        title: "Category Guru",
        description: "Create 5 categories of your own",
        icon: "🧠",
        kind: AchievementType::Category,
        level: AchievementLevel::Gold,
        requirement: 5,
        metric: Metric::CustomCategories,
    },
];

pub fn find(id: &str) -> Option<&'static AchievementDef> {
    ACHIEVEMENTS.iter().find(|a| a.id == id)
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn ids_are_unique() {
        let ids: HashSet<_> = ACHIEVEMENTS.iter().map(|a| a.id).collect();
        assert_eq!(ids.len(), ACHIEVEMENTS.len());
        assert_eq!(ACHIEVEMENTS.len(), 12);
    }

    #[test]
    fn metric_matches_type() {
        for a in ACHIEVEMENTS {
            let expected = match a.metric {
                Metric::CompletedTasks => AchievementType::Task,
                Metric::TotalTimeSpent => AchievementType::Time,
                Metric::CurrentStreak => AchievementType::Streak,
                Metric::UsedCategories | Metric::CustomCategories => AchievementType::Category,
            };
            assert_eq!(a.kind, expected, "{}", a.id);
        }
    }

    #[test]
    fn lookup_by_id() {
        assert_eq!(find("time_lord").map(|a| a.requirement), Some(180_000));
        assert!(find("nope").is_none());
    }
}
