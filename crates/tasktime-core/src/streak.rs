//! Consecutive-day check-in streak.
//!
//! Check-ins are idempotent per local calendar day. A check-in on the day
//! after the last one extends the streak; any larger gap starts over at 1
//! while `longest_streak` is kept.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::Result;
use crate::storage::{load_json, save_json, SharedStorage};
use crate::time::{day_key_for, local_date, parse_day_key, SharedClock};

pub const STREAK_STORAGE_KEY: &str = "streak-storage";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakRecord {
    #[serde(default)]
    pub current_streak: u32,
    #[serde(default)]
    pub longest_streak: u32,
    /// Day key of the last check-in.
    #[serde(default)]
    pub last_active_date: Option<String>,
}

/// What a check-in did to the streak.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckInOutcome {
    /// First check-in ever, or the first after a reset.
    Started,
    AlreadyCheckedIn,
    Extended,
    /// The gap since the last check-in was more than one day.
    Broken,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StreakInfo {
    pub current: u32,
    pub longest: u32,
    pub last_active: Option<String>,
}

pub struct StreakTracker {
    storage: SharedStorage,
    clock: SharedClock,
    record: StreakRecord,
}

impl StreakTracker {
    pub fn load(storage: SharedStorage, clock: SharedClock) -> Result<Self> {
        let record = load_json::<StreakRecord>(storage.as_ref(), STREAK_STORAGE_KEY)?.unwrap_or_default();
        Ok(Self {
            storage,
            clock,
            record,
        })
    }

    pub fn record(&self) -> &StreakRecord {
        &self.record
    }

    pub fn current_streak(&self) -> u32 {
        self.record.current_streak
    }

    pub fn longest_streak(&self) -> u32 {
        self.record.longest_streak
    }

    pub fn info(&self) -> StreakInfo {
        StreakInfo {
            current: self.record.current_streak,
            longest: self.record.longest_streak,
            last_active: self.record.last_active_date.clone(),
        }
    }

    /// Record activity for today's local calendar day.
    pub fn check_in_today(&mut self) -> Result<CheckInOutcome> {
        let today = local_date(self.clock.now_ms());
        let today_key = day_key_for(today);
        let last = self.record.last_active_date.as_deref().and_then(parse_day_key);

        let mut next = self.record.clone();
        let outcome = match last {
            None => {
                next.current_streak = 1;
                next.longest_streak = next.longest_streak.max(1);
                CheckInOutcome::Started
            }
            Some(last) if last == today => return Ok(CheckInOutcome::AlreadyCheckedIn),
            Some(last) if today.pred_opt() == Some(last) => {
                next.current_streak += 1;
                next.longest_streak = next.longest_streak.max(next.current_streak);
                CheckInOutcome::Extended
            }
            Some(_) => {
                next.current_streak = 1;
                CheckInOutcome::Broken
            }
        };
        next.last_active_date = Some(today_key);

        save_json(self.storage.as_ref(), STREAK_STORAGE_KEY, &next)?;
        self.record = next;
        info!(
            outcome = ?outcome,
            current = self.record.current_streak,
            longest = self.record.longest_streak,
            "streak check-in"
        );
        Ok(outcome)
    }

    /// Zero the current streak and forget the last check-in. The longest streak is kept.
    pub fn reset(&mut self) -> Result<()> {
        let next = StreakRecord {
            current_streak: 0,
            longest_streak: self.record.longest_streak,
            last_active_date: None,
        };
        save_json(self.storage.as_ref(), STREAK_STORAGE_KEY, &next)?;
        self.record = next;
        debug!("streak reset");
        Ok(())
    }
}
