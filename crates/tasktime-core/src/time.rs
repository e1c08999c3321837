//! Time utilities: day/week keys, display formatting and the clock port.
//!
//! Day keys are `YYYY-MM-DD` strings of the *local* calendar date. They are
//! used for grouping sessions and for streak comparison; no duration
//! thresholds are involved, so DST shifts and timezone changes are not
//! compensated for.

use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Datelike, Duration, Local, NaiveDate, TimeZone, Utc};

const DAY_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now" in epoch milliseconds.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> i64;
}

pub type SharedClock = Arc<dyn Clock>;

/// Wall clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Settable clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now_ms: i64) -> Self {
        Self {
            now: AtomicI64::new(now_ms),
        }
    }

    /// Clock set to local noon of `date`.
    pub fn at_local_date(date: NaiveDate) -> Self {
        Self::new(local_noon_ms(date))
    }

    pub fn set(&self, now_ms: i64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.advance_ms(secs.saturating_mul(1000));
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_ms(days.saturating_mul(24 * 60 * 60 * 1000));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

// ── Day / week keys ──────────────────────────────────────────────────

/// Calendar date of an epoch-ms instant in the given zone.
pub fn date_in<Tz: TimeZone>(ms: i64, tz: &Tz) -> NaiveDate {
    DateTime::<Utc>::from_timestamp_millis(ms)
        .unwrap_or_default()
        .with_timezone(tz)
        .date_naive()
}

/// Local calendar date of an epoch-ms instant.
pub fn local_date(ms: i64) -> NaiveDate {
    date_in(ms, &Local)
}

/// Epoch ms of local noon on `date`. Noon is never skipped or repeated by DST.
pub fn local_noon_ms(date: NaiveDate) -> i64 {
    let naive = date.and_hms_opt(12, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.timestamp_millis())
        .unwrap_or_else(|| naive.and_utc().timestamp_millis())
}

pub fn day_key_for(date: NaiveDate) -> String {
    date.format(DAY_KEY_FORMAT).to_string()
}

/// Local day key of an epoch-ms instant.
pub fn day_key(ms: i64) -> String {
    day_key_for(local_date(ms))
}

pub fn day_key_in<Tz: TimeZone>(ms: i64, tz: &Tz) -> String {
    day_key_for(date_in(ms, tz))
}

pub fn parse_day_key(key: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(key, DAY_KEY_FORMAT).ok()
}

/// Sunday that starts the week containing `date`.
pub fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_sunday()))
}

/// Week key: day key of the Sunday starting the instant's local week.
pub fn week_key(ms: i64) -> String {
    day_key_for(week_start(local_date(ms)))
}

/// Monday..Sunday of the week containing `date`.
pub fn week_days(date: NaiveDate) -> Vec<NaiveDate> {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (0..7).map(|i| monday + Duration::days(i)).collect()
}

/// Every date from `start` to `end`, inclusive. Empty when `start > end`.
pub fn dates_between(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    start.iter_days().take_while(|d| *d <= end).collect()
}

// ── Display strings ──────────────────────────────────────────────────

/// `45s`, `3m 20s`, `2h 5m`.
pub fn format_time(seconds: u64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m {secs}s")
    }
}

/// `HH:MM:SS`; hours are not wrapped at 24.
pub fn format_hms(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    let secs = seconds % 60;
    format!("{hours:02}:{minutes:02}:{secs:02}")
}

/// `2h 5m` once an hour has passed, `M:SS` before that.
pub fn format_for_display(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}:{:02}", seconds % 60)
    }
}
