use chrono::{DateTime, FixedOffset, NaiveDate, Timelike, Utc};
use serde::Deserialize;

/// Source of "now". Injected so day mapping and recency checks are testable.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// Asia/Kolkata has no daylight saving, so a fixed +05:30 is exact.
pub const IST_OFFSET_SECS: i32 = 5 * 3600 + 30 * 60;

pub fn ist() -> FixedOffset {
    FixedOffset::east_opt(IST_OFFSET_SECS).expect("+05:30 is a valid offset")
}

/// Conference dates, always interpreted in IST.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConferenceCalendar {
    #[serde(default = "default_dates")]
    pub dates: Vec<NaiveDate>,
    #[serde(default = "default_live_start_hour")]
    pub live_start_hour: u32,
    #[serde(default = "default_live_end_hour")]
    pub live_end_hour: u32,
}

fn default_dates() -> Vec<NaiveDate> {
    // 2026-02-16 through 2026-02-20
    (16..=20)
        .filter_map(|day| NaiveDate::from_ymd_opt(2026, 2, day))
        .collect()
}

fn default_live_start_hour() -> u32 {
    9
}

fn default_live_end_hour() -> u32 {
    19
}

impl Default for ConferenceCalendar {
    fn default() -> Self {
        Self {
            dates: default_dates(),
            live_start_hour: default_live_start_hour(),
            live_end_hour: default_live_end_hour(),
        }
    }
}

impl ConferenceCalendar {
    pub fn days(&self) -> usize {
        self.dates.len()
    }

    /// Conference day (1-based) for a timestamp, or 0 when it falls outside the event.
    pub fn day_of(&self, ts: DateTime<Utc>) -> u32 {
        let local = ts.with_timezone(&ist()).date_naive();
        self.dates
            .iter()
            .position(|d| *d == local)
            .map(|idx| idx as u32 + 1)
            .unwrap_or(0)
    }

    pub fn current_day(&self, clock: &dyn Clock) -> u32 {
        self.day_of(clock.now())
    }

    /// True on a conference day during session hours, local time.
    pub fn is_live_now(&self, clock: &dyn Clock) -> bool {
        let now = clock.now();
        if self.day_of(now) == 0 {
            return false;
        }
        let hour = now.with_timezone(&ist()).hour();
        hour >= self.live_start_hour && hour < self.live_end_hour
    }
}
