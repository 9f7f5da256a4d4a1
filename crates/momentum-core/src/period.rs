//! Period catalogue: the granularities a series can be built at.

use std::fmt;

use serde::{Serialize, Serializer};

use crate::event::Timestamp;

pub const SECOND_MS: i64 = 1_000;
pub const MINUTE_MS: i64 = 60 * SECOND_MS;
pub const HOUR_MS: i64 = 60 * MINUTE_MS;
pub const DAY_MS: i64 = 24 * HOUR_MS;

/// Unit an axis should label ticks in for a given period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayUnit {
    Second,
    Minute,
    Hour,
    Day,
    Month,
    Year,
}

impl DisplayUnit {
    /// `strftime` pattern for a candle time at this unit.
    pub fn time_format(&self) -> &'static str {
        match self {
            DisplayUnit::Second => "%H:%M:%S",
            DisplayUnit::Minute | DisplayUnit::Hour => "%H:%M",
            DisplayUnit::Day => "%Y-%m-%d",
            DisplayUnit::Month => "%Y-%m",
            DisplayUnit::Year => "%Y",
        }
    }
}

/// Chart period.
///
/// Every variant except [`Period::All`] is a fixed, epoch-aligned interval.
/// `All` groups events by calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Period {
    Sec10,
    Min1,
    Min5,
    Min30,
    Hour1,
    Hour2,
    Hour6,
    Hour12,
    Day1,
    Day3,
    Day7,
    Day10,
    Month1,
    Month3,
    Month6,
    Year1,
    All,
}

impl Period {
    /// Interval width in milliseconds, `None` for calendar-day mode.
    pub fn interval_ms(&self) -> Option<i64> {
        let ms = match self {
            Period::Sec10 => 10 * SECOND_MS,
            Period::Min1 => MINUTE_MS,
            Period::Min5 => 5 * MINUTE_MS,
            Period::Min30 => 30 * MINUTE_MS,
            Period::Hour1 => HOUR_MS,
            Period::Hour2 => 2 * HOUR_MS,
            Period::Hour6 => 6 * HOUR_MS,
            Period::Hour12 => 12 * HOUR_MS,
            Period::Day1 => DAY_MS,
            Period::Day3 => 3 * DAY_MS,
            Period::Day7 => 7 * DAY_MS,
            Period::Day10 => 10 * DAY_MS,
            Period::Month1 => 30 * DAY_MS,
            Period::Month3 => 90 * DAY_MS,
            Period::Month6 => 180 * DAY_MS,
            Period::Year1 => 365 * DAY_MS,
            Period::All => return None,
        };
        Some(ms)
    }

    /// Whether this is a fixed-interval (timeframe) period.
    pub fn is_fixed(&self) -> bool {
        self.interval_ms().is_some()
    }

    /// Unit candle times are labelled in at this period.
    pub fn display_unit(&self) -> DisplayUnit {
        match self {
            Period::Sec10 => DisplayUnit::Second,
            Period::Min1 | Period::Min5 | Period::Min30 => DisplayUnit::Minute,
            Period::Hour1 | Period::Hour2 | Period::Hour6 | Period::Hour12 => DisplayUnit::Hour,
            Period::Day1 | Period::Day3 | Period::Day7 | Period::Day10 | Period::All => {
                DisplayUnit::Day
            }
            Period::Month1 | Period::Month3 | Period::Month6 => DisplayUnit::Month,
            Period::Year1 => DisplayUnit::Year,
        }
    }

    /// Short code used in cache and comment keys ("1m", "3M", "all").
    pub fn code(&self) -> &'static str {
        match self {
            Period::Sec10 => "10s",
            Period::Min1 => "1m",
            Period::Min5 => "5m",
            Period::Min30 => "30m",
            Period::Hour1 => "1h",
            Period::Hour2 => "2h",
            Period::Hour6 => "6h",
            Period::Hour12 => "12h",
            Period::Day1 => "1d",
            Period::Day3 => "3d",
            Period::Day7 => "7d",
            Period::Day10 => "10d",
            Period::Month1 => "1M",
            Period::Month3 => "3M",
            Period::Month6 => "6M",
            Period::Year1 => "1Y",
            Period::All => "all",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Period::Sec10 => "10 seconds",
            Period::Min1 => "1 minute",
            Period::Min5 => "5 minutes",
            Period::Min30 => "30 minutes",
            Period::Hour1 => "1 hour",
            Period::Hour2 => "2 hours",
            Period::Hour6 => "6 hours",
            Period::Hour12 => "12 hours",
            Period::Day1 => "1 day",
            Period::Day3 => "3 days",
            Period::Day7 => "7 days",
            Period::Day10 => "10 days",
            Period::Month1 => "1 month",
            Period::Month3 => "3 months",
            Period::Month6 => "6 months",
            Period::Year1 => "1 year",
            Period::All => "daily",
        }
    }

    /// Resolve a short code. Unknown codes yield `None`.
    pub fn from_code(code: &str) -> Option<Period> {
        Self::all().iter().copied().find(|p| p.code() == code)
    }

    /// All periods in ascending granularity, calendar mode last.
    pub fn all() -> &'static [Period] {
        &[
            Period::Sec10,
            Period::Min1,
            Period::Min5,
            Period::Min30,
            Period::Hour1,
            Period::Hour2,
            Period::Hour6,
            Period::Hour12,
            Period::Day1,
            Period::Day3,
            Period::Day7,
            Period::Day10,
            Period::Month1,
            Period::Month3,
            Period::Month6,
            Period::Year1,
            Period::All,
        ]
    }

    /// Start of the bucket containing `ts`.
    ///
    /// Calendar mode aligns to the UTC day.
    pub fn align(&self, ts: Timestamp) -> Timestamp {
        let width = self.interval_ms().unwrap_or(DAY_MS);
        ts.div_euclid(width) * width
    }

    /// The bucket containing `now`.
    pub fn current_interval(&self, now: Timestamp) -> IntervalInfo {
        let width = self.interval_ms().unwrap_or(DAY_MS);
        let start = self.align(now);
        IntervalInfo {
            period: *self,
            start,
            end: start + width,
            time_left_ms: start + width - now,
        }
    }
}

/// Serialized as its short code, the same form used in comment keys.
impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// The interval a period is currently in, and how long until it closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalInfo {
    pub period: Period,
    pub start: Timestamp,
    pub end: Timestamp,
    pub time_left_ms: i64,
}

impl IntervalInfo {
    /// Whole seconds left, rounded up.
    pub fn time_left_secs(&self) -> i64 {
        (self.time_left_ms.max(0) + SECOND_MS - 1) / SECOND_MS
    }

    /// Countdown text such as `"1 minute • closes in 00:42"`.
    ///
    /// Hours are only shown when non-zero.
    pub fn countdown_label(&self) -> String {
        let secs = self.time_left_secs();
        let (hh, mm, ss) = (secs / 3600, (secs % 3600) / 60, secs % 60);
        if hh > 0 {
            format!("{} • closes in {:02}:{:02}:{:02}", self.period.label(), hh, mm, ss)
        } else {
            format!("{} • closes in {:02}:{:02}", self.period.label(), mm, ss)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_code_roundtrip() {
        for period in Period::all() {
            assert_eq!(Period::from_code(period.code()), Some(*period));
        }
        assert_eq!(Period::from_code("15m"), None);
        assert_eq!(Period::from_code(""), None);
    }

    #[test]
    fn test_display_units() {
        assert_eq!(Period::Sec10.display_unit(), DisplayUnit::Second);
        assert_eq!(Period::Hour12.display_unit(), DisplayUnit::Hour);
        assert_eq!(Period::All.display_unit(), DisplayUnit::Day);
        assert_eq!(Period::Month6.display_unit(), DisplayUnit::Month);
        assert_eq!(DisplayUnit::Minute.time_format(), "%H:%M");
        assert_eq!(DisplayUnit::Year.time_format(), "%Y");
    }

    #[test]
    fn test_serializes_as_code() {
        assert_eq!(serde_json::to_string(&Period::Month3).unwrap(), "\"3M\"");
        assert_eq!(serde_json::to_string(&Period::All).unwrap(), "\"all\"");
    }

    #[test]
    fn test_month_and_year_are_fixed_widths() {
        assert_eq!(Period::Month1.interval_ms(), Some(30 * DAY_MS));
        assert_eq!(Period::Year1.interval_ms(), Some(365 * DAY_MS));
        assert_eq!(Period::All.interval_ms(), None);
        assert!(!Period::All.is_fixed());
    }

    #[test]
    fn test_align_handles_negative_timestamps() {
        assert_eq!(Period::Min1.align(59_999), 0);
        assert_eq!(Period::Min1.align(60_000), 60_000);
        assert_eq!(Period::Min1.align(-1), -60_000);
    }

    #[test]
    fn test_countdown_label() {
        let info = Period::Min1.current_interval(18_500);
        assert_eq!(info.start, 0);
        assert_eq!(info.end, 60_000);
        assert_eq!(info.time_left_secs(), 42);
        assert_eq!(info.countdown_label(), "1 minute • closes in 00:42");

        let info = Period::Hour2.current_interval(0);
        assert_eq!(info.countdown_label(), "2 hours • closes in 02:00:00");
    }
}
