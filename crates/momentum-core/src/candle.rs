//! Candle data structures.

use serde::Serialize;

use crate::event::Timestamp;

/// One OHLC summary of the running total over a bucket or calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Candle {
    pub period_start: Timestamp,
    pub period_end: Timestamp,
    /// Where the candle is drawn on the time axis. Equals `period_start` for
    /// fixed intervals and noon UTC for calendar days.
    pub display_at: Timestamp,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub event_count: usize,
    pub is_active: bool,
    pub is_empty: bool,
}

impl Candle {
    /// A flat candle with no events at `level`.
    pub fn doji(period_start: Timestamp, period_end: Timestamp, level: f64) -> Self {
        Self {
            period_start,
            period_end,
            display_at: period_start,
            open: level,
            high: level,
            low: level,
            close: level,
            event_count: 0,
            is_active: false,
            is_empty: true,
        }
    }

    pub fn is_completed(&self) -> bool {
        !self.is_active
    }

    /// Net change over the candle.
    pub fn change(&self) -> f64 {
        self.close - self.open
    }

    pub fn contains(&self, ts: Timestamp) -> bool {
        ts >= self.period_start && ts < self.period_end
    }
}
