//! Refresh scheduling for the active period.
//!
//! The scheduler is polled on a fixed tick. Each poll reports whether the
//! current bucket closed since the previous poll, plus the countdown to the
//! next boundary. Changing the period resets it, so the next tick of a
//! fixed-interval period reports a rollover and the chart is redrawn.
//!
//! Calendar-day mode never reports a rollover: only its countdown is
//! refreshed and the daily series is rebuilt on the next cache miss.

use momentum_core::{IntervalInfo, Period, Timestamp};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// A new bucket started; series must be rebuilt.
    Rollover(IntervalInfo),
    /// Still inside the same bucket; only the countdown moved.
    Countdown(IntervalInfo),
}

impl TickOutcome {
    pub fn info(&self) -> &IntervalInfo {
        match self {
            TickOutcome::Rollover(info) | TickOutcome::Countdown(info) => info,
        }
    }

    pub fn is_rollover(&self) -> bool {
        matches!(self, TickOutcome::Rollover(_))
    }
}

#[derive(Debug, Clone)]
pub struct RefreshScheduler {
    period: Period,
    last_bucket: Option<Timestamp>,
}

impl RefreshScheduler {
    pub fn new(period: Period) -> Self {
        Self {
            period,
            last_bucket: None,
        }
    }

    pub fn period(&self) -> Period {
        self.period
    }

    /// Switch to another period. The previous bucket is forgotten.
    pub fn reconfigure(&mut self, period: Period) {
        if period != self.period {
            log::debug!("Refresh period {} -> {}", self.period, period);
        }
        self.period = period;
        self.last_bucket = None;
    }

    pub fn tick(&mut self, now: Timestamp) -> TickOutcome {
        let info = self.period.current_interval(now);
        if !self.period.is_fixed() {
            return TickOutcome::Countdown(info);
        }
        let changed = self.last_bucket != Some(info.start);
        self.last_bucket = Some(info.start);
        if changed {
            TickOutcome::Rollover(info)
        } else {
            TickOutcome::Countdown(info)
        }
    }
}
