//! Wall-clock access.
//!
//! The engine never reads the system time directly so tests can move time
//! across bucket boundaries deterministically.

use std::cell::Cell;
use std::rc::Rc;

use chrono::{DateTime, Utc};
use momentum_core::{DisplayUnit, Timestamp};

pub trait Clock {
    /// Current time in epoch milliseconds.
    fn now_ms(&self) -> Timestamp;
}

/// The system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> Timestamp {
        chrono::Utc::now().timestamp_millis()
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Default, Clone)]
pub struct ManualClock {
    now: Rc<Cell<Timestamp>>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Rc::new(Cell::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.set(now);
    }

    pub fn advance(&self, ms: i64) {
        self.now.set(self.now.get() + ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Timestamp {
        self.now.get()
    }
}

/// Label a candle time in UTC at the precision of `unit`.
pub fn format_at(ts: Timestamp, unit: DisplayUnit) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ts).map(|dt| dt.format(unit.time_format()).to_string())
}
