//! Candle building: turns an unordered event stream into an OHLC series.
//!
//! The "price" of a candle is the running total of every event value seen so
//! far. Two modes exist:
//!
//! - Fixed intervals walk every epoch-aligned bucket from the one holding the
//!   earliest event up to the one holding `now`, emitting a flat doji for
//!   buckets without events.
//! - Calendar-day mode emits one candle per UTC day that has events.
//!
//! In both modes `open[i] == close[i - 1]` and the first open is zero.

use crate::candle::Candle;
use crate::event::{Entity, ScoreEvent, Timestamp};
use crate::period::{Period, DAY_MS, HOUR_MS};
use crate::series::Series;

/// Upper bound on the up-front reservation for fixed-interval candles.
const RESERVE_LIMIT: usize = 4_096;

/// Build the candles for `events` at `period`, as seen at `now`.
///
/// Returns `None` when there are no events. A present but empty vector means
/// every event lies after the bucket containing `now`.
pub fn build_candles(events: &[ScoreEvent], period: Period, now: Timestamp) -> Option<Vec<Candle>> {
    if events.is_empty() {
        return None;
    }

    // Stable: simultaneous events keep their insertion order.
    let mut sorted: Vec<&ScoreEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.occurred_at);

    let candles = match period.interval_ms() {
        Some(width) => build_fixed(&sorted, period, width, now),
        None => build_daily(&sorted, now),
    };
    Some(candles)
}

/// Build the full series for an entity.
pub fn build_series(entity: &Entity, period: Period, now: Timestamp) -> Option<Series> {
    let candles = build_candles(&entity.events, period, now)?;
    log::debug!(
        "Built {} {} candles for {} from {} events",
        candles.len(),
        period,
        entity.id,
        entity.events.len()
    );
    Some(Series {
        entity_id: entity.id.clone(),
        entity_name: entity.name.clone(),
        period,
        interval_ms: period.interval_ms(),
        candles,
    })
}

/// Running OHLC state for the candle being filled.
struct Accumulator {
    total: f64,
    open: f64,
    high: f64,
    low: f64,
    count: usize,
}

impl Accumulator {
    fn open_at(total: f64) -> Self {
        Self {
            total,
            open: total,
            high: total,
            low: total,
            count: 0,
        }
    }

    fn apply(&mut self, value: f64) {
        self.total += value;
        self.high = self.high.max(self.total);
        self.low = self.low.min(self.total);
        self.count += 1;
    }

    fn finish(&self, period_start: Timestamp, period_end: Timestamp, display_at: Timestamp, is_active: bool) -> Candle {
        Candle {
            period_start,
            period_end,
            display_at,
            open: self.open,
            high: self.high,
            low: self.low,
            close: self.total,
            event_count: self.count,
            is_active,
            is_empty: self.count == 0,
        }
    }
}

fn build_fixed(sorted: &[&ScoreEvent], period: Period, width: i64, now: Timestamp) -> Vec<Candle> {
    let current = period.align(now);
    let mut start = period.align(sorted[0].occurred_at);

    let buckets = if current >= start { (current - start) / width + 1 } else { 0 };
    let mut candles = Vec::with_capacity((buckets as usize).min(RESERVE_LIMIT));

    let mut total = 0.0;
    let mut next = 0;
    while start <= current {
        let end = start + width;
        let mut acc = Accumulator::open_at(total);
        while let Some(event) = sorted.get(next) {
            if event.occurred_at >= end {
                break;
            }
            acc.apply(event.value);
            next += 1;
        }
        candles.push(acc.finish(start, end, start, start == current));
        total = acc.total;
        start = end;
    }

    candles
}

fn build_daily(sorted: &[&ScoreEvent], now: Timestamp) -> Vec<Candle> {
    let today = Period::All.align(now);
    let mut candles = Vec::new();
    let mut total = 0.0;

    let mut i = 0;
    while i < sorted.len() {
        let day_start = Period::All.align(sorted[i].occurred_at);
        if day_start > today {
            break;
        }
        let mut acc = Accumulator::open_at(total);
        while i < sorted.len() && Period::All.align(sorted[i].occurred_at) == day_start {
            acc.apply(sorted[i].value);
            i += 1;
        }
        candles.push(acc.finish(day_start, day_start + DAY_MS, day_start + 12 * HOUR_MS, day_start == today));
        total = acc.total;
    }

    candles
}
