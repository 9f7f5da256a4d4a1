//! Validation utilities for imported data and built candles.

use momentum_core::{Candle, ScoreEvent};

use crate::json::{DirectionRecord, ImportError, Snapshot};

/// Validate an event has a usable value.
pub fn validate_event(event: &ScoreEvent) -> bool {
    event.value.is_finite()
}

/// Validate a candle satisfies the OHLC invariants.
///
/// High must cover open and close, low must be under both, and an empty
/// candle must be flat.
pub fn validate_candle(candle: &Candle) -> bool {
    let finite = candle.open.is_finite()
        && candle.high.is_finite()
        && candle.low.is_finite()
        && candle.close.is_finite();
    let bounded = candle.high >= candle.open.max(candle.close) && candle.low <= candle.open.min(candle.close);
    let flat_if_empty = candle.event_count > 0
        || (candle.is_empty && candle.open == candle.high && candle.high == candle.low && candle.low == candle.close);

    finite && bounded && flat_if_empty && candle.period_start < candle.period_end
}

/// Check every continuity link `close[i] == open[i + 1]`.
///
/// Holds for any slice of a series, including a scrolled view window.
pub fn validate_links(candles: &[Candle]) -> bool {
    candles.windows(2).all(|w| w[0].close == w[1].open)
}

/// Check a whole series: every link holds and the first candle opens at zero.
pub fn validate_continuity(candles: &[Candle]) -> bool {
    let starts_at_zero = candles.first().map_or(true, |c| c.open == 0.0);
    starts_at_zero && validate_links(candles)
}

/// Structural checks on a parsed snapshot.
///
/// Every direction needs an id and a name; every score needs a finite value
/// and either an RFC 3339 date or an epoch `timestamp`.
pub fn validate_snapshot(snapshot: &Snapshot) -> Result<(), ImportError> {
    let data = &snapshot.productivity_data;
    for direction in data.directions.iter().chain(data.trash.directions.iter()) {
        validate_direction(direction)?;
    }
    Ok(())
}

fn validate_direction(direction: &DirectionRecord) -> Result<(), ImportError> {
    let id = direction.id.as_key();
    if id.trim().is_empty() {
        return Err(invalid("direction with empty id".to_string()));
    }
    if direction.name.trim().is_empty() {
        return Err(invalid(format!("direction {id} has no name")));
    }
    for score in &direction.scores {
        if !score.value.is_finite() {
            log::warn!("Rejecting non-finite score in direction {}", id);
            return Err(invalid(format!("direction {id} has a non-finite score")));
        }
        if score.occurred_at().is_none() {
            return Err(ImportError::BadTimestamp {
                direction: id.clone(),
                date: score.date.clone(),
            });
        }
    }
    Ok(())
}

fn invalid(reason: String) -> ImportError {
    ImportError::Invalid { reason }
}
