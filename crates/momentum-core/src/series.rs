//! Series container: the candles of one entity at one period.

use serde::Serialize;

use crate::candle::Candle;
use crate::event::EntityId;
use crate::period::Period;

/// Ordered candles for one `(entity, period)` pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub period: Period,
    /// Bucket width, `None` in calendar-day mode.
    pub interval_ms: Option<i64>,
    pub candles: Vec<Candle>,
}

impl Series {
    pub fn len(&self) -> usize {
        self.candles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candles.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Candle> {
        self.candles.get(index)
    }

    pub fn last(&self) -> Option<&Candle> {
        self.candles.last()
    }

    /// Running total at the end of the series.
    pub fn closing_total(&self) -> f64 {
        self.last().map_or(0.0, |c| c.close)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_series() {
        let series = Series {
            entity_id: "7".to_string(),
            entity_name: "Reading".to_string(),
            period: Period::Min5,
            interval_ms: Some(300_000),
            candles: vec![Candle::doji(0, 300_000, 2.0)],
        };
        let json = serde_json::to_value(&series).unwrap();
        assert_eq!(json["period"], "5m");
        assert_eq!(json["interval_ms"], 300_000);
        assert_eq!(json["candles"][0]["close"], 2.0);
        assert_eq!(series.closing_total(), 2.0);
    }
}
