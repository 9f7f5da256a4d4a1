//! Core types and algorithms for momentum.
//!
//! This crate is pure computation over in-memory data:
//! - `ScoreEvent` / `Entity` - scored activity streams
//! - `Period` - the closed catalogue of chart granularities
//! - `Candle` / `Series` - OHLC output
//! - `build_series` - running-total candle builder
//! - `merge_all` - aggregate of live and soft-deleted entities

pub mod aggregate;
pub mod builder;
pub mod candle;
pub mod event;
pub mod period;
pub mod scoring;
pub mod series;

pub use aggregate::{breakdown, merge_all, SourceContribution, AGGREGATE_ID, AGGREGATE_NAME};
pub use builder::{build_candles, build_series};
pub use candle::Candle;
pub use event::{Entity, EntityId, ScoreEvent, SourceRef, Timestamp};
pub use period::{DisplayUnit, IntervalInfo, Period, DAY_MS, HOUR_MS, MINUTE_MS, SECOND_MS};
pub use scoring::{calculate_session_points, ScoringRules, SessionInputs, SessionPoints};
pub use series::Series;
