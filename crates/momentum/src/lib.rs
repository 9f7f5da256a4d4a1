//! Candle engine for momentum charts.
//!
//! Turns scored directions into memoized candle series and windows them for
//! two independent charts:
//! - [`IntervalCache`] - series keyed by the bucket "now" falls in
//! - [`ViewportController`] - zoom, pan and auto-follow state machine
//! - [`RefreshScheduler`] - detects bucket rollover on a polling tick
//! - [`Engine`] - the facade the renderer calls

pub mod cache;
pub mod clock;
pub mod input;
pub mod scheduler;
pub mod state;

pub use cache::{CacheKey, IntervalCache};
pub use clock::{format_at, Clock, ManualClock, SystemClock};
pub use input::{action_for_key, action_for_wheel, ViewportAction};
pub use scheduler::{RefreshScheduler, TickOutcome};
pub use state::{ChartId, Engine, NavDirection, Refresh, ViewWindow, ViewportController, ZoomState};
