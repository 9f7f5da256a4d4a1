//! Collaborator seams consumed by the engine.
//!
//! Storage, persistence and comments live outside the candle engine. The
//! engine only talks to them through these traits.

use momentum_core::{Entity, Period, Timestamp};

use crate::json::Snapshot;

/// Read access to scored entities.
pub trait EntitySource {
    /// Directions currently in use.
    fn live_entities(&self) -> &[Entity];

    /// Removed directions kept for aggregate history and possible restore.
    fn soft_deleted_entities(&self) -> &[Entity];

    /// Look up a live entity by id.
    fn live_entity(&self, id: &str) -> Option<&Entity> {
        self.live_entities().iter().find(|e| e.id == id)
    }
}

/// Free-text notes attached to individual candles.
pub trait CommentSource {
    fn comment(&self, key: &str) -> Option<String>;
}

/// Called after core-owned state that needs persisting has changed.
///
/// Implementations must not block; persistence is fire-and-forget.
pub trait MutationHook {
    fn on_mutated(&self);
}

impl<F: Fn()> MutationHook for F {
    fn on_mutated(&self) {
        self()
    }
}

/// Hook that ignores every notification.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHook;

impl MutationHook for NoopHook {
    fn on_mutated(&self) {}
}

/// Key of a candle's comment: `entity|period|anchor`.
///
/// The anchor is the candle's display timestamp, which is the period start
/// for fixed intervals and the day's display time in calendar mode. The
/// format must stay stable across releases since stored comments use it.
pub fn comment_key(entity_id: &str, period: Period, anchor: Timestamp) -> String {
    format!("{}|{}|{}", entity_id, period.code(), anchor)
}

/// Trait for types that can load a full snapshot of entities.
///
/// This trait uses `anyhow::Result` for flexible error handling.
pub trait DataSource {
    fn load(&self) -> anyhow::Result<Snapshot>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn test_comment_key_format() {
        assert_eq!(comment_key("17", Period::Min5, 300_000), "17|5m|300000");
        assert_eq!(comment_key("ALL", Period::All, 43_200_000), "ALL|all|43200000");
    }

    #[test]
    fn test_closure_hook() {
        let calls = Cell::new(0);
        let hook = || calls.set(calls.get() + 1);
        hook.on_mutated();
        hook.on_mutated();
        assert_eq!(calls.get(), 2);
    }
}
