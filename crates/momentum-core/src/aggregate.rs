//! Aggregate view: all directions merged into one synthetic entity.

use std::collections::HashSet;

use crate::candle::Candle;
use crate::event::{Entity, EntityId};

/// Id of the synthetic aggregate entity.
pub const AGGREGATE_ID: &str = "ALL";
/// Display name of the synthetic aggregate entity.
pub const AGGREGATE_NAME: &str = "All directions (sum)";

/// Merge live and soft-deleted entities into a single entity.
///
/// Soft-deleted entities whose id is also live are skipped so restored data
/// is not counted twice. Every event is tagged with the entity it came from.
/// Returns `None` when the merged set has no events.
pub fn merge_all(live: &[Entity], soft_deleted: &[Entity]) -> Option<Entity> {
    let live_ids: HashSet<&str> = live.iter().map(|e| e.id.as_str()).collect();

    let sources = live
        .iter()
        .chain(soft_deleted.iter().filter(|e| !live_ids.contains(e.id.as_str())));

    let events: Vec<_> = sources
        .flat_map(|entity| entity.events.iter().map(move |ev| ev.sourced_from(entity)))
        .collect();

    if events.is_empty() {
        return None;
    }

    Some(Entity::new(AGGREGATE_ID, AGGREGATE_NAME).with_events(events))
}

/// Contribution of one source entity to a candle.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceContribution {
    pub entity_id: EntityId,
    pub entity_name: String,
    pub sum: f64,
    pub count: usize,
}

/// Per-source totals of the events falling inside `candle`.
///
/// Sorted by absolute sum, largest first. Events without a source tag are
/// attributed to `entity` itself.
pub fn breakdown(entity: &Entity, candle: &Candle) -> Vec<SourceContribution> {
    let mut items: Vec<SourceContribution> = Vec::new();

    for event in entity.events.iter().filter(|e| candle.contains(e.occurred_at)) {
        let (id, name) = match &event.source {
            Some(src) => (src.entity_id.as_str(), src.entity_name.as_str()),
            None => (entity.id.as_str(), entity.name.as_str()),
        };
        match items.iter_mut().find(|it| it.entity_id == id) {
            Some(item) => {
                item.sum += event.value;
                item.count += 1;
            }
            None => items.push(SourceContribution {
                entity_id: id.to_string(),
                entity_name: name.to_string(),
                sum: event.value,
                count: 1,
            }),
        }
    }

    items.sort_by(|a, b| b.sum.abs().total_cmp(&a.sum.abs()));
    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_candles;
    use crate::event::ScoreEvent;
    use crate::period::Period;

    fn entity(id: &str, events: &[(f64, i64)]) -> Entity {
        Entity::new(id, format!("dir {id}"))
            .with_events(events.iter().map(|&(v, t)| ScoreEvent::new(v, t)).collect())
    }

    #[test]
    fn test_merge_tags_sources() {
        let live = vec![entity("a", &[(1.0, 0)]), entity("b", &[(2.0, 10)])];
        let merged = merge_all(&live, &[]).unwrap();

        assert_eq!(merged.id, AGGREGATE_ID);
        assert_eq!(merged.events.len(), 2);
        let src = merged.events[1].source.as_ref().unwrap();
        assert_eq!(src.entity_id, "b");
        assert_eq!(src.entity_name, "dir b");
    }

    #[test]
    fn test_soft_deleted_included_unless_restored() {
        let live = vec![entity("a", &[(1.0, 0)])];
        let deleted = vec![entity("a", &[(1.0, 0)]), entity("z", &[(5.0, 0)])];

        let merged = merge_all(&live, &deleted).unwrap();
        assert_eq!(merged.total(), 6.0);
    }

    #[test]
    fn test_dedup_matches_live_only_series() {
        let live = vec![entity("a", &[(3.0, 0), (-1.0, 90_000)])];
        let deleted = vec![entity("a", &[(100.0, 30_000)])];

        let merged = merge_all(&live, &deleted).unwrap();
        let live_only = merge_all(&live, &[]).unwrap();
        assert_eq!(
            build_candles(&merged.events, Period::Min1, 120_000),
            build_candles(&live_only.events, Period::Min1, 120_000)
        );
    }

    #[test]
    fn test_empty_merge_is_none() {
        assert!(merge_all(&[], &[]).is_none());
        assert!(merge_all(&[entity("a", &[])], &[entity("b", &[])]).is_none());
    }

    #[test]
    fn test_breakdown_sorted_by_magnitude() {
        let live = vec![
            entity("a", &[(1.0, 0), (2.0, 1_000)]),
            entity("b", &[(-7.0, 2_000), (4.0, 70_000)]),
        ];
        let merged = merge_all(&live, &[]).unwrap();
        let candles = build_candles(&merged.events, Period::Min1, 70_000).unwrap();

        let items = breakdown(&merged, &candles[0]);
        assert_eq!(items.len(), 2);
        assert_eq!(items[0].entity_id, "b");
        assert_eq!(items[0].sum, -7.0);
        assert_eq!(items[1].sum, 3.0);
        assert_eq!(items[1].count, 2);

        let items = breakdown(&merged, &candles[1]);
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].entity_id, "b");
    }
}
