//! End-to-end tests for the candle engine over an in-memory store.

use std::sync::Arc;

use momentum::{ChartId, Engine, ManualClock, ViewportAction};
use momentum_config::{Config, ViewportConfig};
use momentum_core::{Entity, Period, ScoreEvent, AGGREGATE_ID, DAY_MS, MINUTE_MS};
use momentum_data::InMemoryStore;

fn config_with_visible(visible: usize, min: usize) -> Config {
    Config {
        viewport: ViewportConfig {
            default_visible_count: visible,
            min_count: min,
            ..Default::default()
        },
        ..Default::default()
    }
}

fn minutes_store(count: i64) -> InMemoryStore {
    let events = (0..count).map(|i| ScoreEvent::new(1.0, i * MINUTE_MS)).collect();
    let mut store = InMemoryStore::new();
    store.add_entity(Entity::new("1", "Reading").with_events(events));
    store
}

#[test]
fn test_one_minute_latest_window() {
    let mut store = InMemoryStore::new();
    store.add_entity(Entity::new("1", "Reading").with_events(vec![ScoreEvent::new(5.0, 0), ScoreEvent::new(-2.0, 70_000)]));
    let clock = ManualClock::new(90_000);
    let mut engine = Engine::new(store, &config_with_visible(1, 1), clock);

    let window = engine.get_view_window("1", Period::Min1).unwrap();
    assert_eq!(window.candles.len(), 1);
    assert_eq!((window.start_index, window.end_index, window.total_candles), (1, 1, 2));

    let candle = &window.candles[0];
    assert_eq!((candle.open, candle.high, candle.low, candle.close), (5.0, 5.0, 3.0, 3.0));
    assert_eq!(candle.event_count, 1);
    assert!(candle.is_active);
}

#[test]
fn test_memoized_within_bucket() {
    let clock = ManualClock::new(30 * MINUTE_MS - 1);
    let mut engine = Engine::new(minutes_store(30), &Config::default(), clock.clone());

    let first = engine.series("1", Period::Min1).unwrap();
    clock.advance(-30_000);
    let second = engine.series("1", Period::Min1).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    clock.set(30 * MINUTE_MS);
    let third = engine.series("1", Period::Min1).unwrap();
    assert!(!Arc::ptr_eq(&first, &third));
    assert!(first.candles[29].is_active);
    assert!(third.candles[29].is_completed());
    assert!(third.candles[30].is_active);
}

#[test]
fn test_auto_follow_picks_up_new_candle() {
    let clock = ManualClock::new(30 * MINUTE_MS - 1);
    let mut engine = Engine::new(minutes_store(30), &config_with_visible(10, 10), clock.clone());
    engine.select(ChartId::Primary, "1", Period::Min1);

    let refresh = engine.tick();
    let window = refresh[0].window.as_ref().unwrap();
    assert_eq!((window.start_index, window.end_index), (20, 29));

    clock.set(30 * MINUTE_MS);
    let refresh = engine.tick();
    assert!(refresh[0].recomputed);
    let window = refresh[0].window.as_ref().unwrap();
    assert_eq!((window.start_index, window.end_index, window.total_candles), (21, 30, 31));
    let newest = window.candles.last().unwrap();
    assert!(newest.is_active && newest.is_empty);
    assert_eq!(newest.close, 30.0);
}

#[test]
fn test_pinned_near_end_snaps_back() {
    let clock = ManualClock::new(100 * MINUTE_MS - 1);
    let mut engine = Engine::new(minutes_store(100), &Config::default(), clock);
    engine.select(ChartId::Primary, "1", Period::Min1);

    engine.navigate_left(ChartId::Primary, 5);
    assert_eq!(engine.zoom(ChartId::Primary).center_index, Some(74));

    engine.source_mut().add_event("1", ScoreEvent::new(2.0, 99 * MINUTE_MS + 10));
    engine.data_changed("1");
    assert!(engine.zoom(ChartId::Primary).is_following());
}

#[test]
fn test_pinned_far_from_end_stays_put() {
    let clock = ManualClock::new(100 * MINUTE_MS - 1);
    let mut engine = Engine::new(minutes_store(100), &Config::default(), clock.clone());
    engine.select(ChartId::Primary, "1", Period::Min1);
    engine.navigate_to_start(ChartId::Primary);

    clock.set(100 * MINUTE_MS);
    let refresh = engine.tick();
    let window = refresh[0].window.as_ref().unwrap();
    assert_eq!(engine.zoom(ChartId::Primary).center_index, Some(25));
    assert_eq!((window.start_index, window.end_index, window.total_candles), (0, 49, 101));
}

#[test]
fn test_charts_have_independent_viewports() {
    let clock = ManualClock::new(100 * MINUTE_MS - 1);
    let mut engine = Engine::new(minutes_store(100), &Config::default(), clock);
    engine.select(ChartId::Primary, "1", Period::Min1);
    engine.select(ChartId::Aggregate, AGGREGATE_ID, Period::Min1);

    engine.apply(ChartId::Primary, ViewportAction::ZoomIn);
    engine.apply(ChartId::Primary, ViewportAction::Pan(400.0));
    assert_eq!(engine.zoom(ChartId::Primary).visible_count, 35);
    assert!(!engine.zoom(ChartId::Primary).is_following());

    assert_eq!(engine.zoom(ChartId::Aggregate).visible_count, 50);
    assert!(engine.zoom(ChartId::Aggregate).is_following());
    let aggregate = engine.view_window(ChartId::Aggregate).unwrap();
    assert_eq!((aggregate.start_index, aggregate.end_index), (50, 99));
}

#[test]
fn test_aggregate_ignores_trashed_copy_of_live_entity() {
    let live = Entity::new("1", "Reading").with_events(vec![ScoreEvent::new(5.0, 0), ScoreEvent::new(-2.0, 70_000)]);
    let stale = Entity::new("1", "Reading").with_events(vec![ScoreEvent::new(100.0, 10_000)]);
    let store = InMemoryStore::from_parts(vec![live], vec![stale], Default::default());
    let mut engine = Engine::new(store, &Config::default(), ManualClock::new(90_000));

    let single = engine.series("1", Period::Min1).unwrap();
    let aggregate = engine.series(AGGREGATE_ID, Period::Min1).unwrap();
    assert_eq!(single.candles, aggregate.candles);
}

#[test]
fn test_trashed_entity_stays_in_aggregate() {
    let mut store = minutes_store(3);
    store.add_entity(Entity::new("2", "Sport").with_events(vec![ScoreEvent::new(10.0, MINUTE_MS)]));
    let mut engine = Engine::new(store, &Config::default(), ManualClock::new(3 * MINUTE_MS - 1));

    assert_eq!(engine.series(AGGREGATE_ID, Period::Min1).unwrap().closing_total(), 13.0);
    engine.source_mut().soft_delete("2");
    engine.invalidate_all();

    assert_eq!(engine.series(AGGREGATE_ID, Period::Min1).unwrap().closing_total(), 13.0);
    assert!(engine.get_view_window("2", Period::Min1).is_none());
}

#[test]
fn test_clear_all_values_hides_charts() {
    let mut engine = Engine::new(minutes_store(3), &Config::default(), ManualClock::new(3 * MINUTE_MS - 1));
    assert!(engine.get_view_window("1", Period::Min1).is_some());

    engine.source_mut().clear_all_values();
    engine.invalidate_all();
    assert!(engine.get_view_window("1", Period::Min1).is_none());
    assert!(engine.get_view_window(AGGREGATE_ID, Period::Min1).is_none());
}

#[test]
fn test_period_switch_rebuilds_on_next_tick() {
    let clock = ManualClock::new(100 * MINUTE_MS - 1_000);
    let mut engine = Engine::new(minutes_store(100), &Config::default(), clock.clone());
    engine.select(ChartId::Primary, "1", Period::Min1);
    engine.tick();
    clock.advance(100);
    assert!(!engine.tick()[0].recomputed);

    engine.select(ChartId::Primary, "1", Period::Min30);
    let refresh = engine.tick();
    assert!(refresh[0].recomputed);
    assert_eq!(refresh[0].window.as_ref().unwrap().total_candles, 4);
}

#[test]
fn test_daily_chart() {
    let mut store = InMemoryStore::new();
    store.add_entity(Entity::new("1", "Reading").with_events(vec![
        ScoreEvent::new(3.0, 1_000),
        ScoreEvent::new(-1.0, DAY_MS + 1_000),
        ScoreEvent::new(2.0, DAY_MS + 2_000),
    ]));
    let mut engine = Engine::new(store, &Config::default(), ManualClock::new(DAY_MS + 5_000));
    engine.select(ChartId::Primary, "1", Period::All);

    let refresh = engine.tick();
    assert!(!refresh[0].recomputed);
    assert_eq!(refresh[0].countdown.time_left_ms, DAY_MS - 5_000);

    let window = engine.view_window(ChartId::Primary).unwrap();
    assert_eq!(window.total_candles, 2);
    assert_eq!(window.candles[0].close, 3.0);
    assert_eq!(window.candles[1].open, 3.0);
    assert_eq!(window.candles[1].close, 4.0);
    assert!(window.candles[1].is_active);
    assert!(window.candles[0].is_completed());
}
