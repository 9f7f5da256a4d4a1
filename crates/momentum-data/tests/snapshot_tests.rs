//! Snapshot files on disk.

use momentum_core::{build_series, Entity, Period, ScoreEvent, HOUR_MS};
use momentum_data::{
    comment_key, load_snapshot, save_snapshot, CommentSource, DataSource, EntitySource, ImportError, InMemoryStore,
    JsonLoader, Snapshot,
};
use tempfile::TempDir;

fn sample_store() -> InMemoryStore {
    let mut store = InMemoryStore::new();
    store.add_entity(Entity::new("1", "Reading").with_events(vec![
        ScoreEvent::new(3.0, HOUR_MS),
        ScoreEvent::new(-1.0, 2 * HOUR_MS),
    ]));
    store.add_entity(Entity::new("2", "Sport").with_events(vec![ScoreEvent::new(6.0, HOUR_MS + 5)]));
    store.soft_delete("2");
    store.set_comment(comment_key("1", Period::Hour1, HOUR_MS), "  good session ");
    store
}

#[test]
fn test_save_and_load_through_loader() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("backup.json");

    let store = sample_store();
    save_snapshot(&path, &Snapshot::from_store(&store, Some(80), 3 * HOUR_MS)).unwrap();

    let snapshot = JsonLoader::new(&path).load().unwrap();
    assert_eq!(snapshot.version, "1.1");
    assert_eq!(snapshot.export_date.as_deref(), Some("1970-01-01T03:00:00.000Z"));
    assert_eq!(snapshot.visible_count(), Some(80));

    let loaded = snapshot.into_store().unwrap();
    assert_eq!(loaded.live_entities(), store.live_entities());
    assert_eq!(loaded.soft_deleted_entities()[0].id, "2");
    assert_eq!(
        loaded.comment(&comment_key("1", Period::Hour1, HOUR_MS)).as_deref(),
        Some("good session")
    );
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope.json");

    assert!(matches!(load_snapshot(&missing), Err(ImportError::Io(_))));

    let err = JsonLoader::new(&missing).load().unwrap_err();
    assert!(matches!(err.downcast_ref::<ImportError>(), Some(ImportError::Io(_))));
}

#[test]
fn test_blank_name_is_rejected() {
    let json = r#"{"productivityData":{"directions":[{"id":7,"name":"  ","scores":[]}]}}"#;
    assert!(matches!(Snapshot::from_json(json), Err(ImportError::Invalid { .. })));
}

#[test]
fn test_score_order_does_not_change_candles() {
    let ordered = r#"{"productivityData":{"directions":[{"id":1,"name":"A","scores":[
        {"value":2,"date":"1970-01-01T00:10:00Z"},
        {"value":-4,"date":"1970-01-01T00:20:00Z"},
        {"value":1,"date":"1970-01-01T01:30:00Z"}
    ]}]}}"#;
    let shuffled = r#"{"productivityData":{"directions":[{"id":1,"name":"A","scores":[
        {"value":1,"date":"1970-01-01T01:30:00Z"},
        {"value":2,"date":"1970-01-01T00:10:00Z"},
        {"value":-4,"date":"1970-01-01T00:20:00Z"}
    ]}]}}"#;

    let now = 2 * HOUR_MS - 1;
    let build = |json: &str| {
        let store = Snapshot::from_json(json).unwrap().into_store().unwrap();
        build_series(store.live_entity("1").unwrap(), Period::Hour1, now).unwrap()
    };

    let a = build(ordered);
    let b = build(shuffled);
    assert_eq!(a.candles, b.candles);
    assert_eq!(a.candles.len(), 2);
    assert_eq!(a.candles[0].low, -2.0);
    assert_eq!(a.closing_total(), -1.0);
}

#[test]
fn test_export_to_new_file_keeps_source_intact() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("data.json");
    let target = dir.path().join("export.json");
    let json = r#"{"version":"1.1","layoutMode":"list","productivityData":{"directions":[
        {"id":5,"name":"Reading","createdAt":"1970-01-01T00:00:00.000Z","category":"study","scores":[{"value":3,"date":"1970-01-01T01:00:00Z"}]}
    ]}}"#;
    std::fs::write(&source, json).unwrap();

    let original = load_snapshot(&source).unwrap();
    let mut store = original.clone().into_store().unwrap();
    store.add_event("5", ScoreEvent::new(1.0, 2 * HOUR_MS));
    save_snapshot(&target, &original.updated_from(&store, Some(60), 3 * HOUR_MS)).unwrap();

    assert_eq!(std::fs::read_to_string(&source).unwrap(), json);
    let exported = load_snapshot(&target).unwrap();
    assert_eq!(exported.visible_count(), Some(60));
    assert_eq!(exported.extra["layoutMode"], "list");
    let reading = &exported.productivity_data.directions[0];
    assert_eq!(reading.extra["category"], "study");
    assert_eq!(reading.created_at.as_deref(), Some("1970-01-01T00:00:00.000Z"));
    assert_eq!(exported.into_store().unwrap().live_entity("5").unwrap().total(), 4.0);
}
