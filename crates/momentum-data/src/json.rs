//! JSON snapshot import and export.
//!
//! The snapshot layout is shared with other clients of the same data:
//!
//! ```json
//! {
//!   "version": "1.1",
//!   "exportDate": "2024-05-01T10:00:00.000Z",
//!   "productivityData": {
//!     "directions": [{ "id": 1, "name": "Reading", "scores": [{ "value": 3, "date": "..." }] }],
//!     "trash": { "directions": [] },
//!     "comments": { "1|1m|1714557600000": "note" },
//!     "zoomState": { "visibleCandlesCount": 50 }
//!   }
//! }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Datelike, SecondsFormat, Utc};
use momentum_core::{Entity, ScoreEvent, Timestamp};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::source::{DataSource, EntitySource};
use crate::store::InMemoryStore;
use crate::validation;

pub const SNAPSHOT_VERSION: &str = "1.1";

/// Snapshot import errors.
#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid snapshot: {reason}")]
    Invalid { reason: String },
    #[error("Unparseable score date {date:?} in direction {direction}")]
    BadTimestamp { direction: String, date: String },
}

/// Direction ids are numbers in older exports and strings in newer ones.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Number(i64),
    Text(String),
}

impl RecordId {
    pub fn as_key(&self) -> String {
        match self {
            RecordId::Number(n) => n.to_string(),
            RecordId::Text(s) => s.clone(),
        }
    }

    /// Inverse of [`RecordId::as_key`]: canonical integers become numbers.
    pub fn from_key(key: &str) -> Self {
        match key.parse::<i64>() {
            Ok(n) if n.to_string() == key => RecordId::Number(n),
            _ => RecordId::Text(key.to_string()),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub value: f64,
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ScoreRecord {
    /// When the score happened: the RFC 3339 `date`, else the epoch `timestamp`.
    pub fn occurred_at(&self) -> Option<Timestamp> {
        parse_timestamp(&self.date).or(self.timestamp)
    }
}

/// One direction. Fields this crate does not model (category, description,
/// colors, ...) are kept in `extra` and written back unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectionRecord {
    pub id: RecordId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    pub scores: Vec<ScoreRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl DirectionRecord {
    /// This record with its scores and name replaced by `entity`'s.
    ///
    /// Scores that still match an original record (same time and value) keep
    /// that record verbatim, including its date string and unknown fields.
    fn updated_from(&self, entity: &Entity) -> Self {
        let mut originals: HashMap<(Timestamp, u64), Vec<&ScoreRecord>> = HashMap::new();
        for score in self.scores.iter().rev() {
            if let Some(at) = score.occurred_at() {
                originals.entry((at, score.value.to_bits())).or_default().push(score);
            }
        }

        let scores = entity
            .events
            .iter()
            .filter_map(|event| {
                match originals.get_mut(&(event.occurred_at, event.value.to_bits())).and_then(Vec::pop) {
                    Some(score) => Some(score.clone()),
                    None => score_record(event),
                }
            })
            .collect();

        Self {
            id: self.id.clone(),
            name: entity.name.clone(),
            created_at: self.created_at.clone(),
            scores,
            extra: self.extra.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrashRecord {
    #[serde(default)]
    pub directions: Vec<DirectionRecord>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ZoomPreference {
    pub visible_candles_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductivityData {
    pub directions: Vec<DirectionRecord>,
    #[serde(default)]
    pub trash: TrashRecord,
    #[serde(default)]
    pub comments: HashMap<String, String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zoom_state: Option<ZoomPreference>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A full export of directions, trash and comments.
///
/// Unknown keys at every level (categories, layout mode, ...) are carried in
/// the `extra` maps so a re-export does not lose them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export_date: Option<String>,
    pub productivity_data: ProductivityData,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Snapshot {
    /// Parse and validate a snapshot.
    pub fn from_json(json: &str) -> Result<Self, ImportError> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        validation::validate_snapshot(&snapshot)?;
        Ok(snapshot)
    }

    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Build a fresh snapshot of `store` as of `now`.
    pub fn from_store(store: &InMemoryStore, visible_count: Option<usize>, now: Timestamp) -> Self {
        let fresh = |entities: &[Entity]| entities.iter().map(|e| direction_record(e, now)).collect::<Vec<_>>();
        Self {
            version: SNAPSHOT_VERSION.to_string(),
            export_date: format_timestamp(now),
            productivity_data: ProductivityData {
                directions: fresh(store.live_entities()),
                trash: TrashRecord {
                    directions: fresh(store.soft_deleted_entities()),
                    extra: Map::new(),
                },
                comments: store.comments().clone(),
                zoom_state: visible_count.map(|n| ZoomPreference {
                    visible_candles_count: n,
                }),
                extra: Map::new(),
            },
            extra: Map::new(),
        }
    }

    /// Re-export this snapshot with the contents of `store`.
    ///
    /// Directions that came from this snapshot keep their id, creation date
    /// and unknown fields; they move between live and trash as the store did.
    /// Directions the store gained are written as fresh records.
    pub fn updated_from(&self, store: &InMemoryStore, visible_count: Option<usize>, now: Timestamp) -> Self {
        let data = &self.productivity_data;
        let export = |entities: &[Entity], home: &[DirectionRecord], away: &[DirectionRecord]| {
            entities
                .iter()
                .map(|entity| match find_record(home, &entity.id).or_else(|| find_record(away, &entity.id)) {
                    Some(record) => record.updated_from(entity),
                    None => direction_record(entity, now),
                })
                .collect::<Vec<_>>()
        };

        Self {
            version: SNAPSHOT_VERSION.to_string(),
            export_date: format_timestamp(now),
            productivity_data: ProductivityData {
                directions: export(store.live_entities(), &data.directions, &data.trash.directions),
                trash: TrashRecord {
                    directions: export(store.soft_deleted_entities(), &data.trash.directions, &data.directions),
                    extra: data.trash.extra.clone(),
                },
                comments: store.comments().clone(),
                zoom_state: visible_count
                    .map(|n| ZoomPreference {
                        visible_candles_count: n,
                    })
                    .or(data.zoom_state),
                extra: data.extra.clone(),
            },
            extra: self.extra.clone(),
        }
    }

    /// Convert into an in-memory store.
    pub fn into_store(self) -> Result<InMemoryStore, ImportError> {
        let data = self.productivity_data;
        let live = data
            .directions
            .into_iter()
            .map(direction_entity)
            .collect::<Result<Vec<_>, _>>()?;
        let trash = data
            .trash
            .directions
            .into_iter()
            .map(direction_entity)
            .collect::<Result<Vec<_>, _>>()?;

        log::info!(
            "Imported {} directions ({} in trash, {} comments)",
            live.len(),
            trash.len(),
            data.comments.len()
        );
        Ok(InMemoryStore::from_parts(live, trash, data.comments))
    }

    /// The stored visible candle count preference, if any.
    pub fn visible_count(&self) -> Option<usize> {
        self.productivity_data.zoom_state.map(|z| z.visible_candles_count)
    }
}

/// Read and validate a snapshot file.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, ImportError> {
    let content = fs::read_to_string(path)?;
    Snapshot::from_json(&content)
}

/// Write a snapshot file.
pub fn save_snapshot<P: AsRef<Path>>(path: P, snapshot: &Snapshot) -> Result<(), ImportError> {
    fs::write(path, snapshot.to_json_pretty()?)?;
    Ok(())
}

/// Loads snapshots from a JSON file on disk.
pub struct JsonLoader {
    path: PathBuf,
}

impl JsonLoader {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl DataSource for JsonLoader {
    fn load(&self) -> anyhow::Result<Snapshot> {
        Ok(load_snapshot(&self.path)?)
    }
}

/// Parse an RFC 3339 date into epoch milliseconds.
pub fn parse_timestamp(date: &str) -> Option<Timestamp> {
    DateTime::parse_from_rfc3339(date).ok().map(|dt| dt.timestamp_millis())
}

/// Format epoch milliseconds the way browsers' `toISOString` does.
///
/// `None` outside the four-digit years that format can express.
pub fn format_timestamp(ts: Timestamp) -> Option<String> {
    DateTime::<Utc>::from_timestamp_millis(ts)
        .filter(|dt| (0..=9999).contains(&dt.year()))
        .map(|dt| dt.to_rfc3339_opts(SecondsFormat::Millis, true))
}

fn find_record<'a>(records: &'a [DirectionRecord], id: &str) -> Option<&'a DirectionRecord> {
    records.iter().find(|r| r.id.as_key() == id)
}

fn direction_entity(record: DirectionRecord) -> Result<Entity, ImportError> {
    let id = record.id.as_key();
    let events = record
        .scores
        .into_iter()
        .map(|score| {
            let occurred_at = score.occurred_at().ok_or_else(|| ImportError::BadTimestamp {
                direction: id.clone(),
                date: score.date.clone(),
            })?;
            let event = ScoreEvent::new(score.value, occurred_at);
            let event = match score.meta {
                Some(meta) => event.with_metadata(meta),
                None => event,
            };
            if !validation::validate_event(&event) {
                return Err(ImportError::Invalid {
                    reason: format!("direction {id} has a non-finite score"),
                });
            }
            Ok(event)
        })
        .collect::<Result<Vec<_>, ImportError>>()?;

    Ok(Entity::new(id, record.name).with_events(events))
}

fn score_record(event: &ScoreEvent) -> Option<ScoreRecord> {
    let Some(date) = format_timestamp(event.occurred_at) else {
        log::warn!("Skipping score at unrepresentable time {}", event.occurred_at);
        return None;
    };
    Some(ScoreRecord {
        value: event.value,
        date,
        timestamp: Some(event.occurred_at),
        meta: event.metadata.clone(),
        extra: Map::new(),
    })
}

/// A new record for an entity the snapshot has not seen. It is dated by its
/// earliest score, or by `now` when it has none.
fn direction_record(entity: &Entity, now: Timestamp) -> DirectionRecord {
    let first = entity.events.iter().map(|e| e.occurred_at).min().unwrap_or(now);
    DirectionRecord {
        id: RecordId::from_key(&entity.id),
        name: entity.name.clone(),
        created_at: format_timestamp(first).or_else(|| format_timestamp(now)),
        scores: entity.events.iter().filter_map(score_record).collect(),
        extra: Map::new(),
    }
}
