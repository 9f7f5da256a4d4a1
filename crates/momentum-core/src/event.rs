//! Score events and the entities that own them.

use serde::{Deserialize, Serialize};

/// Milliseconds since the Unix epoch.
pub type Timestamp = i64;

/// Identifier of a direction (or of the synthetic aggregate).
pub type EntityId = String;

/// Back-reference from a merged event to the entity it came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceRef {
    pub entity_id: EntityId,
    pub entity_name: String,
}

/// A single signed delta applied to an entity's running total.
///
/// Events are immutable once created. `source` is only populated on events
/// that were merged into an aggregate entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    pub value: f64,
    pub occurred_at: Timestamp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<SourceRef>,
}

impl ScoreEvent {
    pub fn new(value: f64, occurred_at: Timestamp) -> Self {
        Self {
            value,
            occurred_at,
            metadata: None,
            source: None,
        }
    }

    /// Attach opaque metadata (e.g. a session-calculator breakdown).
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = Some(metadata);
        self
    }

    /// Copy of this event tagged with the entity it was merged from.
    pub fn sourced_from(&self, entity: &Entity) -> Self {
        Self {
            source: Some(SourceRef {
                entity_id: entity.id.clone(),
                entity_name: entity.name.clone(),
            }),
            ..self.clone()
        }
    }
}

/// A scored direction: an id, a display name and its events.
///
/// Events are append-only but not necessarily in chronological order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub events: Vec<ScoreEvent>,
}

impl Entity {
    pub fn new(id: impl Into<EntityId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            events: Vec::new(),
        }
    }

    pub fn with_events(mut self, events: Vec<ScoreEvent>) -> Self {
        self.events = events;
        self
    }

    /// Sum of every event value.
    pub fn total(&self) -> f64 {
        self.events.iter().map(|e| e.value).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
