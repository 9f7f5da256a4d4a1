//! In-memory entity store.

use std::collections::HashMap;

use momentum_core::{Entity, ScoreEvent};

use crate::source::{CommentSource, EntitySource};

/// Live directions, the trash and candle comments, all held in memory.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    live: Vec<Entity>,
    trash: Vec<Entity>,
    comments: HashMap<String, String>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_parts(live: Vec<Entity>, trash: Vec<Entity>, comments: HashMap<String, String>) -> Self {
        Self { live, trash, comments }
    }

    pub fn add_entity(&mut self, entity: Entity) {
        self.live.push(entity);
    }

    /// Append an event to a live entity. Returns false for unknown ids.
    pub fn add_event(&mut self, entity_id: &str, event: ScoreEvent) -> bool {
        match self.live.iter_mut().find(|e| e.id == entity_id) {
            Some(entity) => {
                entity.events.push(event);
                true
            }
            None => false,
        }
    }

    /// Move a live entity to the trash.
    pub fn soft_delete(&mut self, entity_id: &str) -> bool {
        let Some(pos) = self.live.iter().position(|e| e.id == entity_id) else {
            return false;
        };
        let entity = self.live.remove(pos);
        self.trash.retain(|e| e.id != entity.id);
        self.trash.push(entity);
        true
    }

    /// Move a trashed entity back to the live set.
    pub fn restore(&mut self, entity_id: &str) -> bool {
        let Some(pos) = self.trash.iter().position(|e| e.id == entity_id) else {
            return false;
        };
        let entity = self.trash.remove(pos);
        self.live.retain(|e| e.id != entity.id);
        self.live.push(entity);
        true
    }

    /// Drop every event of every entity, live and trashed.
    pub fn clear_all_values(&mut self) {
        for entity in self.live.iter_mut().chain(self.trash.iter_mut()) {
            entity.events.clear();
        }
    }

    /// Store a comment. Blank text removes it.
    pub fn set_comment(&mut self, key: impl Into<String>, text: &str) {
        let key = key.into();
        let text = text.trim();
        if text.is_empty() {
            self.comments.remove(&key);
        } else {
            self.comments.insert(key, text.to_string());
        }
    }

    pub fn comments(&self) -> &HashMap<String, String> {
        &self.comments
    }
}

impl EntitySource for InMemoryStore {
    fn live_entities(&self) -> &[Entity] {
        &self.live
    }

    fn soft_deleted_entities(&self) -> &[Entity] {
        &self.trash
    }
}

impl CommentSource for InMemoryStore {
    fn comment(&self, key: &str) -> Option<String> {
        self.comments.get(key).cloned()
    }
}
