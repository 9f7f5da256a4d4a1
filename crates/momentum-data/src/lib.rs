//! Data access for momentum: collaborator traits, an in-memory store and
//! JSON snapshots.

pub mod json;
pub mod source;
pub mod store;
pub mod validation;

pub use json::{load_snapshot, save_snapshot, ImportError, JsonLoader, Snapshot};
pub use source::{comment_key, CommentSource, DataSource, EntitySource, MutationHook, NoopHook};
pub use store::InMemoryStore;
