//! Key-value persistence backends.
//!
//! The story store keeps one JSON entry per collection, the same layout a
//! browser's local storage would hold. Backends only need string get/set,
//! removal and key enumeration.

mod loro_storage;
mod memory;

pub use loro_storage::{LoroStorage, CHRONICLE_DIR};
pub use memory::MemoryStorage;

use crate::error::Result;

pub const BEATS_KEY: &str = "chronicle_beats";
pub const SCENES_KEY: &str = "chronicle_scenes";
pub const CHARACTERS_KEY: &str = "chronicle_characters";
pub const LOCATIONS_KEY: &str = "chronicle_locations";
pub const CHAPTERS_KEY: &str = "chronicle_chapters";
pub const ACTS_KEY: &str = "chronicle_acts";
pub const SESSIONS_KEY: &str = "chronicle_sessions";
pub const CURRENT_USER_KEY: &str = "chronicle_current_user";

/// Prefix of pre-migration single-scene records
pub const LEGACY_SCENE_PREFIX: &str = "scene_";

/// Browser local storage budget, used for size warnings
pub const LOCAL_STORAGE_QUOTA: usize = 5 * 1024 * 1024;

pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&mut self, key: &str, value: &str) -> Result<()>;

    /// All keys currently present, in no particular order
    fn keys(&self) -> Vec<String>;

    /// Make preceding writes durable. Backends that write through need not override.
    fn commit(&mut self) -> Result<()> {
        Ok(())
    }

    /// Total bytes held (keys plus values)
    fn size_in_bytes(&self) -> usize {
        self.keys()
            .iter()
            .map(|k| k.len() + self.get(k).map(|v| v.len()).unwrap_or(0))
            .sum()
    }
}
