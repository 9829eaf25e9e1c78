//! Whole-store export and import.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{StoryStore, StoreEvent};
use crate::entity::{default_acts, Act, Beat, Chapter, Character, Location, Scene, Session};
use crate::error::{ChronicleError, Result};
use crate::storage::KeyValueStore;

/// Backup format version. Imports with any other version are rejected.
pub const SNAPSHOT_VERSION: &str = "1.0";

/// A complete copy of the store, as written to a backup file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub version: String,
    #[serde(default = "Utc::now")]
    pub exported: DateTime<Utc>,
    pub beats: Vec<Beat>,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub characters: Vec<Character>,
    #[serde(default)]
    pub locations: Vec<Location>,
    #[serde(default)]
    pub chapters: Vec<Chapter>,
    #[serde(default)]
    pub acts: Vec<Act>,
    #[serde(default)]
    pub sessions: Vec<Session>,
}

impl<S: KeyValueStore> StoryStore<S> {
    pub fn export_all(&self) -> Snapshot {
        Snapshot {
            version: SNAPSHOT_VERSION.to_string(),
            exported: self.clock.now(),
            beats: self.beats.clone(),
            scenes: self.scenes.clone(),
            characters: self.characters.clone(),
            locations: self.locations.clone(),
            chapters: self.chapters.clone(),
            acts: self.acts.clone(),
            sessions: self.sessions.clone(),
        }
    }

    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.export_all())?)
    }

    /// Replace the store's contents with `snapshot`. Returns false, leaving
    /// the store untouched, if the snapshot is rejected.
    pub fn import_all(&mut self, snapshot: &Snapshot) -> bool {
        match self.try_import(snapshot) {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "import rejected");
                false
            }
        }
    }

    /// Import `snapshot`, or fail without touching the store.
    ///
    /// A beat listed by more than one scene stays with the first scene that
    /// lists it and is dropped from the rest.
    pub fn try_import(&mut self, snapshot: &Snapshot) -> Result<()> {
        if snapshot.version != SNAPSHOT_VERSION {
            return Err(ChronicleError::VersionMismatch {
                expected: SNAPSHOT_VERSION.to_string(),
                found: snapshot.version.clone(),
            });
        }

        self.beats = snapshot.beats.clone();
        self.scenes = snapshot.scenes.clone();
        let mut placed = HashSet::new();
        for scene in self.scenes.iter_mut() {
            scene.beat_ids.retain(|id| {
                let first = placed.insert(id.clone());
                if !first {
                    warn!(beat_id = %id, scene_id = %scene.id, "import: beat already placed in an earlier scene");
                }
                first
            });
        }
        self.characters = snapshot.characters.clone();
        self.locations = snapshot.locations.clone();
        self.chapters = snapshot.chapters.clone();
        self.acts = if snapshot.acts.is_empty() {
            default_acts()
        } else {
            snapshot.acts.clone()
        };
        self.sessions = snapshot.sessions.clone();
        self.current_beat = None;
        self.current_scene = None;

        info!(
            beats = self.beats.len(),
            scenes = self.scenes.len(),
            "imported story data"
        );
        self.commit(StoreEvent::DataImported);
        Ok(())
    }

    /// Parse and import a backup document. Malformed documents, documents
    /// missing the beat or scene arrays, and version mismatches are all
    /// rejected before anything changes.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let value: serde_json::Value = serde_json::from_str(json)
            .map_err(|e| ChronicleError::InvalidSnapshot(e.to_string()))?;

        let version = value
            .get("version")
            .and_then(|v| v.as_str())
            .ok_or_else(|| ChronicleError::InvalidSnapshot("missing version".to_string()))?;
        if version != SNAPSHOT_VERSION {
            return Err(ChronicleError::VersionMismatch {
                expected: SNAPSHOT_VERSION.to_string(),
                found: version.to_string(),
            });
        }

        let snapshot: Snapshot = serde_json::from_value(value)
            .map_err(|e| ChronicleError::InvalidSnapshot(e.to_string()))?;
        self.try_import(&snapshot)
    }

    /// Drop every entity and start over with the default acts
    pub fn clear_all(&mut self) {
        self.beats.clear();
        self.scenes.clear();
        self.characters.clear();
        self.locations.clear();
        self.chapters.clear();
        self.sessions.clear();
        self.acts = default_acts();
        self.current_beat = None;
        self.current_scene = None;

        self.commit(StoreEvent::DataCleared);
    }
}
