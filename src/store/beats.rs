use std::collections::HashSet;

use tracing::warn;

use super::{StoryStore, StoreEvent};
use crate::entity::{Beat, Scene};
use crate::storage::KeyValueStore;

impl<S: KeyValueStore> StoryStore<S> {
    /// Create an empty beat and make it the current beat
    pub fn create_beat(&mut self, author: Option<&str>) -> Beat {
        self.create_beat_with_content(author, "")
    }

    pub fn create_beat_with_content(&mut self, author: Option<&str>, content: &str) -> Beat {
        let author = author.unwrap_or(&self.current_user).to_string();
        let mut beat = Beat::new(author, self.clock.now());
        beat.content = content.to_string();

        self.beats.push(beat.clone());
        self.current_beat = Some(beat.id.clone());
        if let Some(session) = self.active_session_mut() {
            session.beats_created += 1;
        }

        self.commit(StoreEvent::BeatCreated(beat.clone()));
        beat
    }

    /// Replace a beat's content. `None` if the beat does not exist.
    pub fn save_beat(&mut self, id: &str, content: &str) -> Option<Beat> {
        let now = self.clock.now();
        let Some(beat) = self.beats.iter_mut().find(|b| b.id == id) else {
            warn!(beat_id = id, "save_beat: beat not found");
            return None;
        };

        beat.content = content.to_string();
        beat.modified = now;
        let saved = beat.clone();

        self.commit(StoreEvent::BeatUpdated(saved.clone()));
        Some(saved)
    }

    /// Remove a beat. Refused while any scene still references it.
    pub fn delete_beat(&mut self, id: &str) -> bool {
        if let Some(scene) = self.find_scene_for_beat(id) {
            warn!(beat_id = id, scene_id = %scene.id, "delete_beat: beat is still part of a scene");
            return false;
        }

        let Some(index) = self.beats.iter().position(|b| b.id == id) else {
            warn!(beat_id = id, "delete_beat: beat not found");
            return false;
        };

        self.beats.remove(index);
        if self.current_beat.as_deref() == Some(id) {
            self.current_beat = None;
        }

        self.commit(StoreEvent::BeatDeleted(id.to_string()));
        true
    }

    pub fn get_beat(&self, id: &str) -> Option<&Beat> {
        self.beats.iter().find(|b| b.id == id)
    }

    /// Beats not referenced by any scene, in creation order
    pub fn get_orphaned_beats(&self) -> Vec<&Beat> {
        let placed: HashSet<&str> = self
            .scenes
            .iter()
            .flat_map(|s| s.beat_ids.iter().map(String::as_str))
            .collect();

        self.beats
            .iter()
            .filter(|b| !placed.contains(b.id.as_str()))
            .collect()
    }

    /// The scene whose beat list contains `beat_id`
    pub fn find_scene_for_beat(&self, beat_id: &str) -> Option<&Scene> {
        self.scenes
            .iter()
            .find(|s| s.beat_ids.iter().any(|id| id == beat_id))
    }
}
