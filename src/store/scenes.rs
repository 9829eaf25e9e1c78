use tracing::warn;

use super::{StoryStore, StoreEvent};
use crate::entity::{Beat, Character, Scene, SceneOptions, SceneUpdate};
use crate::storage::KeyValueStore;

impl<S: KeyValueStore> StoryStore<S> {
    /// Create a scene over `beat_ids` and make it the current scene.
    ///
    /// Unknown beat ids are dropped. Beats already placed in another scene
    /// are moved here, since a beat belongs to at most one scene. An empty
    /// beat list is accepted.
    pub fn create_scene(&mut self, title: &str, beat_ids: Vec<String>, options: SceneOptions) -> Scene {
        let mut placed: Vec<String> = Vec::with_capacity(beat_ids.len());
        for id in beat_ids {
            if self.get_beat(&id).is_none() {
                warn!(beat_id = %id, "create_scene: dropping unknown beat");
            } else if !placed.contains(&id) {
                placed.push(id);
            }
        }

        let author = options
            .author
            .clone()
            .unwrap_or_else(|| self.current_user.clone());
        let scene = Scene::new(title.to_string(), placed, author, options, self.clock.now());

        let detached = self.detach_beats(&scene.beat_ids, None);
        self.scenes.push(scene.clone());
        self.current_scene = Some(scene.id.clone());
        if let Some(session) = self.active_session_mut() {
            session.scenes_created += 1;
        }

        self.commit(StoreEvent::SceneCreated(scene.clone()));
        self.announce_scene_updates(detached);
        scene
    }

    pub fn update_scene(&mut self, id: &str, update: SceneUpdate) -> Option<Scene> {
        let now = self.clock.now();
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == id) else {
            warn!(scene_id = id, "update_scene: scene not found");
            return None;
        };

        scene.apply(update);
        scene.modified = now;
        let updated = scene.clone();

        self.commit(StoreEvent::SceneUpdated(updated.clone()));
        Some(updated)
    }

    /// Remove a scene. Its beats stay in the store as orphans.
    pub fn delete_scene(&mut self, id: &str) -> bool {
        let Some(index) = self.scenes.iter().position(|s| s.id == id) else {
            warn!(scene_id = id, "delete_scene: scene not found");
            return false;
        };

        self.scenes.remove(index);
        if self.current_scene.as_deref() == Some(id) {
            self.current_scene = None;
        }

        self.commit(StoreEvent::SceneDeleted(id.to_string()));
        true
    }

    pub fn get_scene(&self, id: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.id == id)
    }

    /// Beats of a scene in `beat_ids` order, skipping ids that no longer resolve
    pub fn get_beats_for_scene(&self, id: &str) -> Vec<&Beat> {
        let Some(scene) = self.get_scene(id) else {
            return Vec::new();
        };

        scene
            .beat_ids
            .iter()
            .filter_map(|beat_id| self.get_beat(beat_id))
            .collect()
    }

    pub fn get_scenes_by_act(&self, act_id: &str) -> Vec<&Scene> {
        self.scenes.iter().filter(|s| s.act_id == act_id).collect()
    }

    pub fn get_scenes_by_chapter(&self, chapter_id: &str) -> Vec<&Scene> {
        self.scenes
            .iter()
            .filter(|s| s.chapter_id.as_deref() == Some(chapter_id))
            .collect()
    }

    pub fn get_characters_for_scene(&self, id: &str) -> Vec<&Character> {
        let Some(scene) = self.get_scene(id) else {
            return Vec::new();
        };

        scene
            .characters
            .iter()
            .filter_map(|character_id| self.get_character(character_id))
            .collect()
    }

    /// Insert a beat into a scene at `position` (appended when `None` or past
    /// the end). A beat already in this scene is moved; one in another scene
    /// is taken out of it first.
    pub fn add_beat_to_scene(&mut self, scene_id: &str, beat_id: &str, position: Option<usize>) -> Option<Scene> {
        if self.get_beat(beat_id).is_none() {
            warn!(beat_id, "add_beat_to_scene: beat not found");
            return None;
        }
        if self.get_scene(scene_id).is_none() {
            warn!(scene_id, "add_beat_to_scene: scene not found");
            return None;
        }

        let detached = self.detach_beats(&[beat_id.to_string()], Some(scene_id));
        let now = self.clock.now();
        let scene = self.scenes.iter_mut().find(|s| s.id == scene_id)?;

        scene.beat_ids.retain(|id| id != beat_id);
        let index = position
            .unwrap_or(scene.beat_ids.len())
            .min(scene.beat_ids.len());
        scene.beat_ids.insert(index, beat_id.to_string());
        scene.modified = now;
        let updated = scene.clone();

        self.commit(StoreEvent::SceneUpdated(updated.clone()));
        self.announce_scene_updates(detached);
        Some(updated)
    }

    /// Take a beat out of a scene, leaving it orphaned
    pub fn remove_beat_from_scene(&mut self, scene_id: &str, beat_id: &str) -> Option<Scene> {
        let now = self.clock.now();
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == scene_id) else {
            warn!(scene_id, "remove_beat_from_scene: scene not found");
            return None;
        };

        let before = scene.beat_ids.len();
        scene.beat_ids.retain(|id| id != beat_id);
        if scene.beat_ids.len() == before {
            warn!(scene_id, beat_id, "remove_beat_from_scene: beat not in scene");
            return None;
        }
        scene.modified = now;
        let updated = scene.clone();

        self.commit(StoreEvent::SceneUpdated(updated.clone()));
        Some(updated)
    }

    /// Replace a scene's beat order. `ordered` must hold exactly the scene's
    /// current beat ids.
    pub fn reorder_scene_beats(&mut self, scene_id: &str, ordered: Vec<String>) -> Option<Scene> {
        let now = self.clock.now();
        let Some(scene) = self.scenes.iter_mut().find(|s| s.id == scene_id) else {
            warn!(scene_id, "reorder_scene_beats: scene not found");
            return None;
        };

        let mut current = scene.beat_ids.clone();
        let mut proposed = ordered.clone();
        current.sort();
        proposed.sort();
        if current != proposed {
            warn!(scene_id, "reorder_scene_beats: order is not a permutation of the scene's beats");
            return None;
        }

        scene.beat_ids = ordered;
        scene.modified = now;
        let updated = scene.clone();

        self.commit(StoreEvent::SceneUpdated(updated.clone()));
        Some(updated)
    }

    /// Remove `beat_ids` from every scene other than `keep`, returning the
    /// scenes that changed
    fn detach_beats(&mut self, beat_ids: &[String], keep: Option<&str>) -> Vec<Scene> {
        self.touch_scenes(|scene| {
            if keep == Some(scene.id.as_str()) {
                return false;
            }
            let before = scene.beat_ids.len();
            scene.beat_ids.retain(|id| !beat_ids.contains(id));
            scene.beat_ids.len() != before
        })
    }

    /// Run `change` over every scene. Scenes it reports as changed get a new
    /// modified stamp and are returned for announcement.
    pub(super) fn touch_scenes(&mut self, mut change: impl FnMut(&mut Scene) -> bool) -> Vec<Scene> {
        let now = self.clock.now();
        let mut changed = Vec::new();

        for scene in self.scenes.iter_mut() {
            if change(scene) {
                scene.modified = now;
                changed.push(scene.clone());
            }
        }

        changed
    }

    pub(super) fn announce_scene_updates(&mut self, scenes: Vec<Scene>) {
        for scene in scenes {
            self.listeners.dispatch(&StoreEvent::SceneUpdated(scene));
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::StoreConfig;
    use crate::entity::{SceneOptions, SceneStatus, SceneUpdate};
    use crate::storage::MemoryStorage;
    use crate::store::{StoreEvent, StoryStore};
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> StoryStore<MemoryStorage> {
        StoryStore::open(MemoryStorage::new(), StoreConfig::default()).unwrap()
    }

    fn beat_ids(store: &mut StoryStore<MemoryStorage>, n: usize) -> Vec<String> {
        (0..n).map(|_| store.create_beat(None).id).collect()
    }

    #[test]
    fn test_create_scene_with_options() {
        let mut store = store();
        let ids = beat_ids(&mut store, 2);
        let scene = store.create_scene(
            "Opening",
            ids.clone(),
            SceneOptions {
                act_id: Some("act-2".to_string()),
                status: Some(SceneStatus::InProgress),
                mckee_element: Some("Inciting Incident".to_string()),
                purpose: Some("Hook the reader".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(scene.beat_ids, ids);
        assert_eq!(scene.act_id, "act-2");
        assert_eq!(scene.status, SceneStatus::InProgress);
        assert_eq!(scene.author, "Writer");
        assert_eq!(store.current_scene(), Some(scene.id.as_str()));
    }

    #[test]
    fn test_create_scene_with_no_beats_is_accepted() {
        let mut store = store();
        let scene = store.create_scene("Placeholder", vec![], SceneOptions::default());

        assert!(scene.beat_ids.is_empty());
        assert!(store.get_scene(&scene.id).is_some());
    }

    #[test]
    fn test_create_scene_drops_unknown_and_duplicate_beats() {
        let mut store = store();
        let ids = beat_ids(&mut store, 1);
        let scene = store.create_scene(
            "Opening",
            vec![ids[0].clone(), "beat-missing".to_string(), ids[0].clone()],
            SceneOptions::default(),
        );

        assert_eq!(scene.beat_ids, ids);
    }

    #[test]
    fn test_beat_moves_between_scenes() {
        let mut store = store();
        let ids = beat_ids(&mut store, 2);
        let first = store.create_scene("First", ids.clone(), SceneOptions::default());
        let updates = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&updates);
        store.add_listener(move |event| {
            if let StoreEvent::SceneUpdated(scene) = event {
                sink.borrow_mut().push(scene.id.clone());
            }
        });

        let second = store.create_scene("Second", vec![ids[1].clone()], SceneOptions::default());

        assert_eq!(store.get_scene(&first.id).unwrap().beat_ids, vec![ids[0].clone()]);
        assert_eq!(store.find_scene_for_beat(&ids[1]).unwrap().id, second.id);
        assert_eq!(*updates.borrow(), vec![first.id.clone()]);
    }

    #[test]
    fn test_update_scene() {
        let mut store = store();
        let scene = store.create_scene("Opening", vec![], SceneOptions::default());

        let updated = store
            .update_scene(
                &scene.id,
                SceneUpdate {
                    title: Some("Cold Open".to_string()),
                    status: Some(SceneStatus::Polished),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(updated.title, "Cold Open");
        assert_eq!(store.get_scene(&scene.id).unwrap().status, SceneStatus::Polished);
        assert!(store.update_scene("scene-missing", SceneUpdate::default()).is_none());
    }

    #[test]
    fn test_beats_for_scene_follow_order_and_skip_missing() {
        let mut store = store();
        let ids = beat_ids(&mut store, 3);
        let scene = store.create_scene(
            "Opening",
            vec![ids[2].clone(), ids[0].clone(), ids[1].clone()],
            SceneOptions::default(),
        );

        let ordered: Vec<&str> = store
            .get_beats_for_scene(&scene.id)
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ordered, vec![ids[2].as_str(), ids[0].as_str(), ids[1].as_str()]);

        // A dangling reference left by imported data is skipped
        let mut snapshot = store.export_all();
        snapshot.beats.retain(|b| b.id != ids[0]);
        assert!(store.import_all(&snapshot));

        let ordered: Vec<&str> = store
            .get_beats_for_scene(&scene.id)
            .iter()
            .map(|b| b.id.as_str())
            .collect();
        assert_eq!(ordered, vec![ids[2].as_str(), ids[1].as_str()]);
        assert!(store.get_beats_for_scene("scene-missing").is_empty());
    }

    #[test]
    fn test_delete_scene_orphans_its_beats() {
        let mut store = store();
        let ids = beat_ids(&mut store, 2);
        let scene = store.create_scene("Opening", ids.clone(), SceneOptions::default());
        assert!(store.get_orphaned_beats().is_empty());

        assert!(store.delete_scene(&scene.id));

        assert_eq!(store.beats().len(), 2);
        assert_eq!(store.get_orphaned_beats().len(), 2);
        assert_eq!(store.current_scene(), None);
        assert!(store.delete_beat(&ids[0]));
        assert!(!store.delete_scene(&scene.id));
    }

    #[test]
    fn test_add_beat_at_position() {
        let mut store = store();
        let ids = beat_ids(&mut store, 3);
        let scene = store.create_scene("Opening", vec![ids[0].clone(), ids[1].clone()], SceneOptions::default());

        let updated = store.add_beat_to_scene(&scene.id, &ids[2], Some(1)).unwrap();
        assert_eq!(updated.beat_ids, vec![ids[0].clone(), ids[2].clone(), ids[1].clone()]);

        // Moving within the same scene
        let updated = store.add_beat_to_scene(&scene.id, &ids[0], None).unwrap();
        assert_eq!(updated.beat_ids, vec![ids[2].clone(), ids[1].clone(), ids[0].clone()]);

        assert!(store.add_beat_to_scene(&scene.id, "beat-missing", None).is_none());
        assert!(store.add_beat_to_scene("scene-missing", &ids[0], None).is_none());
    }

    #[test]
    fn test_remove_beat_from_scene() {
        let mut store = store();
        let ids = beat_ids(&mut store, 2);
        let scene = store.create_scene("Opening", ids.clone(), SceneOptions::default());

        let updated = store.remove_beat_from_scene(&scene.id, &ids[0]).unwrap();
        assert_eq!(updated.beat_ids, vec![ids[1].clone()]);
        assert_eq!(store.get_orphaned_beats()[0].id, ids[0]);
        assert!(store.remove_beat_from_scene(&scene.id, &ids[0]).is_none());
    }

    #[test]
    fn test_reorder_scene_beats() {
        let mut store = store();
        let ids = beat_ids(&mut store, 3);
        let scene = store.create_scene("Opening", ids.clone(), SceneOptions::default());

        let reversed: Vec<String> = ids.iter().rev().cloned().collect();
        let updated = store.reorder_scene_beats(&scene.id, reversed.clone()).unwrap();
        assert_eq!(updated.beat_ids, reversed);

        assert!(store
            .reorder_scene_beats(&scene.id, vec![ids[0].clone()])
            .is_none());
    }

    #[test]
    fn test_scenes_by_act_and_chapter() {
        let mut store = store();
        let chapter = store.create_chapter("Arrival", "act-1", "").unwrap();
        store.create_scene(
            "One",
            vec![],
            SceneOptions {
                chapter_id: Some(chapter.id.clone()),
                ..Default::default()
            },
        );
        store.create_scene(
            "Two",
            vec![],
            SceneOptions {
                act_id: Some("act-3".to_string()),
                ..Default::default()
            },
        );

        assert_eq!(store.get_scenes_by_act("act-1").len(), 1);
        assert_eq!(store.get_scenes_by_act("act-3")[0].title, "Two");
        assert_eq!(store.get_scenes_by_chapter(&chapter.id)[0].title, "One");
    }
}
