//! Characters, locations, chapters and acts: the entities scenes point at.

use tracing::warn;

use super::{StoryStore, StoreEvent};
use crate::entity::{
    Act, ActUpdate, Chapter, ChapterUpdate, Character, CharacterOptions, CharacterUpdate,
    Location, LocationOptions, LocationUpdate, Relationship,
};
use crate::storage::KeyValueStore;

impl<S: KeyValueStore> StoryStore<S> {
    pub fn create_character(&mut self, name: &str, options: CharacterOptions) -> Character {
        let character = Character::new(name.to_string(), options, self.clock.now());
        self.characters.push(character.clone());
        self.commit(StoreEvent::CharacterCreated(character.clone()));
        character
    }

    pub fn update_character(&mut self, id: &str, update: CharacterUpdate) -> Option<Character> {
        self.modify_character(id, "update_character", |c| c.apply(update))
    }

    /// Record something the writer learned about a character
    pub fn add_discovery(&mut self, id: &str, discovery: &str) -> Option<Character> {
        self.modify_character(id, "add_discovery", |c| {
            c.discoveries.push(discovery.to_string())
        })
    }

    /// Link a character to another known character, replacing any existing
    /// link to the same target
    pub fn add_relationship(&mut self, id: &str, relationship: Relationship) -> Option<Character> {
        if relationship.character_id == id || self.get_character(&relationship.character_id).is_none() {
            warn!(
                character_id = id,
                target = %relationship.character_id,
                "add_relationship: invalid relationship target"
            );
            return None;
        }

        self.modify_character(id, "add_relationship", |c| {
            c.relationships
                .retain(|r| r.character_id != relationship.character_id);
            c.relationships.push(relationship);
        })
    }

    /// Remove a character from the store, from every scene's cast and from
    /// other characters' relationships
    pub fn delete_character(&mut self, id: &str) -> bool {
        let Some(index) = self.characters.iter().position(|c| c.id == id) else {
            warn!(character_id = id, "delete_character: character not found");
            return false;
        };

        self.characters.remove(index);
        let recast = self.touch_scenes(|scene| {
            let before = scene.characters.len();
            scene.characters.retain(|c| c != id);
            scene.characters.len() != before
        });
        for character in self.characters.iter_mut() {
            character.relationships.retain(|r| r.character_id != id);
        }

        self.commit(StoreEvent::CharacterDeleted(id.to_string()));
        self.announce_scene_updates(recast);
        true
    }

    pub fn get_character(&self, id: &str) -> Option<&Character> {
        self.characters.iter().find(|c| c.id == id)
    }

    fn modify_character(
        &mut self,
        id: &str,
        operation: &str,
        change: impl FnOnce(&mut Character),
    ) -> Option<Character> {
        let now = self.clock.now();
        let Some(character) = self.characters.iter_mut().find(|c| c.id == id) else {
            warn!(character_id = id, operation, "character not found");
            return None;
        };

        change(character);
        character.modified = now;
        let updated = character.clone();

        self.commit(StoreEvent::CharacterUpdated(updated.clone()));
        Some(updated)
    }

    pub fn create_location(&mut self, name: &str, options: LocationOptions) -> Location {
        let location = Location::new(name.to_string(), options, self.clock.now());
        self.locations.push(location.clone());
        self.commit(StoreEvent::LocationCreated(location.clone()));
        location
    }

    pub fn update_location(&mut self, id: &str, update: LocationUpdate) -> Option<Location> {
        let now = self.clock.now();
        let Some(location) = self.locations.iter_mut().find(|l| l.id == id) else {
            warn!(location_id = id, "update_location: location not found");
            return None;
        };

        location.apply(update);
        location.modified = now;
        let updated = location.clone();

        self.commit(StoreEvent::LocationUpdated(updated.clone()));
        Some(updated)
    }

    /// Remove a location and clear it from every scene set there
    pub fn delete_location(&mut self, id: &str) -> bool {
        let Some(index) = self.locations.iter().position(|l| l.id == id) else {
            warn!(location_id = id, "delete_location: location not found");
            return false;
        };

        self.locations.remove(index);
        let moved = self.touch_scenes(|scene| {
            if scene.location.as_deref() != Some(id) {
                return false;
            }
            scene.location = None;
            true
        });

        self.commit(StoreEvent::LocationDeleted(id.to_string()));
        self.announce_scene_updates(moved);
        true
    }

    pub fn get_location(&self, id: &str) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    /// Create a chapter numbered after the last chapter of `act_id`.
    /// `None` if the act does not exist.
    pub fn create_chapter(&mut self, title: &str, act_id: &str, description: &str) -> Option<Chapter> {
        if self.get_act(act_id).is_none() {
            warn!(act_id, "create_chapter: act not found");
            return None;
        }

        let number = self
            .chapters
            .iter()
            .filter(|c| c.act_id == act_id)
            .map(|c| c.number)
            .max()
            .unwrap_or(0)
            + 1;
        let chapter = Chapter::new(
            title.to_string(),
            act_id.to_string(),
            number,
            description.to_string(),
            self.clock.now(),
        );

        self.chapters.push(chapter.clone());
        self.commit(StoreEvent::ChapterCreated(chapter.clone()));
        Some(chapter)
    }

    pub fn update_chapter(&mut self, id: &str, update: ChapterUpdate) -> Option<Chapter> {
        let Some(chapter) = self.chapters.iter_mut().find(|c| c.id == id) else {
            warn!(chapter_id = id, "update_chapter: chapter not found");
            return None;
        };

        chapter.apply(update);
        let updated = chapter.clone();

        self.commit(StoreEvent::ChapterUpdated(updated.clone()));
        Some(updated)
    }

    /// Remove a chapter and detach its scenes
    pub fn delete_chapter(&mut self, id: &str) -> bool {
        let Some(index) = self.chapters.iter().position(|c| c.id == id) else {
            warn!(chapter_id = id, "delete_chapter: chapter not found");
            return false;
        };

        self.chapters.remove(index);
        let detached = self.touch_scenes(|scene| {
            if scene.chapter_id.as_deref() != Some(id) {
                return false;
            }
            scene.chapter_id = None;
            true
        });

        self.commit(StoreEvent::ChapterDeleted(id.to_string()));
        self.announce_scene_updates(detached);
        true
    }

    pub fn get_chapter(&self, id: &str) -> Option<&Chapter> {
        self.chapters.iter().find(|c| c.id == id)
    }

    /// Chapters of an act ordered by number
    pub fn get_chapters_by_act(&self, act_id: &str) -> Vec<&Chapter> {
        let mut chapters: Vec<&Chapter> = self
            .chapters
            .iter()
            .filter(|c| c.act_id == act_id)
            .collect();
        chapters.sort_by_key(|c| c.number);
        chapters
    }

    pub fn get_act(&self, id: &str) -> Option<&Act> {
        self.acts.iter().find(|a| a.id == id)
    }

    pub fn update_act(&mut self, id: &str, update: ActUpdate) -> Option<Act> {
        let Some(act) = self.acts.iter_mut().find(|a| a.id == id) else {
            warn!(act_id = id, "update_act: act not found");
            return None;
        };

        act.apply(update);
        let updated = act.clone();

        self.commit(StoreEvent::ActUpdated(updated.clone()));
        Some(updated)
    }
}

#[cfg(test)]
mod tests {
    use crate::clock::Clock;
    use crate::config::StoreConfig;
    use crate::entity::{
        ActUpdate, ChapterUpdate, CharacterOptions, CharacterUpdate, LocationOptions,
        LocationUpdate, Relationship, SceneOptions,
    };
    use crate::storage::MemoryStorage;
    use crate::store::{StoreEvent, StoryStore};
    use chrono::{DateTime, Duration, TimeZone, Utc};
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    /// Clock the test moves forward by hand
    #[derive(Clone)]
    struct ManualClock(Rc<Cell<DateTime<Utc>>>);

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            self.0.get()
        }
    }

    fn store() -> StoryStore<MemoryStorage> {
        StoryStore::open(MemoryStorage::new(), StoreConfig::default()).unwrap()
    }

    fn relationship(target: &str) -> Relationship {
        Relationship {
            character_id: target.to_string(),
            kind: "sibling".to_string(),
            description: String::new(),
        }
    }

    #[test]
    fn test_character_lifecycle() {
        let mut store = store();
        let joseph = store.create_character(
            "Joseph",
            CharacterOptions {
                role: Some("protagonist".to_string()),
                ..Default::default()
            },
        );
        assert_eq!(joseph.role, "protagonist");

        let updated = store
            .update_character(
                &joseph.id,
                CharacterUpdate {
                    description: Some("The dreamer".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.description, "The dreamer");

        let updated = store.add_discovery(&joseph.id, "Interprets dreams").unwrap();
        assert_eq!(updated.discoveries, vec!["Interprets dreams".to_string()]);

        assert!(store.update_character("char-missing", CharacterUpdate::default()).is_none());
        assert!(store.add_discovery("char-missing", "x").is_none());
    }

    #[test]
    fn test_add_relationship_validates_target() {
        let mut store = store();
        let joseph = store.create_character("Joseph", CharacterOptions::default());
        let reuben = store.create_character("Reuben", CharacterOptions::default());

        assert!(store.add_relationship(&joseph.id, relationship("char-missing")).is_none());
        assert!(store.add_relationship(&joseph.id, relationship(&joseph.id)).is_none());

        store.add_relationship(&joseph.id, relationship(&reuben.id)).unwrap();
        let updated = store.add_relationship(&joseph.id, relationship(&reuben.id)).unwrap();
        assert_eq!(updated.relationships.len(), 1);
    }

    #[test]
    fn test_delete_character_clears_references() {
        let mut store = store();
        let joseph = store.create_character("Joseph", CharacterOptions::default());
        let reuben = store.create_character("Reuben", CharacterOptions::default());
        store.add_relationship(&reuben.id, relationship(&joseph.id)).unwrap();
        let cast = vec![joseph.id.clone(), reuben.id.clone()];
        let first = store.create_scene("Pit", vec![], SceneOptions { characters: cast.clone(), ..Default::default() });
        let second = store.create_scene("Palace", vec![], SceneOptions { characters: cast, ..Default::default() });

        assert!(store.delete_character(&joseph.id));

        for id in [&first.id, &second.id] {
            assert_eq!(store.get_scene(id).unwrap().characters, vec![reuben.id.clone()]);
        }
        assert!(store.get_character(&reuben.id).unwrap().relationships.is_empty());
        assert!(!store.delete_character(&joseph.id));
        assert_eq!(store.get_characters_for_scene(&first.id).len(), 1);
    }

    #[test]
    fn test_location_lifecycle() {
        let mut store = store();
        let egypt = store.create_location(
            "Egypt",
            LocationOptions {
                importance: Some("major".to_string()),
                ..Default::default()
            },
        );
        let scene = store.create_scene(
            "Arrival",
            vec![],
            SceneOptions {
                location: Some(egypt.id.clone()),
                ..Default::default()
            },
        );

        let updated = store
            .update_location(
                &egypt.id,
                LocationUpdate {
                    description: Some("Land of the Nile".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(updated.importance, "major");
        assert_eq!(updated.description, "Land of the Nile");

        assert!(store.delete_location(&egypt.id));
        assert_eq!(store.get_scene(&scene.id).unwrap().location, None);
        assert!(store.get_location(&egypt.id).is_none());
        assert!(!store.delete_location(&egypt.id));
    }

    #[test]
    fn test_chapter_numbering_and_deletion() {
        let mut store = store();
        let one = store.create_chapter("Dreams", "act-1", "").unwrap();
        let two = store.create_chapter("The Pit", "act-1", "").unwrap();
        let other = store.create_chapter("Famine", "act-2", "").unwrap();
        assert!(store.create_chapter("Nowhere", "act-9", "").is_none());

        assert_eq!((one.number, two.number, other.number), (1, 2, 1));

        let scene = store.create_scene(
            "Coat",
            vec![],
            SceneOptions {
                chapter_id: Some(one.id.clone()),
                ..Default::default()
            },
        );
        let renamed = store
            .update_chapter(
                &one.id,
                ChapterUpdate {
                    title: Some("Coat of Many Colors".to_string()),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(renamed.title, "Coat of Many Colors");

        assert!(store.delete_chapter(&one.id));
        assert_eq!(store.get_scene(&scene.id).unwrap().chapter_id, None);
        let remaining: Vec<&str> = store
            .get_chapters_by_act("act-1")
            .iter()
            .map(|c| c.title.as_str())
            .collect();
        assert_eq!(remaining, vec!["The Pit"]);
    }

    #[test]
    fn test_update_act() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.add_listener(move |event| sink.borrow_mut().push(event.name()));

        let act = store
            .update_act(
                "act-2",
                ActUpdate {
                    target_beats: Some(40),
                    ..Default::default()
                },
            )
            .unwrap();

        assert_eq!(act.target_beats, 40);
        assert_eq!(store.get_act("act-2").unwrap().target_beats, 40);
        assert!(seen.borrow().contains(&"actUpdated"));
        assert!(store.update_act("act-7", ActUpdate::default()).is_none());
    }

    #[test]
    fn test_catalog_events() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.add_listener(move |event| {
            if !matches!(event, StoreEvent::Persist) {
                sink.borrow_mut().push(event.name());
            }
        });

        let c = store.create_character("Joseph", CharacterOptions::default());
        store.delete_character(&c.id);
        let l = store.create_location("Canaan", LocationOptions::default());
        store.delete_location(&l.id);

        assert_eq!(
            *seen.borrow(),
            vec!["characterCreated", "characterDeleted", "locationCreated", "locationDeleted"]
        );
    }

    #[test]
    fn test_deletes_restamp_and_announce_affected_scenes() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 8, 0, 0).unwrap();
        let clock = ManualClock(Rc::new(Cell::new(start)));
        let mut store =
            StoryStore::with_clock(MemoryStorage::new(), StoreConfig::default(), clock.clone())
                .unwrap();

        let joseph = store.create_character("Joseph", CharacterOptions::default());
        let egypt = store.create_location("Egypt", LocationOptions::default());
        let chapter = store.create_chapter("Dreams", "act-1", "").unwrap();
        let affected = store.create_scene(
            "Pit",
            vec![],
            SceneOptions {
                characters: vec![joseph.id.clone()],
                location: Some(egypt.id.clone()),
                chapter_id: Some(chapter.id.clone()),
                ..Default::default()
            },
        );
        let untouched = store.create_scene("Famine", vec![], SceneOptions::default());

        let updates = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&updates);
        store.add_listener(move |event| {
            if let StoreEvent::SceneUpdated(scene) = event {
                sink.borrow_mut().push((scene.id.clone(), scene.modified));
            }
        });

        let later = start + Duration::minutes(1);
        clock.0.set(later);
        assert!(store.delete_character(&joseph.id));
        assert_eq!(updates.borrow().last(), Some(&(affected.id.clone(), later)));

        let later = start + Duration::minutes(2);
        clock.0.set(later);
        assert!(store.delete_location(&egypt.id));
        assert_eq!(updates.borrow().last(), Some(&(affected.id.clone(), later)));

        let later = start + Duration::minutes(3);
        clock.0.set(later);
        assert!(store.delete_chapter(&chapter.id));
        assert_eq!(updates.borrow().last(), Some(&(affected.id.clone(), later)));

        assert_eq!(updates.borrow().len(), 3);
        let scene = store.get_scene(&affected.id).unwrap();
        assert!(scene.characters.is_empty());
        assert_eq!(scene.location, None);
        assert_eq!(scene.chapter_id, None);
        assert_eq!(scene.modified, start + Duration::minutes(3));
        assert_eq!(store.get_scene(&untouched.id).unwrap().modified, start);
    }
}
