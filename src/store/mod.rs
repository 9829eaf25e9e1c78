//! The story data store.
//!
//! [`StoryStore`] is the only authority for reading and writing beats,
//! scenes, characters, locations, chapters, acts and sessions. It loads its
//! collections from a [`KeyValueStore`] on open, writes them back after
//! mutations (immediately or on `flush`, per [`PersistMode`]) and notifies
//! listeners of every change.
//!
//! Operations that target a missing id log a warning and return `None` or
//! `false`; nothing on the CRUD surface returns an error.

mod backup;
mod beats;
mod catalog;
mod events;
mod migration;
mod scenes;
mod stats;

pub use backup::{Snapshot, SNAPSHOT_VERSION};
pub use events::{ListenerId, StoreEvent};
pub use stats::{strip_markup, word_count, BeatStats, SceneStats, StoryStats};

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::clock::{Clock, SystemClock};
use crate::config::{PersistMode, StoreConfig};
use crate::entity::{default_acts, Act, Beat, Chapter, Character, Location, Scene, Session};
use crate::error::{ChronicleError, Result};
use crate::storage::{
    KeyValueStore, ACTS_KEY, BEATS_KEY, CHAPTERS_KEY, CHARACTERS_KEY, CURRENT_USER_KEY,
    LOCATIONS_KEY, SCENES_KEY, SESSIONS_KEY,
};
use events::Listeners;

pub struct StoryStore<S: KeyValueStore> {
    storage: S,
    config: StoreConfig,
    clock: Box<dyn Clock>,

    beats: Vec<Beat>,
    scenes: Vec<Scene>,
    characters: Vec<Character>,
    locations: Vec<Location>,
    chapters: Vec<Chapter>,
    acts: Vec<Act>,
    sessions: Vec<Session>,

    current_user: String,
    current_beat: Option<String>,
    current_scene: Option<String>,

    listeners: Listeners,
    dirty: bool,
    last_persist_error: Option<String>,
}

impl<S: KeyValueStore> StoryStore<S> {
    /// Load a store from `storage`, seeding default acts and migrating
    /// legacy scene records on first run
    pub fn open(storage: S, config: StoreConfig) -> Result<Self> {
        Self::with_clock(storage, config, SystemClock)
    }

    pub fn with_clock(storage: S, config: StoreConfig, clock: impl Clock + 'static) -> Result<Self> {
        let beats = load_collection(&storage, BEATS_KEY)?;
        let scenes = load_collection(&storage, SCENES_KEY)?;
        let characters = load_collection(&storage, CHARACTERS_KEY)?;
        let locations = load_collection(&storage, LOCATIONS_KEY)?;
        let chapters = load_collection(&storage, CHAPTERS_KEY)?;
        let mut acts: Vec<Act> = load_collection(&storage, ACTS_KEY)?;
        let sessions = load_collection(&storage, SESSIONS_KEY)?;

        let current_user = storage
            .get(CURRENT_USER_KEY)
            .map(|raw| serde_json::from_str::<String>(&raw).unwrap_or(raw))
            .unwrap_or_else(|| config.default_author.clone());

        let mut needs_write = false;
        if acts.is_empty() {
            acts = default_acts();
            needs_write = true;
        }

        let mut store = Self {
            storage,
            config,
            clock: Box::new(clock),
            beats,
            scenes,
            characters,
            locations,
            chapters,
            acts,
            sessions,
            current_user,
            current_beat: None,
            current_scene: None,
            listeners: Listeners::default(),
            dirty: false,
            last_persist_error: None,
        };

        if store.migrate_legacy_scenes() > 0 {
            needs_write = true;
        }
        if needs_write {
            store.persist();
        }

        Ok(store)
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Flush pending writes and hand back the storage backend
    pub fn into_storage(mut self) -> S {
        self.flush();
        self.storage
    }

    // Collections

    pub fn beats(&self) -> &[Beat] {
        &self.beats
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn characters(&self) -> &[Character] {
        &self.characters
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn chapters(&self) -> &[Chapter] {
        &self.chapters
    }

    pub fn acts(&self) -> &[Act] {
        &self.acts
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    // Cursors

    pub fn current_user(&self) -> &str {
        &self.current_user
    }

    pub fn set_current_user(&mut self, name: &str) {
        self.current_user = name.to_string();
        self.commit(StoreEvent::UserChanged(self.current_user.clone()));
    }

    pub fn current_beat(&self) -> Option<&str> {
        self.current_beat.as_deref()
    }

    /// Point the beat cursor at a known beat, or clear it
    pub fn set_current_beat(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.get_beat(id).is_none() => {
                warn!(beat_id = id, "cannot select unknown beat");
                false
            }
            _ => {
                self.current_beat = id.map(str::to_string);
                true
            }
        }
    }

    pub fn current_scene(&self) -> Option<&str> {
        self.current_scene.as_deref()
    }

    /// Point the scene cursor at a known scene, or clear it
    pub fn set_current_scene(&mut self, id: Option<&str>) -> bool {
        match id {
            Some(id) if self.get_scene(id).is_none() => {
                warn!(scene_id = id, "cannot select unknown scene");
                false
            }
            _ => {
                self.current_scene = id.map(str::to_string);
                true
            }
        }
    }

    // Sessions

    /// Begin a writing session, ending any session still open
    pub fn start_session(&mut self, author: Option<&str>) -> Session {
        let now = self.clock.now();
        for session in self.sessions.iter_mut().filter(|s| s.is_active()) {
            session.end_time = Some(now);
        }

        let author = author.unwrap_or(&self.current_user).to_string();
        let session = Session::new(author, now);
        self.sessions.push(session.clone());
        self.persist();
        session
    }

    pub fn end_session(&mut self) -> Option<Session> {
        let now = self.clock.now();
        let session = self.sessions.iter_mut().rev().find(|s| s.is_active())?;
        session.end_time = Some(now);
        let ended = session.clone();
        self.persist();
        Some(ended)
    }

    pub fn active_session(&self) -> Option<&Session> {
        self.sessions.iter().rev().find(|s| s.is_active())
    }

    fn active_session_mut(&mut self) -> Option<&mut Session> {
        self.sessions.iter_mut().rev().find(|s| s.is_active())
    }

    // Notifications

    pub fn add_listener(&mut self, callback: impl FnMut(&StoreEvent) + 'static) -> ListenerId {
        self.listeners.add(Box::new(callback))
    }

    pub fn remove_listener(&mut self, id: ListenerId) -> bool {
        self.listeners.remove(id)
    }

    // Persistence

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Message of the most recent failed write, cleared by the next success
    pub fn last_persist_error(&self) -> Option<&str> {
        self.last_persist_error.as_deref()
    }

    /// Write every collection to storage. On failure the in-memory state is
    /// kept, the error is recorded and the store stays dirty.
    pub fn save(&mut self) -> bool {
        match self.try_save() {
            Ok(()) => {
                self.dirty = false;
                self.last_persist_error = None;
                self.listeners.dispatch(&StoreEvent::Persist);
                true
            }
            Err(e) => {
                error!(error = %e, "failed to persist story data");
                self.dirty = true;
                self.last_persist_error = Some(e.to_string());
                false
            }
        }
    }

    pub fn try_save(&mut self) -> Result<()> {
        write_collection(&mut self.storage, BEATS_KEY, &self.beats)?;
        write_collection(&mut self.storage, SCENES_KEY, &self.scenes)?;
        write_collection(&mut self.storage, CHARACTERS_KEY, &self.characters)?;
        write_collection(&mut self.storage, LOCATIONS_KEY, &self.locations)?;
        write_collection(&mut self.storage, CHAPTERS_KEY, &self.chapters)?;
        write_collection(&mut self.storage, ACTS_KEY, &self.acts)?;
        write_collection(&mut self.storage, SESSIONS_KEY, &self.sessions)?;
        write_collection(&mut self.storage, CURRENT_USER_KEY, &self.current_user)?;
        self.storage.commit()?;
        debug!(beats = self.beats.len(), scenes = self.scenes.len(), "persisted story data");
        Ok(())
    }

    /// Write pending changes; a clean store is left alone
    pub fn flush(&mut self) -> bool {
        if !self.dirty {
            return true;
        }
        self.save()
    }

    /// Write now or mark dirty, depending on the persist mode
    fn persist(&mut self) {
        match self.config.persist_mode {
            PersistMode::Immediate => {
                self.save();
            }
            PersistMode::Deferred => self.dirty = true,
        }
    }

    /// Finish a mutation: persist, then notify
    fn commit(&mut self, event: StoreEvent) {
        self.persist();
        self.listeners.dispatch(&event);
    }
}

fn load_collection<S: KeyValueStore, T: DeserializeOwned + Default>(storage: &S, key: &str) -> Result<T> {
    match storage.get(key) {
        Some(json) => serde_json::from_str(&json)
            .map_err(|e| ChronicleError::Storage(format!("corrupt entry '{}': {}", key, e))),
        None => Ok(T::default()),
    }
}

fn write_collection<S: KeyValueStore, T: Serialize + ?Sized>(
    storage: &mut S,
    key: &str,
    value: &T,
) -> Result<()> {
    let json = serde_json::to_string(value)?;
    storage.set(key, &json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn store() -> StoryStore<MemoryStorage> {
        StoryStore::open(MemoryStorage::new(), StoreConfig::default()).unwrap()
    }

    #[test]
    fn test_open_seeds_default_acts() {
        let storage = MemoryStorage::new();
        let store = StoryStore::open(storage.clone(), StoreConfig::default()).unwrap();

        assert_eq!(store.acts().len(), 3);
        assert!(storage.get(ACTS_KEY).is_some());
        assert_eq!(store.current_user(), "Writer");
    }

    #[test]
    fn test_reopen_restores_collections_and_user() {
        let storage = MemoryStorage::new();
        let mut store = StoryStore::open(storage.clone(), StoreConfig::default()).unwrap();
        store.set_current_user("Ada");
        let beat = store.create_beat(None);
        store.save_beat(&beat.id, "<p>Hello</p>");

        let reopened = StoryStore::open(storage, StoreConfig::default()).unwrap();
        assert_eq!(reopened.current_user(), "Ada");
        assert_eq!(reopened.get_beat(&beat.id).unwrap().content, "<p>Hello</p>");
        assert_eq!(reopened.get_beat(&beat.id).unwrap().author, "Ada");
    }

    #[test]
    fn test_corrupt_collection_fails_open() {
        let mut storage = MemoryStorage::new();
        storage.set(BEATS_KEY, "{not json").unwrap();

        let result = StoryStore::open(storage, StoreConfig::default());
        assert!(matches!(result, Err(ChronicleError::Storage(_))));
    }

    #[test]
    fn test_user_changed_event() {
        let mut store = store();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        store.add_listener(move |event| {
            if let StoreEvent::UserChanged(name) = event {
                sink.borrow_mut().push(name.clone());
            }
        });

        store.set_current_user("Grace");
        assert_eq!(*seen.borrow(), vec!["Grace".to_string()]);
    }

    #[test]
    fn test_cursor_rejects_unknown_ids() {
        let mut store = store();
        let beat = store.create_beat(None);

        assert!(!store.set_current_beat(Some("beat-missing")));
        assert_eq!(store.current_beat(), Some(beat.id.as_str()));
        assert!(store.set_current_beat(None));
        assert_eq!(store.current_beat(), None);
        assert!(!store.set_current_scene(Some("scene-missing")));
    }

    #[test]
    fn test_listener_sees_persisted_state() {
        let storage = MemoryStorage::new();
        let mut store = StoryStore::open(storage.clone(), StoreConfig::default()).unwrap();
        let found = Rc::new(RefCell::new(false));
        let sink = Rc::clone(&found);
        store.add_listener(move |event| {
            if let StoreEvent::SceneCreated(scene) = event {
                let persisted = storage.get(SCENES_KEY).unwrap_or_default();
                *sink.borrow_mut() = persisted.contains(&scene.id);
            }
        });

        store.create_scene("Opening", vec![], Default::default());
        assert!(*found.borrow());
    }

    #[test]
    fn test_persist_event_precedes_mutation_event() {
        let mut store = store();
        let names = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&names);
        store.add_listener(move |event| sink.borrow_mut().push(event.name()));

        store.create_beat(None);
        assert_eq!(*names.borrow(), vec!["persist", "beatCreated"]);
    }

    #[test]
    fn test_deferred_mode_writes_on_flush() {
        let storage = MemoryStorage::new();
        let mut store = StoryStore::open(storage.clone(), StoreConfig::deferred()).unwrap();
        assert!(store.flush());

        let beat = store.create_beat(None);
        assert!(store.is_dirty());
        assert!(!storage.get(BEATS_KEY).unwrap_or_default().contains(&beat.id));

        assert!(store.flush());
        assert!(!store.is_dirty());
        assert!(storage.get(BEATS_KEY).unwrap().contains(&beat.id));
    }

    #[test]
    fn test_into_storage_flushes() {
        let mut store = StoryStore::open(MemoryStorage::new(), StoreConfig::deferred()).unwrap();
        let beat = store.create_beat(None);

        let storage = store.into_storage();
        assert!(storage.get(BEATS_KEY).unwrap().contains(&beat.id));
    }

    #[test]
    fn test_quota_failure_keeps_memory_state() {
        let mut store = StoryStore::open(MemoryStorage::with_quota(2048), StoreConfig::default()).unwrap();
        assert!(store.last_persist_error().is_none());

        let beat = store.create_beat(None);
        let updated = store.save_beat(&beat.id, &"word ".repeat(1000));

        assert!(updated.is_some());
        assert_eq!(store.get_beat(&beat.id).unwrap().content.len(), 5000);
        assert!(store.is_dirty());
        assert!(store
            .last_persist_error()
            .unwrap()
            .contains("quota exceeded"));
        assert!(!store.save());
    }

    #[test]
    fn test_sessions_track_creations() {
        let mut store = store();
        let session = store.start_session(Some("Ada"));
        assert_eq!(session.author, "Ada");

        store.create_beat(None);
        store.create_beat(None);
        store.create_scene("Opening", vec![], Default::default());

        let active = store.active_session().unwrap();
        assert_eq!(active.beats_created, 2);
        assert_eq!(active.scenes_created, 1);

        let ended = store.end_session().unwrap();
        assert!(ended.end_time.is_some());
        assert!(store.active_session().is_none());
        assert!(store.end_session().is_none());
    }

    #[test]
    fn test_starting_session_ends_previous() {
        let mut store = store();
        store.start_session(None);
        store.start_session(None);

        assert_eq!(store.sessions().len(), 2);
        assert_eq!(store.sessions().iter().filter(|s| s.is_active()).count(), 1);
    }
}
