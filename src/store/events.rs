//! Change notifications.
//!
//! Every store mutation produces one [`StoreEvent`]. Listeners are plain
//! closures called synchronously, in subscription order, once the mutation
//! and its persistence write have both completed.

use std::panic::{self, AssertUnwindSafe};

use tracing::error;

use crate::entity::{Act, Beat, Chapter, Character, Location, Scene};

#[derive(Debug, Clone, PartialEq)]
pub enum StoreEvent {
    BeatCreated(Beat),
    BeatUpdated(Beat),
    BeatDeleted(String),
    SceneCreated(Scene),
    SceneUpdated(Scene),
    SceneDeleted(String),
    CharacterCreated(Character),
    CharacterUpdated(Character),
    CharacterDeleted(String),
    LocationCreated(Location),
    LocationUpdated(Location),
    LocationDeleted(String),
    ChapterCreated(Chapter),
    ChapterUpdated(Chapter),
    ChapterDeleted(String),
    ActUpdated(Act),
    UserChanged(String),
    DataImported,
    DataCleared,
    Persist,
}

impl StoreEvent {
    /// Event name as the view layer knows it
    pub fn name(&self) -> &'static str {
        match self {
            StoreEvent::BeatCreated(_) => "beatCreated",
            StoreEvent::BeatUpdated(_) => "beatUpdated",
            StoreEvent::BeatDeleted(_) => "beatDeleted",
            StoreEvent::SceneCreated(_) => "sceneCreated",
            StoreEvent::SceneUpdated(_) => "sceneUpdated",
            StoreEvent::SceneDeleted(_) => "sceneDeleted",
            StoreEvent::CharacterCreated(_) => "characterCreated",
            StoreEvent::CharacterUpdated(_) => "characterUpdated",
            StoreEvent::CharacterDeleted(_) => "characterDeleted",
            StoreEvent::LocationCreated(_) => "locationCreated",
            StoreEvent::LocationUpdated(_) => "locationUpdated",
            StoreEvent::LocationDeleted(_) => "locationDeleted",
            StoreEvent::ChapterCreated(_) => "chapterCreated",
            StoreEvent::ChapterUpdated(_) => "chapterUpdated",
            StoreEvent::ChapterDeleted(_) => "chapterDeleted",
            StoreEvent::ActUpdated(_) => "actUpdated",
            StoreEvent::UserChanged(_) => "userChanged",
            StoreEvent::DataImported => "dataImported",
            StoreEvent::DataCleared => "dataCleared",
            StoreEvent::Persist => "persist",
        }
    }

    /// Id of the entity the event concerns, if any
    pub fn entity_id(&self) -> Option<&str> {
        match self {
            StoreEvent::BeatCreated(b) | StoreEvent::BeatUpdated(b) => Some(&b.id),
            StoreEvent::SceneCreated(s) | StoreEvent::SceneUpdated(s) => Some(&s.id),
            StoreEvent::CharacterCreated(c) | StoreEvent::CharacterUpdated(c) => Some(&c.id),
            StoreEvent::LocationCreated(l) | StoreEvent::LocationUpdated(l) => Some(&l.id),
            StoreEvent::ChapterCreated(c) | StoreEvent::ChapterUpdated(c) => Some(&c.id),
            StoreEvent::ActUpdated(a) => Some(&a.id),
            StoreEvent::BeatDeleted(id)
            | StoreEvent::SceneDeleted(id)
            | StoreEvent::CharacterDeleted(id)
            | StoreEvent::LocationDeleted(id)
            | StoreEvent::ChapterDeleted(id) => Some(id),
            StoreEvent::UserChanged(_)
            | StoreEvent::DataImported
            | StoreEvent::DataCleared
            | StoreEvent::Persist => None,
        }
    }
}

/// Handle returned by `add_listener`, used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type Callback = Box<dyn FnMut(&StoreEvent)>;

#[derive(Default)]
pub(crate) struct Listeners {
    next_id: u64,
    entries: Vec<(ListenerId, Callback)>,
}

impl Listeners {
    pub(crate) fn add(&mut self, callback: Callback) -> ListenerId {
        self.next_id += 1;
        let id = ListenerId(self.next_id);
        self.entries.push((id, callback));
        id
    }

    pub(crate) fn remove(&mut self, id: ListenerId) -> bool {
        let before = self.entries.len();
        self.entries.retain(|(entry_id, _)| *entry_id != id);
        self.entries.len() != before
    }

    /// Call every listener; a panicking listener is logged and skipped
    pub(crate) fn dispatch(&mut self, event: &StoreEvent) {
        for (id, callback) in self.entries.iter_mut() {
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| callback(event)));
            if outcome.is_err() {
                error!(
                    listener = ?id,
                    event = event.name(),
                    entity = event.entity_id().unwrap_or("-"),
                    "listener panicked"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn recorder() -> (Rc<RefCell<Vec<String>>>, Callback) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        (
            seen,
            Box::new(move |event: &StoreEvent| sink.borrow_mut().push(event.name().to_string())),
        )
    }

    #[test]
    fn test_dispatch_in_subscription_order() {
        let order = Rc::new(RefCell::new(Vec::new()));
        let mut listeners = Listeners::default();

        for n in 0..3 {
            let order = Rc::clone(&order);
            listeners.add(Box::new(move |_: &StoreEvent| order.borrow_mut().push(n)));
        }
        listeners.dispatch(&StoreEvent::Persist);

        assert_eq!(*order.borrow(), vec![0, 1, 2]);
    }

    #[test]
    fn test_remove_listener() {
        let (seen, callback) = recorder();
        let mut listeners = Listeners::default();
        let id = listeners.add(callback);

        assert!(listeners.remove(id));
        assert!(!listeners.remove(id));
        listeners.dispatch(&StoreEvent::DataCleared);

        assert!(seen.borrow().is_empty());
        assert!(listeners.entries.is_empty());
    }

    #[test]
    fn test_panicking_listener_does_not_stop_others() {
        let (seen, callback) = recorder();
        let mut listeners = Listeners::default();
        listeners.add(Box::new(|_: &StoreEvent| panic!("view failed to render")));
        listeners.add(callback);

        listeners.dispatch(&StoreEvent::DataImported);

        assert_eq!(*seen.borrow(), vec!["dataImported".to_string()]);
    }

    #[test]
    fn test_event_names_and_ids() {
        let event = StoreEvent::SceneDeleted("scene-1".to_string());
        assert_eq!(event.name(), "sceneDeleted");
        assert_eq!(event.entity_id(), Some("scene-1"));
        assert_eq!(StoreEvent::Persist.entity_id(), None);
    }
}
