//! One-time upgrade of pre-beat data.
//!
//! Older versions stored each scene as a single record under a `scene_*`
//! key, with its prose inline. Each such record becomes one beat holding the
//! prose plus one scene referencing it. The upgrade only runs while the
//! store has no scenes, so it never repeats.

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::{info, warn};

use super::StoryStore;
use crate::entity::{Beat, Scene, SceneOptions, SceneStatus};
use crate::storage::{KeyValueStore, LEGACY_SCENE_PREFIX};

impl<S: KeyValueStore> StoryStore<S> {
    /// Convert legacy scene records; returns how many were migrated
    pub(super) fn migrate_legacy_scenes(&mut self) -> usize {
        if !self.scenes.is_empty() {
            return 0;
        }

        let mut keys: Vec<String> = self
            .storage
            .keys()
            .into_iter()
            .filter(|k| k.starts_with(LEGACY_SCENE_PREFIX))
            .collect();
        keys.sort();

        let mut migrated = 0;
        for key in keys {
            let Some(raw) = self.storage.get(&key) else {
                continue;
            };
            let record = match serde_json::from_str::<Value>(&raw) {
                Ok(record @ Value::Object(_)) => record,
                Ok(_) => {
                    warn!(key = %key, "skipping legacy scene: not an object");
                    continue;
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "skipping unreadable legacy scene");
                    continue;
                }
            };

            self.migrate_record(&record);
            migrated += 1;
        }

        if migrated > 0 {
            info!(count = migrated, "migrated legacy scenes");
        }
        migrated
    }

    fn migrate_record(&mut self, record: &Value) {
        let now = self.clock.now();
        let created = timestamp_field(record, "created").unwrap_or(now);
        let modified = timestamp_field(record, "modified").unwrap_or(created);
        let author = string_field(record, "author").unwrap_or_else(|| self.current_user.clone());

        let mut beat = Beat::new(author.clone(), now);
        beat.content = string_field(record, "content").unwrap_or_default();
        beat.created = created;
        beat.modified = modified;

        let status = string_field(record, "status")
            .and_then(|s| s.parse::<SceneStatus>().ok())
            .unwrap_or_default();
        let options = SceneOptions {
            author: Some(author.clone()),
            act_id: string_field(record, "actId"),
            mode: string_field(record, "mode"),
            status: Some(status),
            mckee_element: string_field(record, "mckeeElement"),
            conflict_type: string_field(record, "conflictType"),
            purpose: string_field(record, "purpose"),
            ..Default::default()
        };
        let title = string_field(record, "title").unwrap_or_else(|| "Untitled Scene".to_string());

        let mut scene = Scene::new(title, vec![beat.id.clone()], author, options, now);
        scene.created = created;
        scene.modified = modified;

        self.beats.push(beat);
        self.scenes.push(scene);
    }
}

fn string_field(record: &Value, name: &str) -> Option<String> {
    record
        .get(name)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Legacy timestamps are either RFC 3339 strings or epoch milliseconds
fn timestamp_field(record: &Value, name: &str) -> Option<DateTime<Utc>> {
    match record.get(name)? {
        Value::String(s) => DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|t| t.with_timezone(&Utc)),
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}
