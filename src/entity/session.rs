// src/entity/session.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

/// Writing-activity bookkeeping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub id: String,
    pub author: String,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub beats_created: u32,
    #[serde(default)]
    pub scenes_created: u32,
}

impl Session {
    pub fn new(author: String, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("session", now),
            author,
            start_time: now,
            end_time: None,
            beats_created: 0,
            scenes_created: 0,
        }
    }

    pub fn is_active(&self) -> bool {
        self.end_time.is_none()
    }
}
