// src/entity/beat.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

/// The smallest unit of written prose. Scene membership is by reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Beat {
    pub id: String,
    /// Rich text, usually HTML from the editor
    pub content: String,
    pub author: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

impl Beat {
    pub fn new(author: String, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("beat", now),
            content: String::new(),
            author,
            created: now,
            modified: now,
        }
    }
}
