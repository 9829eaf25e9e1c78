// src/entity/location.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

const DEFAULT_IMPORTANCE: &str = "minor";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub importance: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct LocationOptions {
    pub description: Option<String>,
    pub importance: Option<String>,
}

/// Update payload for a location
#[derive(Debug, Clone, Default)]
pub struct LocationUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub importance: Option<String>,
}

impl Location {
    pub fn new(name: String, options: LocationOptions, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("loc", now),
            name,
            description: options.description.unwrap_or_default(),
            importance: options
                .importance
                .unwrap_or_else(|| DEFAULT_IMPORTANCE.to_string()),
            created: now,
            modified: now,
        }
    }

    pub fn apply(&mut self, update: LocationUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(importance) = update.importance {
            self.importance = importance;
        }
    }
}
