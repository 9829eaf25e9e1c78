// src/entity/scene.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

pub const DEFAULT_ACT_ID: &str = "act-1";
pub const DEFAULT_MODE: &str = "solo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SceneStatus {
    #[default]
    Draft,
    InProgress,
    Polished,
}

impl std::fmt::Display for SceneStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SceneStatus::Draft => write!(f, "draft"),
            SceneStatus::InProgress => write!(f, "in-progress"),
            SceneStatus::Polished => write!(f, "polished"),
        }
    }
}

impl std::str::FromStr for SceneStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('_', "-").as_str() {
            "draft" => Ok(SceneStatus::Draft),
            "in-progress" | "inprogress" => Ok(SceneStatus::InProgress),
            "polished" => Ok(SceneStatus::Polished),
            _ => Err(format!("Invalid scene status: {}", s)),
        }
    }
}

/// An ordered, metadata-tagged grouping of beats
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: String,
    pub title: String,
    pub beat_ids: Vec<String>,
    pub act_id: String,
    #[serde(default)]
    pub chapter_id: Option<String>,
    pub author: String,
    pub mode: String,
    #[serde(default)]
    pub status: SceneStatus,
    #[serde(default)]
    pub characters: Vec<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub mckee_element: Option<String>,
    #[serde(default)]
    pub conflict_type: Option<String>,
    #[serde(default)]
    pub purpose: String,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

/// Optional fields accepted when creating a scene
#[derive(Debug, Clone, Default)]
pub struct SceneOptions {
    pub author: Option<String>,
    pub act_id: Option<String>,
    pub chapter_id: Option<String>,
    pub mode: Option<String>,
    pub status: Option<SceneStatus>,
    pub characters: Vec<String>,
    pub location: Option<String>,
    pub mckee_element: Option<String>,
    pub conflict_type: Option<String>,
    pub purpose: Option<String>,
}

/// Update payload for a scene
#[derive(Debug, Clone, Default)]
pub struct SceneUpdate {
    pub title: Option<String>,
    pub act_id: Option<String>,
    pub chapter_id: Option<Option<String>>, // Some(None) to clear
    pub mode: Option<String>,
    pub status: Option<SceneStatus>,
    pub characters: Option<Vec<String>>,
    pub location: Option<Option<String>>,
    pub mckee_element: Option<Option<String>>,
    pub conflict_type: Option<Option<String>>,
    pub purpose: Option<String>,
}

impl Scene {
    pub fn new(
        title: String,
        beat_ids: Vec<String>,
        author: String,
        options: SceneOptions,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id("scene", now),
            title,
            beat_ids,
            act_id: options.act_id.unwrap_or_else(|| DEFAULT_ACT_ID.to_string()),
            chapter_id: options.chapter_id,
            author,
            mode: options.mode.unwrap_or_else(|| DEFAULT_MODE.to_string()),
            status: options.status.unwrap_or_default(),
            characters: options.characters,
            location: options.location,
            mckee_element: options.mckee_element,
            conflict_type: options.conflict_type,
            purpose: options.purpose.unwrap_or_default(),
            created: now,
            modified: now,
        }
    }

    /// Apply an update payload; returns whether anything was set
    pub fn apply(&mut self, update: SceneUpdate) -> bool {
        let mut changed = false;
        if let Some(title) = update.title {
            self.title = title;
            changed = true;
        }
        if let Some(act_id) = update.act_id {
            self.act_id = act_id;
            changed = true;
        }
        if let Some(chapter_id) = update.chapter_id {
            self.chapter_id = chapter_id;
            changed = true;
        }
        if let Some(mode) = update.mode {
            self.mode = mode;
            changed = true;
        }
        if let Some(status) = update.status {
            self.status = status;
            changed = true;
        }
        if let Some(characters) = update.characters {
            self.characters = characters;
            changed = true;
        }
        if let Some(location) = update.location {
            self.location = location;
            changed = true;
        }
        if let Some(mckee_element) = update.mckee_element {
            self.mckee_element = mckee_element;
            changed = true;
        }
        if let Some(conflict_type) = update.conflict_type {
            self.conflict_type = conflict_type;
            changed = true;
        }
        if let Some(purpose) = update.purpose {
            self.purpose = purpose;
            changed = true;
        }
        changed
    }
}
