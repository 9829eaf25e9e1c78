// src/entity/character.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

const DEFAULT_ROLE: &str = "supporting";

/// A directed link from one character to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub character_id: String,
    /// e.g. "sibling", "rival"
    pub kind: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub role: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub discoveries: Vec<String>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
    pub created: DateTime<Utc>,
    pub modified: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct CharacterOptions {
    pub role: Option<String>,
    pub description: Option<String>,
}

/// Update payload for a character
#[derive(Debug, Clone, Default)]
pub struct CharacterUpdate {
    pub name: Option<String>,
    pub role: Option<String>,
    pub description: Option<String>,
}

impl Character {
    pub fn new(name: String, options: CharacterOptions, now: DateTime<Utc>) -> Self {
        Self {
            id: generate_id("char", now),
            name,
            role: options.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            description: options.description.unwrap_or_default(),
            discoveries: Vec::new(),
            relationships: Vec::new(),
            created: now,
            modified: now,
        }
    }

    pub fn apply(&mut self, update: CharacterUpdate) {
        if let Some(name) = update.name {
            self.name = name;
        }
        if let Some(role) = update.role {
            self.role = role;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}
