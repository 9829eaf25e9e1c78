// src/entity/chapter.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::generate_id;

/// Groups scenes within an act. Chapters carry no timestamps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    pub id: String,
    pub title: String,
    pub act_id: String,
    pub number: u32,
    #[serde(default)]
    pub description: String,
}

/// Update payload for a chapter
#[derive(Debug, Clone, Default)]
pub struct ChapterUpdate {
    pub title: Option<String>,
    pub act_id: Option<String>,
    pub number: Option<u32>,
    pub description: Option<String>,
}

impl Chapter {
    pub fn new(
        title: String,
        act_id: String,
        number: u32,
        description: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: generate_id("chapter", now),
            title,
            act_id,
            number,
            description,
        }
    }

    pub fn apply(&mut self, update: ChapterUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(act_id) = update.act_id {
            self.act_id = act_id;
        }
        if let Some(number) = update.number {
            self.number = number;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
    }
}
