use serde::Serialize;

use super::StoryStore;
use crate::entity::SceneStatus;
use crate::storage::KeyValueStore;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BeatStats {
    pub total: usize,
    pub orphaned: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SceneStats {
    pub total: usize,
    pub draft: usize,
    pub in_progress: usize,
    pub polished: usize,
}

/// Derived, read-only summary of the story
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoryStats {
    pub beats: BeatStats,
    pub scenes: SceneStats,
    pub characters: usize,
    pub locations: usize,
    pub word_count: usize,
}

impl<S: KeyValueStore> StoryStore<S> {
    pub fn get_stats(&self) -> StoryStats {
        let mut scenes = SceneStats {
            total: self.scenes.len(),
            ..Default::default()
        };
        for scene in &self.scenes {
            match scene.status {
                SceneStatus::Draft => scenes.draft += 1,
                SceneStatus::InProgress => scenes.in_progress += 1,
                SceneStatus::Polished => scenes.polished += 1,
            }
        }

        StoryStats {
            beats: BeatStats {
                total: self.beats.len(),
                orphaned: self.get_orphaned_beats().len(),
            },
            scenes,
            characters: self.characters.len(),
            locations: self.locations.len(),
            word_count: self.beats.iter().map(|b| word_count(&b.content)).sum(),
        }
    }
}

/// Drop markup tags and decode the handful of entities an editor emits.
/// Each tag becomes a space so adjacent block elements don't fuse words.
pub fn strip_markup(html: &str) -> String {
    let mut text = String::with_capacity(html.len());
    let mut in_tag = false;

    for c in html.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => {
                in_tag = false;
                text.push(' ');
            }
            _ if !in_tag => text.push(c),
            _ => {}
        }
    }

    text.replace("&nbsp;", " ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}

pub fn word_count(content: &str) -> usize {
    strip_markup(content).split_whitespace().count()
}
