// src/entity/act.rs
use serde::{Deserialize, Serialize};

/// Top-level structural bucket. Three are seeded for every new story.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Act {
    pub id: String,
    pub number: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub target_beats: u32,
}

/// Update payload for an act
#[derive(Debug, Clone, Default)]
pub struct ActUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub target_beats: Option<u32>,
}

impl Act {
    pub fn apply(&mut self, update: ActUpdate) {
        if let Some(title) = update.title {
            self.title = title;
        }
        if let Some(description) = update.description {
            self.description = description;
        }
        if let Some(target_beats) = update.target_beats {
            self.target_beats = target_beats;
        }
    }
}

/// The three-act structure every story starts with
pub fn default_acts() -> Vec<Act> {
    [
        (1, "Setup", "Introduce the world, the characters and the inciting incident", 15),
        (2, "Confrontation", "Rising action, complications and the midpoint", 30),
        (3, "Resolution", "Climax and the new equilibrium", 15),
    ]
    .into_iter()
    .map(|(number, title, description, target_beats)| Act {
        id: format!("act-{}", number),
        number,
        title: title.to_string(),
        description: description.to_string(),
        target_beats,
    })
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_acts() {
        let acts = default_acts();
        let titles: Vec<&str> = acts.iter().map(|a| a.title.as_str()).collect();

        assert_eq!(titles, vec!["Setup", "Confrontation", "Resolution"]);
        assert_eq!(acts[0].id, "act-1");
        assert_eq!(acts[2].number, 3);
    }
}
