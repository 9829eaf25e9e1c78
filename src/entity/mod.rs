mod act;
mod beat;
mod chapter;
mod character;
mod location;
mod scene;
mod session;

pub use act::{default_acts, Act, ActUpdate};
pub use beat::Beat;
pub use chapter::{Chapter, ChapterUpdate};
pub use character::{Character, CharacterOptions, CharacterUpdate, Relationship};
pub use location::{Location, LocationOptions, LocationUpdate};
pub use scene::{Scene, SceneOptions, SceneStatus, SceneUpdate, DEFAULT_ACT_ID, DEFAULT_MODE};
pub use session::Session;

use chrono::{DateTime, Utc};
use uuid::Uuid;

const RANDOM_SUFFIX_LEN: usize = 9;

/// Generate an entity id of the form `prefix-<unix millis>-<random>`
pub fn generate_id(prefix: &str, now: DateTime<Utc>) -> String {
    let random = Uuid::new_v4().simple().to_string();
    format!(
        "{}-{}-{}",
        prefix,
        now.timestamp_millis(),
        &random[..RANDOM_SUFFIX_LEN]
    )
}
