mod commands;
mod handlers;

pub use commands::{
    BeatAction, BeatCommand, ChapterAction, ChapterCommand, CharacterAction, CharacterCommand,
    Cli, Commands, LocationAction, LocationCommand, SceneAction, SceneCommand,
};
pub use handlers::{
    handle_beat, handle_chapter, handle_character, handle_export, handle_import, handle_init,
    handle_location, handle_scene, handle_stats, handle_user,
};
