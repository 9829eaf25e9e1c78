use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "chronicle")]
#[command(version, about = "Plan a story as beats, scenes, characters and locations")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new chronicle project in the current directory
    Init,

    /// Show the current author, or switch to NAME
    User {
        name: Option<String>,
    },

    /// Work with beats (units of prose)
    Beat(BeatCommand),

    /// Work with scenes
    Scene(SceneCommand),

    /// Work with characters
    Character(CharacterCommand),

    /// Work with locations
    Location(LocationCommand),

    /// Work with chapters
    Chapter(ChapterCommand),

    /// Show story statistics
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write a backup of the whole story to FILE
    Export {
        file: PathBuf,
    },

    /// Replace the story with the backup in FILE
    Import {
        file: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct BeatCommand {
    #[command(subcommand)]
    pub action: BeatAction,
}

#[derive(Subcommand, Debug)]
pub enum BeatAction {
    /// Create a beat
    Add {
        /// Beat content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Author (defaults to the current user)
        #[arg(long)]
        author: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace a beat's content
    Save {
        /// Beat ID (full id or unique prefix)
        id: String,

        /// New content
        #[arg(long, short = 'c', conflicts_with = "stdin")]
        content: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,
    },

    /// Delete a beat that is not part of any scene
    Delete {
        id: String,
    },

    /// Show a single beat
    Show {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List beats
    List {
        /// Only beats that are not in any scene
        #[arg(long)]
        orphaned: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct SceneCommand {
    #[command(subcommand)]
    pub action: SceneAction,
}

#[derive(Subcommand, Debug)]
pub enum SceneAction {
    /// Create a scene
    Add {
        title: String,

        /// Beat IDs in order (can be specified multiple times)
        #[arg(long = "beat", short = 'b')]
        beats: Vec<String>,

        /// Act ID
        #[arg(long, default_value = "act-1")]
        act: String,

        /// Chapter ID
        #[arg(long)]
        chapter: Option<String>,

        /// Status (draft, in-progress, polished)
        #[arg(long, default_value = "draft")]
        status: String,

        /// Character IDs (can be specified multiple times)
        #[arg(long = "character")]
        characters: Vec<String>,

        /// Location ID
        #[arg(long)]
        location: Option<String>,

        /// McKee structural element, e.g. "Inciting Incident"
        #[arg(long)]
        mckee: Option<String>,

        /// Kind of conflict
        #[arg(long)]
        conflict: Option<String>,

        /// What the scene accomplishes
        #[arg(long)]
        purpose: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update a scene's title or status
    Update {
        id: String,

        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        status: Option<String>,

        #[arg(long)]
        purpose: Option<String>,
    },

    /// Show a scene with its beats
    Show {
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List scenes
    List {
        /// Only scenes in this act
        #[arg(long)]
        act: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a scene (its beats are kept)
    Delete {
        id: String,
    },

    /// Place a beat in a scene
    AddBeat {
        scene_id: String,
        beat_id: String,

        /// Zero-based position (appended if omitted)
        #[arg(long)]
        position: Option<usize>,
    },

    /// Take a beat out of a scene
    RemoveBeat {
        scene_id: String,
        beat_id: String,
    },
}

#[derive(Args, Debug)]
pub struct CharacterCommand {
    #[command(subcommand)]
    pub action: CharacterAction,
}

#[derive(Subcommand, Debug)]
pub enum CharacterAction {
    /// Create a character
    Add {
        name: String,

        #[arg(long)]
        role: Option<String>,

        #[arg(long)]
        description: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List characters
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a character and remove it from every scene
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct LocationCommand {
    #[command(subcommand)]
    pub action: LocationAction,
}

#[derive(Subcommand, Debug)]
pub enum LocationAction {
    /// Create a location
    Add {
        name: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        importance: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List locations
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a location and clear it from every scene
    Delete {
        id: String,
    },
}

#[derive(Args, Debug)]
pub struct ChapterCommand {
    #[command(subcommand)]
    pub action: ChapterAction,
}

#[derive(Subcommand, Debug)]
pub enum ChapterAction {
    /// Create a chapter
    Add {
        title: String,

        /// Act ID
        #[arg(long, default_value = "act-1")]
        act: String,

        #[arg(long, default_value = "")]
        description: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// List chapters, grouped by act
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Delete a chapter and detach its scenes
    Delete {
        id: String,
    },
}
