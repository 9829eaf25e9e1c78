use std::env;
use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use super::{BeatAction, ChapterAction, CharacterAction, LocationAction, SceneAction};
use crate::config::StoreConfig;
use crate::entity::{
    Beat, CharacterOptions, LocationOptions, SceneOptions, SceneStatus, SceneUpdate,
};
use crate::error::{ChronicleError, Result};
use crate::storage::{KeyValueStore, LoroStorage, CHRONICLE_DIR};
use crate::store::{strip_markup, word_count, StoryStore};
use crate::warnings::{check_thresholds, format_warning};

type Store = StoryStore<LoroStorage>;

const PREVIEW_CHARS: usize = 60;

/// Find the project root by looking for .chronicle/
fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(CHRONICLE_DIR).exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

fn open_store() -> Result<Store> {
    let root = find_project_root();
    let storage = LoroStorage::open(&root)?;
    let config = StoreConfig::load(storage.chronicle_dir())?;
    StoryStore::open(storage, config)
}

/// Flush anything still pending and surface a failed write as an error
fn finish(mut store: Store) -> Result<()> {
    if store.flush() {
        return Ok(());
    }
    let message = store
        .last_persist_error()
        .unwrap_or("failed to write story data")
        .to_string();
    Err(ChronicleError::Storage(message))
}

/// Match a full id, or a prefix that identifies exactly one id
fn resolve_id<'a>(input: &str, ids: impl Iterator<Item = &'a str>) -> Result<String> {
    let mut matches = Vec::new();
    for id in ids {
        if id == input {
            return Ok(id.to_string());
        }
        if id.starts_with(input) {
            matches.push(id);
        }
    }

    match matches.as_slice() {
        [only] => Ok(only.to_string()),
        [] => Err(ChronicleError::EntityNotFound(input.to_string())),
        _ => Err(ChronicleError::EntityNotFound(format!(
            "{} (ambiguous, matches {} entities)",
            input,
            matches.len()
        ))),
    }
}

fn resolve_beat(store: &Store, input: &str) -> Result<String> {
    resolve_id(input, store.beats().iter().map(|b| b.id.as_str()))
}

fn resolve_scene(store: &Store, input: &str) -> Result<String> {
    resolve_id(input, store.scenes().iter().map(|s| s.id.as_str()))
}

fn read_content(content: Option<String>, stdin: bool) -> Result<String> {
    if stdin {
        let mut buffer = String::new();
        io::stdin().read_to_string(&mut buffer)?;
        return Ok(buffer);
    }
    Ok(content.unwrap_or_default())
}

fn preview(beat: &Beat) -> String {
    let text = strip_markup(&beat.content);
    let flat: Vec<&str> = text.split_whitespace().collect();
    let flat = flat.join(" ");
    if flat.chars().count() > PREVIEW_CHARS {
        let cut: String = flat.chars().take(PREVIEW_CHARS).collect();
        format!("{}...", cut)
    } else {
        flat
    }
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;
    let storage = LoroStorage::init(&root)?;

    let config = StoreConfig::default();
    config.save(storage.chronicle_dir())?;

    let store = StoryStore::open(storage, config)?;
    finish(store)?;

    println!("Initialized chronicle project in {}", root.display());
    Ok(())
}

pub fn handle_user(name: Option<String>) -> Result<()> {
    let mut store = open_store()?;

    match name {
        Some(name) => {
            store.set_current_user(&name);
            println!("Current user is now {}", name);
        }
        None => println!("{}", store.current_user()),
    }

    finish(store)
}

pub fn handle_beat(action: BeatAction) -> Result<()> {
    let mut store = open_store()?;

    match action {
        BeatAction::Add {
            content,
            stdin,
            author,
            json,
        } => {
            let content = read_content(content, stdin)?;
            let beat = store.create_beat_with_content(author.as_deref(), &content);
            if json {
                print_json(&beat)?;
            } else {
                println!("Created beat {}", beat.id);
            }
        }
        BeatAction::Save { id, content, stdin } => {
            let id = resolve_beat(&store, &id)?;
            let content = read_content(content, stdin)?;
            let beat = store
                .save_beat(&id, &content)
                .ok_or_else(|| ChronicleError::EntityNotFound(id.clone()))?;
            println!("Saved beat {} ({} words)", beat.id, word_count(&beat.content));
        }
        BeatAction::Delete { id } => {
            let id = resolve_beat(&store, &id)?;
            if !store.delete_beat(&id) {
                return Err(ChronicleError::BeatInUse(id));
            }
            println!("Deleted beat {}", id);
        }
        BeatAction::Show { id, json } => {
            let id = resolve_beat(&store, &id)?;
            let beat = store
                .get_beat(&id)
                .ok_or_else(|| ChronicleError::EntityNotFound(id.clone()))?;
            if json {
                print_json(beat)?;
            } else {
                println!("{} by {}", beat.id, beat.author);
                match store.find_scene_for_beat(&beat.id) {
                    Some(scene) => println!("Scene: {}", scene.title),
                    None => println!("Scene: (orphaned)"),
                }
                println!("Modified: {}", beat.modified.format("%Y-%m-%d %H:%M"));
                println!();
                println!("{}", strip_markup(&beat.content).trim());
            }
        }
        BeatAction::List { orphaned, json } => {
            let beats: Vec<&Beat> = if orphaned {
                store.get_orphaned_beats()
            } else {
                store.beats().iter().collect()
            };
            if json {
                print_json(&beats)?;
            } else if beats.is_empty() {
                println!("No beats found.");
            } else {
                for beat in beats {
                    println!(
                        "{}  {:>4} words  {}",
                        beat.id,
                        word_count(&beat.content),
                        preview(beat)
                    );
                }
            }
        }
    }

    finish(store)
}

pub fn handle_scene(action: SceneAction) -> Result<()> {
    let mut store = open_store()?;

    match action {
        SceneAction::Add {
            title,
            beats,
            act,
            chapter,
            status,
            characters,
            location,
            mckee,
            conflict,
            purpose,
            json,
        } => {
            let status: SceneStatus = status.parse().map_err(ChronicleError::InvalidValue)?;
            if store.get_act(&act).is_none() {
                return Err(ChronicleError::EntityNotFound(act));
            }
            let beat_ids = beats
                .iter()
                .map(|b| resolve_beat(&store, b))
                .collect::<Result<Vec<_>>>()?;
            let characters = characters
                .iter()
                .map(|c| resolve_id(c, store.characters().iter().map(|c| c.id.as_str())))
                .collect::<Result<Vec<_>>>()?;
            let location = location
                .map(|l| resolve_id(&l, store.locations().iter().map(|l| l.id.as_str())))
                .transpose()?;
            let chapter_id = chapter
                .map(|c| resolve_id(&c, store.chapters().iter().map(|c| c.id.as_str())))
                .transpose()?;

            let scene = store.create_scene(
                &title,
                beat_ids,
                SceneOptions {
                    act_id: Some(act),
                    chapter_id,
                    status: Some(status),
                    characters,
                    location,
                    mckee_element: mckee,
                    conflict_type: conflict,
                    purpose,
                    ..Default::default()
                },
            );
            if json {
                print_json(&scene)?;
            } else {
                println!(
                    "Created scene {} - {} ({} beats)",
                    scene.id,
                    scene.title,
                    scene.beat_ids.len()
                );
            }
        }
        SceneAction::Update {
            id,
            title,
            status,
            purpose,
        } => {
            let id = resolve_scene(&store, &id)?;
            let status = status
                .map(|s| s.parse::<SceneStatus>())
                .transpose()
                .map_err(ChronicleError::InvalidValue)?;
            let scene = store
                .update_scene(
                    &id,
                    SceneUpdate {
                        title,
                        status,
                        purpose,
                        ..Default::default()
                    },
                )
                .ok_or_else(|| ChronicleError::EntityNotFound(id.clone()))?;
            println!("Updated scene {} - {} [{}]", scene.id, scene.title, scene.status);
        }
        SceneAction::Show { id, json } => {
            let id = resolve_scene(&store, &id)?;
            let scene = store
                .get_scene(&id)
                .ok_or_else(|| ChronicleError::EntityNotFound(id.clone()))?;
            let beats = store.get_beats_for_scene(&id);
            if json {
                print_json(&serde_json::json!({ "scene": scene, "beats": beats }))?;
            } else {
                println!("{} [{}] - {}", scene.title, scene.status, scene.act_id);
                if let Some(element) = &scene.mckee_element {
                    println!("McKee element: {}", element);
                }
                if !scene.purpose.is_empty() {
                    println!("Purpose: {}", scene.purpose);
                }
                let cast: Vec<&str> = store
                    .get_characters_for_scene(&id)
                    .iter()
                    .map(|c| c.name.as_str())
                    .collect();
                if !cast.is_empty() {
                    println!("Characters: {}", cast.join(", "));
                }
                if let Some(location) = scene.location.as_deref().and_then(|l| store.get_location(l)) {
                    println!("Location: {}", location.name);
                }
                println!();
                for (n, beat) in beats.iter().enumerate() {
                    println!("{:>3}. {}  {}", n + 1, beat.id, preview(beat));
                }
            }
        }
        SceneAction::List { act, json } => {
            let scenes = match &act {
                Some(act) => store.get_scenes_by_act(act),
                None => store.scenes().iter().collect(),
            };
            if json {
                print_json(&scenes)?;
            } else if scenes.is_empty() {
                println!("No scenes found.");
            } else {
                for scene in scenes {
                    println!(
                        "{}  {:<11} {:<6} {} ({} beats)",
                        scene.id,
                        scene.status.to_string(),
                        scene.act_id,
                        scene.title,
                        scene.beat_ids.len()
                    );
                }
            }
        }
        SceneAction::Delete { id } => {
            let id = resolve_scene(&store, &id)?;
            let orphaned = store.get_scene(&id).map(|s| s.beat_ids.len()).unwrap_or(0);
            if !store.delete_scene(&id) {
                return Err(ChronicleError::EntityNotFound(id));
            }
            println!("Deleted scene {} ({} beats now orphaned)", id, orphaned);
        }
        SceneAction::AddBeat {
            scene_id,
            beat_id,
            position,
        } => {
            let scene_id = resolve_scene(&store, &scene_id)?;
            let beat_id = resolve_beat(&store, &beat_id)?;
            let scene = store
                .add_beat_to_scene(&scene_id, &beat_id, position)
                .ok_or_else(|| ChronicleError::EntityNotFound(scene_id.clone()))?;
            println!("Scene {} now has {} beats", scene.id, scene.beat_ids.len());
        }
        SceneAction::RemoveBeat { scene_id, beat_id } => {
            let scene_id = resolve_scene(&store, &scene_id)?;
            let beat_id = resolve_beat(&store, &beat_id)?;
            let scene = store
                .remove_beat_from_scene(&scene_id, &beat_id)
                .ok_or_else(|| ChronicleError::EntityNotFound(beat_id.clone()))?;
            println!("Scene {} now has {} beats", scene.id, scene.beat_ids.len());
        }
    }

    finish(store)
}

pub fn handle_character(action: CharacterAction) -> Result<()> {
    let mut store = open_store()?;

    match action {
        CharacterAction::Add {
            name,
            role,
            description,
            json,
        } => {
            let character = store.create_character(&name, CharacterOptions { role, description });
            if json {
                print_json(&character)?;
            } else {
                println!("Created character {} - {}", character.id, character.name);
            }
        }
        CharacterAction::List { json } => {
            if json {
                print_json(store.characters())?;
            } else if store.characters().is_empty() {
                println!("No characters found.");
            } else {
                for character in store.characters() {
                    println!("{}  {:<12} {}", character.id, character.role, character.name);
                }
            }
        }
        CharacterAction::Delete { id } => {
            let id = resolve_id(&id, store.characters().iter().map(|c| c.id.as_str()))?;
            store.delete_character(&id);
            println!("Deleted character {}", id);
        }
    }

    finish(store)
}

pub fn handle_location(action: LocationAction) -> Result<()> {
    let mut store = open_store()?;

    match action {
        LocationAction::Add {
            name,
            description,
            importance,
            json,
        } => {
            let location = store.create_location(
                &name,
                LocationOptions {
                    description,
                    importance,
                },
            );
            if json {
                print_json(&location)?;
            } else {
                println!("Created location {} - {}", location.id, location.name);
            }
        }
        LocationAction::List { json } => {
            if json {
                print_json(store.locations())?;
            } else if store.locations().is_empty() {
                println!("No locations found.");
            } else {
                for location in store.locations() {
                    println!("{}  {:<8} {}", location.id, location.importance, location.name);
                }
            }
        }
        LocationAction::Delete { id } => {
            let id = resolve_id(&id, store.locations().iter().map(|l| l.id.as_str()))?;
            store.delete_location(&id);
            println!("Deleted location {}", id);
        }
    }

    finish(store)
}

pub fn handle_chapter(action: ChapterAction) -> Result<()> {
    let mut store = open_store()?;

    match action {
        ChapterAction::Add {
            title,
            act,
            description,
            json,
        } => {
            let chapter = store
                .create_chapter(&title, &act, &description)
                .ok_or_else(|| ChronicleError::EntityNotFound(act.clone()))?;
            if json {
                print_json(&chapter)?;
            } else {
                println!(
                    "Created chapter {} - {} {} in {}",
                    chapter.id, chapter.number, chapter.title, chapter.act_id
                );
            }
        }
        ChapterAction::List { json } => {
            if json {
                print_json(store.chapters())?;
            } else {
                for act in store.acts() {
                    println!("Act {}: {}", act.number, act.title);
                    for chapter in store.get_chapters_by_act(&act.id) {
                        println!("  {:>2}. {}  {}", chapter.number, chapter.id, chapter.title);
                    }
                }
            }
        }
        ChapterAction::Delete { id } => {
            let id = resolve_id(&id, store.chapters().iter().map(|c| c.id.as_str()))?;
            store.delete_chapter(&id);
            println!("Deleted chapter {}", id);
        }
    }

    finish(store)
}

pub fn handle_stats(json: bool) -> Result<()> {
    let store = open_store()?;
    let stats = store.get_stats();

    if json {
        print_json(&stats)?;
    } else {
        println!(
            "Beats:      {} ({} orphaned)",
            stats.beats.total, stats.beats.orphaned
        );
        println!(
            "Scenes:     {} ({} draft, {} in progress, {} polished)",
            stats.scenes.total, stats.scenes.draft, stats.scenes.in_progress, stats.scenes.polished
        );
        println!("Characters: {}", stats.characters);
        println!("Locations:  {}", stats.locations);
        println!("Words:      {}", stats.word_count);
    }

    let storage = store.storage();
    let footprint = storage.size_in_bytes().max(storage.file_size() as usize);
    for warning in check_thresholds(&stats, footprint) {
        eprintln!("{}", format_warning(&warning));
    }

    finish(store)
}

pub fn handle_export(file: &Path) -> Result<()> {
    let store = open_store()?;
    fs::write(file, store.export_json()?)?;

    let stats = store.get_stats();
    println!(
        "Exported {} beats and {} scenes to {}",
        stats.beats.total,
        stats.scenes.total,
        file.display()
    );
    finish(store)
}

pub fn handle_import(file: &Path) -> Result<()> {
    let mut store = open_store()?;
    let json = fs::read_to_string(file)?;
    store.import_json(&json)?;

    println!(
        "Imported {} beats and {} scenes from {}",
        store.beats().len(),
        store.scenes().len(),
        file.display()
    );
    finish(store)
}
