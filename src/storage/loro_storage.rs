use std::fs;
use std::path::{Path, PathBuf};

use loro::{ExportMode, LoroDoc, LoroValue, ValueOrContainer};

use super::KeyValueStore;
use crate::error::{ChronicleError, Result};

pub const CHRONICLE_DIR: &str = ".chronicle";
const LORO_DB: &str = "loro.db";
const ENTRIES_MAP: &str = "local_storage";

/// File-backed key-value storage: a Loro document holding one string map,
/// exported to `.chronicle/loro.db` on every commit.
///
/// Only the current state is kept. Each commit writes a shallow snapshot at
/// the latest version and reloads the document from it, so overwritten values
/// do not accumulate on disk or in memory.
pub struct LoroStorage {
    doc: LoroDoc,
    dir: PathBuf,
    path: PathBuf,
}

impl LoroStorage {
    /// Initialize a new chronicle project
    pub fn init(root: &Path) -> Result<Self> {
        let dir = root.join(CHRONICLE_DIR);

        if dir.exists() {
            return Err(ChronicleError::AlreadyInitialized);
        }

        fs::create_dir_all(&dir)?;

        let path = dir.join(LORO_DB);
        let mut storage = Self {
            doc: LoroDoc::new(),
            dir,
            path,
        };
        storage.save()?;

        Ok(storage)
    }

    /// Open an existing chronicle project
    pub fn open(root: &Path) -> Result<Self> {
        let dir = root.join(CHRONICLE_DIR);
        let path = dir.join(LORO_DB);

        if !path.exists() {
            return Err(ChronicleError::NotInitialized);
        }

        let bytes = fs::read(&path)?;
        let doc = LoroDoc::new();
        doc.import(&bytes)?;

        Ok(Self { doc, dir, path })
    }

    /// Write the current state to disk, dropping history
    pub fn save(&mut self) -> Result<()> {
        let frontiers = self.doc.oplog_frontiers();
        if frontiers.is_empty() {
            let bytes = self.doc.export(ExportMode::Snapshot)?;
            fs::write(&self.path, bytes)?;
            return Ok(());
        }

        let bytes = self.doc.export(ExportMode::shallow_snapshot(&frontiers))?;
        fs::write(&self.path, &bytes)?;

        let compacted = LoroDoc::new();
        compacted.set_peer_id(self.doc.peer_id())?;
        compacted.import(&bytes)?;
        self.doc = compacted;
        Ok(())
    }

    /// The `.chronicle` directory this storage lives in
    pub fn chronicle_dir(&self) -> &Path {
        &self.dir
    }

    /// Size of the snapshot file on disk
    pub fn file_size(&self) -> u64 {
        fs::metadata(&self.path).map(|m| m.len()).unwrap_or(0)
    }
}

impl KeyValueStore for LoroStorage {
    fn get(&self, key: &str) -> Option<String> {
        let entries = self.doc.get_map(ENTRIES_MAP);
        match entries.get(key)? {
            ValueOrContainer::Value(LoroValue::String(s)) => Some(s.to_string()),
            _ => None,
        }
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let entries = self.doc.get_map(ENTRIES_MAP);
        entries.insert(key, value)?;
        Ok(())
    }

    fn keys(&self) -> Vec<String> {
        let entries = self.doc.get_map(ENTRIES_MAP);
        match entries.get_deep_value() {
            LoroValue::Map(map) => map.iter().map(|(k, _)| k.to_string()).collect(),
            _ => Vec::new(),
        }
    }

    fn commit(&mut self) -> Result<()> {
        self.doc.commit();
        self.save()
    }
}
