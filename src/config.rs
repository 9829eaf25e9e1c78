use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ChronicleError, Result};

const CONFIG_FILE: &str = "config.yaml";

/// When the store writes its collections to storage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PersistMode {
    /// Every mutation is written before listeners run
    #[default]
    Immediate,
    /// Mutations only mark the store dirty; `flush()` writes
    Deferred,
}

/// Configuration for a story store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    pub persist_mode: PersistMode,
    /// Author used until a current user is set
    pub default_author: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            persist_mode: PersistMode::Immediate,
            default_author: "Writer".to_string(),
        }
    }
}

impl StoreConfig {
    pub fn deferred() -> Self {
        Self {
            persist_mode: PersistMode::Deferred,
            ..Self::default()
        }
    }

    /// Load `config.yaml` from `dir`, falling back to defaults if absent
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }

        let text = fs::read_to_string(&path)?;
        serde_yaml::from_str(&text)
            .map_err(|e| ChronicleError::Config(format!("{}: {}", path.display(), e)))
    }

    pub fn save(&self, dir: &Path) -> Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        fs::write(dir.join(CONFIG_FILE), yaml)?;
        Ok(())
    }
}
