use thiserror::Error;

#[derive(Error, Debug)]
pub enum ChronicleError {
    #[error("Not in a chronicle project. Run 'chronicle init' first.")]
    NotInitialized,

    #[error("Already initialized. Remove .chronicle/ to reinitialize.")]
    AlreadyInitialized,

    #[error("Entity not found: {0}")]
    EntityNotFound(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Beat {0} is still part of a scene")]
    BeatInUse(String),

    #[error("Backup version mismatch: expected {expected}, found {found}")]
    VersionMismatch { expected: String, found: String },

    #[error("Invalid backup: {0}")]
    InvalidSnapshot(String),

    #[error("Storage quota exceeded writing '{key}': {needed} bytes needed, {quota} allowed")]
    QuotaExceeded {
        key: String,
        needed: usize,
        quota: usize,
    },

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Loro error: {0}")]
    Loro(#[from] loro::LoroError),

    #[error("Loro encode error: {0}")]
    LoroEncode(#[from] loro::LoroEncodeError),
}

pub type Result<T> = std::result::Result<T, ChronicleError>;
