pub mod cli;
pub mod clock;
pub mod config;
pub mod entity;
pub mod error;
pub mod storage;
pub mod store;
pub mod warnings;

pub use config::{PersistMode, StoreConfig};
pub use error::{ChronicleError, Result};
pub use storage::{KeyValueStore, LoroStorage, MemoryStorage};
pub use store::{StoreEvent, StoryStore};
