//! Testmend Common Library
//!
//! Failure classification, selector candidate generation, the healing
//! pattern cache and the healing queue shared by the testmend daemon and
//! CLI.

pub mod cache;
pub mod candidates;
pub mod classifier;
pub mod db;
pub mod dom;
pub mod error;
pub mod locator;
pub mod memory;
pub mod queue;
pub mod store;
pub mod types;

// Re-export commonly used types
pub use cache::{HealingCache, PatternCache};
pub use candidates::CandidateGenerator;
pub use classifier::{ClassifierInput, FailureClassifier};
pub use db::Database;
pub use error::{Error, Result};
pub use memory::MemoryStore;
pub use queue::HealingQueue;
pub use store::{PatternStore, RecordStore};
pub use types::*;

/// Testmend version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default store path
pub fn default_store_path() -> std::path::PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| std::path::PathBuf::from("."))
        .join(".testmend")
}

/// Default database path
pub fn default_db_path() -> std::path::PathBuf {
    default_store_path().join("state.db")
}

/// Home directory helper
mod dirs {
    pub fn home_dir() -> Option<std::path::PathBuf> {
        std::env::var_os("HOME").map(std::path::PathBuf::from)
    }
}
