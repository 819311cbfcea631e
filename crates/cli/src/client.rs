//! Local store client
//!
//! The CLI works directly against the SQLite store the daemon uses; WAL
//! mode lets both run at once.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use testmend_common::{Database, HealingConfig, HealingQueue, PatternCache};
use tracing::debug;

/// Queue and pattern cache over one database
pub struct StoreClient {
    path: PathBuf,
    queue: HealingQueue,
    cache: Arc<PatternCache>,
}

impl StoreClient {
    /// Open (or create) the store at `path`
    pub fn open(path: impl AsRef<Path>, config: HealingConfig) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let db = Database::open(&path)
            .with_context(|| format!("failed to open store at {}", path.display()))?;
        debug!(path = %path.display(), "opened store");
        Self::from_database(path, Arc::new(db), config)
    }

    /// Client over an in-memory database (for testing)
    pub fn in_memory() -> Result<Self> {
        Self::from_database(
            PathBuf::from(":memory:"),
            Arc::new(Database::open_memory()?),
            HealingConfig::default(),
        )
    }

    fn from_database(path: PathBuf, db: Arc<Database>, config: HealingConfig) -> Result<Self> {
        let cache = Arc::new(PatternCache::new(db.clone())?);
        let queue = HealingQueue::new(db, cache.clone(), config)?;
        Ok(Self { path, queue, cache })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn queue(&self) -> &HealingQueue {
        &self.queue
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }
}

impl Drop for StoreClient {
    fn drop(&mut self) {
        // Usage counts from lookups made by this process
        self.cache.flush();
    }
}
