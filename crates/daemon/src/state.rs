//! Shared daemon state

use crate::config::DaemonConfig;
use std::sync::Arc;
use testmend_common::{Database, HealingQueue, PatternCache, Result};
use tracing::info;

/// Handles shared by the worker pool and the retention sweeper
#[derive(Clone)]
pub struct StateManager {
    config: DaemonConfig,
    queue: Arc<HealingQueue>,
    cache: Arc<PatternCache>,
}

impl StateManager {
    /// Open the store under `config.store_path` and build the queue
    pub fn new(config: &DaemonConfig) -> Result<Self> {
        let db = Arc::new(Database::open(config.db_path())?);
        Self::with_database(config, db)
    }

    pub fn with_database(config: &DaemonConfig, db: Arc<Database>) -> Result<Self> {
        let cache = Arc::new(PatternCache::new(db.clone())?);
        let queue = Arc::new(HealingQueue::new(db, cache.clone(), config.healing.clone())?);

        info!(
            store = %config.store_path.display(),
            confidence_floor = config.healing.confidence_floor,
            "state initialized"
        );

        Ok(Self {
            config: config.clone(),
            queue,
            cache,
        })
    }

    /// Get configuration
    pub fn config(&self) -> &DaemonConfig {
        &self.config
    }

    pub fn queue(&self) -> &Arc<HealingQueue> {
        &self.queue
    }

    pub fn cache(&self) -> &PatternCache {
        &self.cache
    }
}
