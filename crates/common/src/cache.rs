//! Healing pattern cache
//!
//! Consulted before candidate generation and written after every successful
//! heal. Conflicting stores for one key resolve inside the pattern store
//! (higher confidence wins, ties go to the newer entry), so concurrent
//! workers converge without any lock held here.
//!
//! Usage bookkeeping (`use_count`, `last_used_at`) is handed to a
//! background thread over a bounded channel: `lookup` returns as soon as the
//! read completes, and only waits when the recorder falls a full backlog
//! behind.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::sync::Arc;
use std::thread::JoinHandle;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::store::PatternStore;
use crate::types::{now, HealingPattern, NewPattern, PatternKey};
use crate::{Error, Result};

/// Cache seam used by the healing queue
pub trait HealingCache: Send + Sync {
    /// Pattern for `key`, counting the use
    fn lookup(&self, key: &PatternKey) -> Result<Option<HealingPattern>>;

    /// Record a successful repair. Returns the entry held after the write,
    /// which is the existing one when it has higher confidence.
    fn store(&self, pattern: NewPattern) -> Result<HealingPattern>;
}

/// Usage updates queued ahead of the recorder before `lookup` waits
const USAGE_BACKLOG: usize = 1024;

enum UsageEvent {
    Used(PatternKey, DateTime<Utc>),
    Flush(SyncSender<()>),
}

/// [`HealingCache`] over any [`PatternStore`]
pub struct PatternCache {
    store: Arc<dyn PatternStore>,
    usage: Mutex<Option<SyncSender<UsageEvent>>>,
    worker: Mutex<Option<JoinHandle<()>>>,
}

impl PatternCache {
    pub fn new(store: Arc<dyn PatternStore>) -> Result<Self> {
        let (tx, rx) = mpsc::sync_channel(USAGE_BACKLOG);
        let worker_store = store.clone();
        let worker = std::thread::Builder::new()
            .name("testmend-pattern-usage".to_string())
            .spawn(move || record_usage(worker_store, rx))?;

        Ok(Self {
            store,
            usage: Mutex::new(Some(tx)),
            worker: Mutex::new(Some(worker)),
        })
    }

    /// Convenience lookup with an optional page URL
    pub fn find(
        &self,
        test_type: &str,
        original_selector: &str,
        page_url: Option<&str>,
    ) -> Result<Option<HealingPattern>> {
        self.lookup(&PatternKey::new(
            test_type,
            original_selector,
            page_url.unwrap_or_default(),
        ))
    }

    pub fn list(
        &self,
        test_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HealingPattern>> {
        self.store.list_patterns(test_type, limit, offset)
    }

    /// Manual purge; patterns are never evicted automatically
    pub fn purge(&self, id: &str) -> Result<()> {
        if self.store.delete_pattern(id)? {
            debug!(pattern_id = id, "purged healing pattern");
            Ok(())
        } else {
            Err(Error::not_found("pattern", id))
        }
    }

    /// Block until every queued usage update has been written
    pub fn flush(&self) {
        let Some(usage) = self.usage_sender() else {
            return;
        };
        let (tx, rx) = mpsc::sync_channel(1);
        if usage.send(UsageEvent::Flush(tx)).is_err() || rx.recv().is_err() {
            warn!("pattern usage recorder stopped; queued uses were not written");
        }
    }

    /// Sender clone, so a full backlog never blocks while the lock is held
    fn usage_sender(&self) -> Option<SyncSender<UsageEvent>> {
        self.usage.lock().clone()
    }
}

impl HealingCache for PatternCache {
    fn lookup(&self, key: &PatternKey) -> Result<Option<HealingPattern>> {
        let Some(mut pattern) = self.store.get_pattern(key)? else {
            debug!(key = %key, "pattern cache miss");
            return Ok(None);
        };

        let used_at = now();
        let queued = self
            .usage_sender()
            .map_or(false, |usage| usage.send(UsageEvent::Used(key.clone(), used_at)).is_ok());
        if !queued {
            warn!(key = %key, "pattern usage recorder stopped; use not counted");
        }

        // Report the use this lookup accounts for
        pattern.use_count += 1;
        pattern.last_used_at = pattern.last_used_at.max(used_at);
        debug!(key = %key, healed = %pattern.healed_selector, "pattern cache hit");
        Ok(Some(pattern))
    }

    fn store(&self, pattern: NewPattern) -> Result<HealingPattern> {
        pattern.validate()?;
        let stored = self.store.upsert_pattern(&pattern)?;
        if stored.healed_selector == pattern.healed_selector
            && stored.confidence_score == pattern.confidence_score
        {
            debug!(key = %pattern.key, confidence = pattern.confidence_score, "stored healing pattern");
        } else {
            debug!(
                key = %pattern.key,
                kept = stored.confidence_score,
                offered = pattern.confidence_score,
                "kept higher-confidence healing pattern"
            );
        }
        Ok(stored)
    }
}

impl Drop for PatternCache {
    fn drop(&mut self) {
        // Closing the channel ends the worker once the backlog is drained
        self.usage.lock().take();
        if let Some(worker) = self.worker.lock().take() {
            let _ = worker.join();
        }
    }
}

fn record_usage(store: Arc<dyn PatternStore>, events: Receiver<UsageEvent>) {
    for event in events {
        match event {
            UsageEvent::Used(key, used_at) => match store.touch_pattern(&key, used_at) {
                Ok(true) => {}
                Ok(false) => debug!(key = %key, "pattern purged before its use was recorded"),
                Err(e) => warn!(key = %key, error = %e, "failed to record pattern use"),
            },
            UsageEvent::Flush(done) => {
                let _ = done.send(());
            }
        }
    }
}
