//! Storage seams for failure records and healing patterns
//!
//! The queue and the cache only talk to storage through these traits, so
//! the SQLite [`Database`](crate::db::Database) and the in-memory
//! [`MemoryStore`](crate::memory::MemoryStore) are interchangeable.

use chrono::{DateTime, Utc};

use crate::types::{
    FailureCategory, FailureRecord, HealingPattern, HealingStatus, NewPattern, PatternKey,
    RecordFilter,
};
use crate::Result;

/// Durable collection of failure records
pub trait RecordStore: Send + Sync {
    fn insert_record(&self, record: &FailureRecord) -> Result<()>;

    fn get_record(&self, id: &str) -> Result<Option<FailureRecord>>;

    /// Records matching the filter, newest first
    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<FailureRecord>>;

    /// Ids of pending records, oldest first
    fn pending_ids(&self, limit: usize) -> Result<Vec<String>>;

    /// Atomically move a record from `pending` to `analyzing`, counting the
    /// attempt. Returns `None` when the record is missing or not pending.
    fn claim_record(&self, id: &str) -> Result<Option<FailureRecord>>;

    /// Overwrite a record only if its stored generation is still
    /// `expected_generation`. Returns false when another writer got there
    /// first.
    fn replace_record(&self, record: &FailureRecord, expected_generation: i64) -> Result<bool>;

    /// Delete terminal records last updated before `cutoff`
    fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64>;

    /// Record counts grouped by status and failure type
    fn count_by_status_and_type(&self) -> Result<Vec<(HealingStatus, Option<FailureCategory>, u64)>>;

    fn ping(&self) -> Result<()>;
}

/// Keyed store of healing patterns
pub trait PatternStore: Send + Sync {
    fn get_pattern(&self, key: &PatternKey) -> Result<Option<HealingPattern>>;

    /// Insert, or replace the existing entry when the new confidence is at
    /// least the stored one. Returns the entry held after the write.
    fn upsert_pattern(&self, pattern: &NewPattern) -> Result<HealingPattern>;

    /// Count one use. Returns false when the key no longer exists.
    fn touch_pattern(&self, key: &PatternKey, used_at: DateTime<Utc>) -> Result<bool>;

    /// Most used first
    fn list_patterns(
        &self,
        test_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HealingPattern>>;

    fn delete_pattern(&self, id: &str) -> Result<bool>;
}
