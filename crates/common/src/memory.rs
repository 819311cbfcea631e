//! In-memory store for tests and embedded use

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;

use crate::store::{PatternStore, RecordStore};
use crate::types::{
    now, FailureCategory, FailureRecord, HealingPattern, HealingStatus, NewPattern, PatternKey,
    RecordFilter,
};
use crate::{Error, Result};

/// Lock-striped maps; every read-modify-write happens under the entry's
/// shard lock.
#[derive(Default)]
pub struct MemoryStore {
    records: DashMap<String, (u64, FailureRecord)>,
    patterns: DashMap<PatternKey, HealingPattern>,
    seq: AtomicU64,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl RecordStore for MemoryStore {
    fn insert_record(&self, record: &FailureRecord) -> Result<()> {
        match self.records.entry(record.id.clone()) {
            Entry::Occupied(_) => Err(Error::Conflict(format!(
                "record {} already exists",
                record.id
            ))),
            Entry::Vacant(slot) => {
                let seq = self.seq.fetch_add(1, Ordering::SeqCst);
                slot.insert((seq, record.clone()));
                Ok(())
            }
        }
    }

    fn get_record(&self, id: &str) -> Result<Option<FailureRecord>> {
        Ok(self.records.get(id).map(|entry| entry.1.clone()))
    }

    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<FailureRecord>> {
        let mut matching: Vec<(u64, FailureRecord)> = self
            .records
            .iter()
            .filter(|entry| filter.matches(&entry.1))
            .map(|entry| entry.value().clone())
            .collect();
        matching.sort_by(|a, b| {
            b.1.created_at
                .cmp(&a.1.created_at)
                .then_with(|| b.0.cmp(&a.0))
        });
        Ok(matching
            .into_iter()
            .skip(filter.offset)
            .take(filter.limit)
            .map(|(_, record)| record)
            .collect())
    }

    fn pending_ids(&self, limit: usize) -> Result<Vec<String>> {
        let mut pending: Vec<(DateTime<Utc>, u64, String)> = self
            .records
            .iter()
            .filter(|entry| entry.1.status == HealingStatus::Pending)
            .map(|entry| (entry.1.created_at, entry.0, entry.key().clone()))
            .collect();
        pending.sort();
        Ok(pending.into_iter().take(limit).map(|(_, _, id)| id).collect())
    }

    fn claim_record(&self, id: &str) -> Result<Option<FailureRecord>> {
        let Some(mut entry) = self.records.get_mut(id) else {
            return Ok(None);
        };
        let record = &mut entry.1;
        if record.status != HealingStatus::Pending {
            return Ok(None);
        }
        record.status = HealingStatus::Analyzing;
        record.healing_attempts += 1;
        record.touch();
        Ok(Some(record.clone()))
    }

    fn replace_record(&self, record: &FailureRecord, expected_generation: i64) -> Result<bool> {
        let Some(mut entry) = self.records.get_mut(&record.id) else {
            return Err(Error::not_found("record", &record.id));
        };
        if entry.1.generation != expected_generation {
            return Ok(false);
        }
        entry.1 = record.clone();
        Ok(true)
    }

    fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let before = self.records.len();
        self.records
            .retain(|_, (_, record)| !(record.status.is_terminal() && record.updated_at < cutoff));
        Ok((before - self.records.len()) as u64)
    }

    fn count_by_status_and_type(&self) -> Result<Vec<(HealingStatus, Option<FailureCategory>, u64)>> {
        let mut counts: Vec<(HealingStatus, Option<FailureCategory>, u64)> = Vec::new();
        for entry in self.records.iter() {
            let (status, failure_type) = (entry.1.status, entry.1.failure_type);
            match counts
                .iter_mut()
                .find(|(s, t, _)| *s == status && *t == failure_type)
            {
                Some((_, _, count)) => *count += 1,
                None => counts.push((status, failure_type, 1)),
            }
        }
        Ok(counts)
    }

    fn ping(&self) -> Result<()> {
        Ok(())
    }
}

impl PatternStore for MemoryStore {
    fn get_pattern(&self, key: &PatternKey) -> Result<Option<HealingPattern>> {
        Ok(self.patterns.get(key).map(|entry| entry.value().clone()))
    }

    fn upsert_pattern(&self, pattern: &NewPattern) -> Result<HealingPattern> {
        match self.patterns.entry(pattern.key.clone()) {
            Entry::Occupied(mut existing) => {
                let current = existing.get_mut();
                if pattern.confidence_score >= current.confidence_score {
                    current.healed_selector = pattern.healed_selector.clone();
                    current.confidence_score = pattern.confidence_score;
                    current.dom_context = pattern.dom_context.clone();
                    current.updated_at = now();
                }
                Ok(current.clone())
            }
            Entry::Vacant(slot) => {
                let stored = pattern.clone().into_pattern();
                slot.insert(stored.clone());
                Ok(stored)
            }
        }
    }

    fn touch_pattern(&self, key: &PatternKey, used_at: DateTime<Utc>) -> Result<bool> {
        Ok(match self.patterns.get_mut(key) {
            Some(mut pattern) => {
                pattern.use_count += 1;
                pattern.last_used_at = pattern.last_used_at.max(used_at);
                true
            }
            None => false,
        })
    }

    fn list_patterns(
        &self,
        test_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HealingPattern>> {
        let mut patterns: Vec<HealingPattern> = self
            .patterns
            .iter()
            .filter(|entry| test_type.map_or(true, |t| entry.key.test_type == t))
            .map(|entry| entry.value().clone())
            .collect();
        patterns.sort_by(|a, b| {
            b.use_count
                .cmp(&a.use_count)
                .then_with(|| b.last_used_at.cmp(&a.last_used_at))
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(patterns.into_iter().skip(offset).take(limit).collect())
    }

    fn delete_pattern(&self, id: &str) -> Result<bool> {
        let key = self
            .patterns
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| entry.key().clone());
        Ok(match key {
            Some(key) => self.patterns.remove(&key).is_some(),
            None => false,
        })
    }
}
