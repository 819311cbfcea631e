//! Healing queue
//!
//! Owns the failure record lifecycle:
//!
//! ```text
//! pending -> analyzing -> healed | failed | bug_confirmed
//!               |
//!               +-> pending   (first transient error only)
//! ```
//!
//! Claiming is an atomic conditional update in the record store, so two
//! workers never analyze the same record. Every write is compare-and-swap
//! on the record generation; operator updates additionally wait on an
//! in-process lock stripe held for the whole analysis pass, so they apply
//! after it instead of racing it.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use chrono::Duration;
use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::cache::HealingCache;
use crate::candidates::CandidateGenerator;
use crate::classifier::{extract_selector, ClassifierInput, FailureClassifier};
use crate::store::RecordStore;
use crate::types::{
    now, FailureCategory, FailureReason, FailureRecord, HealSource, HealingConfig, HealingStatus,
    NewFailure, NewPattern, PatternKey, QueueStats, RecordFilter, RecordPatch,
};
use crate::{Error, Result};

/// Retention threshold bounds, in days
pub const MIN_RETENTION_DAYS: u32 = 1;
pub const MAX_RETENTION_DAYS: u32 = 365;

/// Consecutive transient failures after which a record is failed
const MAX_TRANSIENT_FAILURES: u32 = 2;

const LOCK_STRIPES: usize = 64;
const CLAIM_BATCH: usize = 16;

/// Per-record mutual exclusion without a lock per record
struct RecordLocks {
    stripes: Vec<Mutex<()>>,
}

impl RecordLocks {
    fn new() -> Self {
        Self {
            stripes: (0..LOCK_STRIPES).map(|_| Mutex::new(())).collect(),
        }
    }

    fn lock(&self, id: &str) -> MutexGuard<'_, ()> {
        let mut hasher = DefaultHasher::new();
        id.hash(&mut hasher);
        self.stripes[(hasher.finish() as usize) % self.stripes.len()].lock()
    }
}

/// What one analysis pass decided
struct Verdict {
    failure_type: FailureCategory,
    status: HealingStatus,
    healed: Option<(String, f64, HealSource)>,
    reason: Option<FailureReason>,
}

impl Verdict {
    fn healed(selector: String, confidence: f64, source: HealSource) -> Self {
        Self {
            failure_type: FailureCategory::SelectorIssue,
            status: HealingStatus::Healed,
            healed: Some((selector, confidence, source)),
            reason: None,
        }
    }

    fn unhealed(failure_type: FailureCategory, reason: FailureReason) -> Self {
        let status = if failure_type == FailureCategory::ApplicationBug {
            HealingStatus::BugConfirmed
        } else {
            HealingStatus::Failed
        };
        Self {
            failure_type,
            status,
            healed: None,
            reason: Some(reason),
        }
    }
}

/// Durable failure queue driving classification and healing
pub struct HealingQueue {
    records: Arc<dyn RecordStore>,
    cache: Arc<dyn HealingCache>,
    classifier: FailureClassifier,
    generator: CandidateGenerator,
    config: HealingConfig,
    locks: RecordLocks,
}

impl HealingQueue {
    pub fn new(
        records: Arc<dyn RecordStore>,
        cache: Arc<dyn HealingCache>,
        config: HealingConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            records,
            cache,
            classifier: FailureClassifier::from_config(&config),
            generator: CandidateGenerator::from_config(&config),
            config,
            locks: RecordLocks::new(),
        })
    }

    pub fn config(&self) -> &HealingConfig {
        &self.config
    }

    /// Accept a reported failure as a new `pending` record
    pub fn enqueue(&self, failure: NewFailure) -> Result<FailureRecord> {
        failure.validate()?;
        let mut record = FailureRecord::from_new(failure, &self.config.default_test_type);
        if record.selector.is_none() {
            record.selector = extract_selector(&record.error_message);
        }
        self.records.insert_record(&record)?;
        info!(
            record_id = %record.id,
            test_id = %record.test_id,
            selector = record.selector.as_deref().unwrap_or(""),
            "enqueued failure"
        );
        Ok(record)
    }

    pub fn get(&self, id: &str) -> Result<FailureRecord> {
        self.records
            .get_record(id)?
            .ok_or_else(|| Error::not_found("record", id))
    }

    pub fn list(&self, filter: &RecordFilter) -> Result<Vec<FailureRecord>> {
        filter.validate()?;
        self.records.list_records(filter)
    }

    /// Take ownership of a pending record. Fails with `Conflict` when the
    /// record is no longer pending.
    pub fn claim(&self, id: &str) -> Result<FailureRecord> {
        if let Some(record) = self.records.claim_record(id)? {
            debug!(record_id = id, attempt = record.healing_attempts, "claimed record");
            return Ok(record);
        }
        let current = self.get(id)?;
        Err(Error::Conflict(format!(
            "record {} is {}, not pending",
            id, current.status
        )))
    }

    /// Claim the oldest pending record, skipping any another worker takes
    /// first
    pub fn claim_next(&self) -> Result<Option<FailureRecord>> {
        loop {
            let ids = self.records.pending_ids(CLAIM_BATCH)?;
            if ids.is_empty() {
                return Ok(None);
            }
            for id in &ids {
                if let Some(record) = self.records.claim_record(id)? {
                    debug!(record_id = %id, attempt = record.healing_attempts, "claimed record");
                    return Ok(Some(record));
                }
            }
            // Whole batch lost to other workers; look again
        }
    }

    /// Run one analysis pass on a claimed record and persist the outcome
    pub fn analyze(&self, record: FailureRecord) -> Result<FailureRecord> {
        if record.status != HealingStatus::Analyzing {
            return Err(Error::InvalidStateTransition {
                from: record.status.to_string(),
                to: HealingStatus::Analyzing.to_string(),
            });
        }
        let _guard = self.locks.lock(&record.id);
        let expected_generation = record.generation;
        let prior_transient_failures = record.transient_failures;
        let mut record = record;

        match self.evaluate(&record) {
            Ok(verdict) => {
                record.failure_type = Some(verdict.failure_type);
                record.status = verdict.status;
                record.failure_reason = verdict.reason;
                record.last_error = None;
                record.transient_failures = 0;
                match verdict.healed {
                    Some((selector, confidence, source)) => {
                        record.healed_selector = Some(selector);
                        record.confidence_score = Some(confidence);
                        record.heal_source = Some(source);
                    }
                    None => {
                        record.healed_selector = None;
                        record.confidence_score = None;
                        record.heal_source = None;
                    }
                }
            }
            Err(e) if e.is_transient() => {
                record.transient_failures += 1;
                record.last_error = Some(e.to_string());
                record.healed_selector = None;
                record.confidence_score = None;
                record.heal_source = None;
                if record.transient_failures >= MAX_TRANSIENT_FAILURES {
                    warn!(record_id = %record.id, error = %e, "transient failure repeated, failing record");
                    record.status = HealingStatus::Failed;
                    record.failure_reason = Some(FailureReason::InfrastructureError);
                } else {
                    warn!(record_id = %record.id, error = %e, "transient failure, re-queuing record");
                    record.status = HealingStatus::Pending;
                    record.failure_type = None;
                    record.failure_reason = None;
                }
            }
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "analysis failed");
                record.status = HealingStatus::Failed;
                record.failure_reason = Some(FailureReason::InfrastructureError);
                record.last_error = Some(e.to_string());
                record.healed_selector = None;
                record.confidence_score = None;
                record.heal_source = None;
            }
        }

        if !HealingStatus::Analyzing.can_transition_to(record.status) {
            return Err(Error::InvalidStateTransition {
                from: HealingStatus::Analyzing.to_string(),
                to: record.status.to_string(),
            });
        }
        record.touch();
        record.check_invariants()?;
        match self.write_outcome(&record, expected_generation) {
            Ok(true) => {}
            Ok(false) => {
                return Err(Error::Conflict(format!(
                    "record {} changed while it was being analyzed",
                    record.id
                )))
            }
            Err(e) => {
                self.release(record, expected_generation, prior_transient_failures, &e);
                return Err(e);
            }
        }

        info!(
            record_id = %record.id,
            status = %record.status,
            failure_type = record.failure_type.map(|t| t.as_str()).unwrap_or(""),
            healed_selector = record.healed_selector.as_deref().unwrap_or(""),
            confidence = record.confidence_score.unwrap_or(0.0),
            "analysis complete"
        );
        Ok(record)
    }

    /// Store the analysis outcome, retrying once on a storage error
    fn write_outcome(&self, record: &FailureRecord, expected_generation: i64) -> Result<bool> {
        match self.records.replace_record(record, expected_generation) {
            Err(e) => {
                warn!(record_id = %record.id, error = %e, "storing analysis outcome failed, retrying");
                self.records.replace_record(record, expected_generation)
            }
            written => written,
        }
    }

    /// Best-effort write that takes a record out of `analyzing` after its
    /// outcome could not be stored. Counts as a transient failure: the
    /// record goes back to `pending`, or to `failed` once the limit is hit.
    fn release(
        &self,
        mut record: FailureRecord,
        expected_generation: i64,
        prior_transient_failures: u32,
        error: &Error,
    ) {
        record.transient_failures = prior_transient_failures + 1;
        record.last_error = Some(format!("storing analysis outcome: {}", error));
        record.healed_selector = None;
        record.confidence_score = None;
        record.heal_source = None;
        if record.transient_failures >= MAX_TRANSIENT_FAILURES {
            record.status = HealingStatus::Failed;
            record.failure_reason = Some(FailureReason::InfrastructureError);
        } else {
            record.status = HealingStatus::Pending;
            record.failure_type = None;
            record.failure_reason = None;
        }
        record.generation = expected_generation;
        record.touch();

        match self.records.replace_record(&record, expected_generation) {
            Ok(true) => warn!(
                record_id = %record.id,
                status = %record.status,
                error = %error,
                "analysis outcome not stored, released record"
            ),
            Ok(false) => debug!(record_id = %record.id, "record changed before it could be released"),
            Err(e) => error!(
                record_id = %record.id,
                error = %e,
                "could not release record, it stays analyzing"
            ),
        }
    }

    fn evaluate(&self, record: &FailureRecord) -> Result<Verdict> {
        let category = self.classifier.classify(&ClassifierInput::from_record(record));
        if category != FailureCategory::SelectorIssue {
            return Ok(Verdict::unhealed(category, FailureReason::NonSelectorCategory));
        }

        let Some(selector) = record
            .selector
            .clone()
            .or_else(|| extract_selector(&record.error_message))
        else {
            return Ok(Verdict::unhealed(category, FailureReason::NoViableCandidate));
        };
        let key = PatternKey::new(record.test_type.clone(), selector.clone(), record.url.clone());
        let floor = self.config.confidence_floor;

        if let Some(pattern) = self.cache.lookup(&key)? {
            if pattern.confidence_score >= floor {
                return Ok(Verdict::healed(
                    pattern.healed_selector,
                    pattern.confidence_score,
                    HealSource::Cache,
                ));
            }
            debug!(key = %key, confidence = pattern.confidence_score, "cached pattern below floor");
        }

        let candidates = self.generator.find_alternatives(
            &selector,
            &record.dom_snapshot,
            self.config.max_candidates,
        );
        match candidates.into_iter().next() {
            Some(top) if top.confidence_score >= floor => {
                self.cache.store(NewPattern {
                    key,
                    healed_selector: top.selector.clone(),
                    confidence_score: top.confidence_score,
                    dom_context: Some(top.rationale),
                })?;
                Ok(Verdict::healed(top.selector, top.confidence_score, HealSource::Generator))
            }
            _ => Ok(Verdict::unhealed(category, FailureReason::NoViableCandidate)),
        }
    }

    /// Claim and analyze the oldest pending record, if any
    pub fn process_next(&self) -> Result<Option<FailureRecord>> {
        match self.claim_next()? {
            Some(record) => self.analyze(record).map(Some),
            None => Ok(None),
        }
    }

    /// Process up to `limit` pending records
    pub fn process_pending(&self, limit: usize) -> Result<Vec<FailureRecord>> {
        let mut processed = Vec::new();
        while processed.len() < limit {
            match self.process_next()? {
                Some(record) => processed.push(record),
                None => break,
            }
        }
        Ok(processed)
    }

    /// Operator correction outside the automatic state machine.
    ///
    /// The pairing invariant still holds: moving to `healed` needs a healed
    /// selector and confidence (patched or already present), and moving
    /// anywhere else clears them. `expected_status`/`expected_generation`
    /// reject updates based on a stale read.
    pub fn update(&self, id: &str, patch: RecordPatch) -> Result<FailureRecord> {
        if patch.is_empty() {
            return Err(Error::Validation("update must change at least one field".into()));
        }
        if patch.status == Some(HealingStatus::Analyzing) {
            return Err(Error::Validation(
                "status analyzing is only entered by claiming a record".into(),
            ));
        }
        if let Some(score) = patch.confidence_score {
            crate::types::check_confidence(score)?;
        }
        if patch
            .healed_selector
            .as_deref()
            .map_or(false, |s| s.trim().is_empty())
        {
            return Err(Error::Validation("healed_selector cannot be empty".into()));
        }

        let _guard = self.locks.lock(id);
        let mut record = self.get(id)?;

        if let Some(expected) = patch.expected_status {
            if record.status != expected {
                return Err(Error::Conflict(format!(
                    "record {} is {}, expected {}",
                    id, record.status, expected
                )));
            }
        }
        if let Some(expected) = patch.expected_generation {
            if record.generation != expected {
                return Err(Error::Conflict(format!(
                    "record {} is at generation {}, expected {}",
                    id, record.generation, expected
                )));
            }
        }
        if record.status == HealingStatus::Analyzing {
            return Err(Error::Conflict(format!(
                "record {} is being analyzed; retry once it completes",
                id
            )));
        }

        if let Some(attempts) = patch.healing_attempts {
            if attempts < record.healing_attempts {
                return Err(Error::Validation(format!(
                    "healing_attempts cannot decrease ({} -> {})",
                    record.healing_attempts, attempts
                )));
            }
            record.healing_attempts = attempts;
        }

        let expected_generation = record.generation;
        let status = patch.status.unwrap_or(record.status);
        let repair_patched = patch.healed_selector.is_some() || patch.confidence_score.is_some();

        if status == HealingStatus::Healed {
            let selector = patch.healed_selector.or(record.healed_selector.take());
            let confidence = patch.confidence_score.or(record.confidence_score.take());
            match (selector, confidence) {
                (Some(selector), Some(confidence)) => {
                    record.healed_selector = Some(selector);
                    record.confidence_score = Some(confidence);
                }
                _ => {
                    return Err(Error::Validation(
                        "healed records need both healed_selector and confidence_score".into(),
                    ))
                }
            }
            if repair_patched || record.status != HealingStatus::Healed {
                record.heal_source = Some(HealSource::Manual);
            }
            record.failure_reason = None;
        } else {
            if repair_patched {
                return Err(Error::Validation(format!(
                    "healed_selector and confidence_score can only be set on healed records (status: {})",
                    status
                )));
            }
            record.healed_selector = None;
            record.confidence_score = None;
            record.heal_source = None;
        }

        if status == HealingStatus::Pending {
            record.failure_type = None;
            record.failure_reason = None;
            record.transient_failures = 0;
        }
        record.status = status;
        record.touch();
        record.check_invariants()?;

        if !self.records.replace_record(&record, expected_generation)? {
            return Err(Error::Conflict(format!(
                "record {} was modified concurrently",
                id
            )));
        }
        info!(record_id = id, status = %record.status, "record updated by operator");
        Ok(record)
    }

    /// Delete terminal records not updated for `older_than_days` days
    pub fn cleanup(&self, older_than_days: u32) -> Result<u64> {
        if !(MIN_RETENTION_DAYS..=MAX_RETENTION_DAYS).contains(&older_than_days) {
            return Err(Error::Validation(format!(
                "older_than_days must be between {} and {} (got {})",
                MIN_RETENTION_DAYS, MAX_RETENTION_DAYS, older_than_days
            )));
        }
        let cutoff = now() - Duration::days(i64::from(older_than_days));
        let deleted = self.records.delete_terminal_before(cutoff)?;
        info!(deleted, older_than_days, "retention sweep complete");
        Ok(deleted)
    }

    pub fn stats(&self) -> Result<QueueStats> {
        let counts = self.records.count_by_status_and_type()?;

        let mut stats = QueueStats {
            by_status: HealingStatus::ALL.iter().map(|s| (*s, 0)).collect(),
            ..Default::default()
        };
        let mut by_type: Vec<(FailureCategory, u64)> =
            FailureCategory::ALL.iter().map(|c| (*c, 0)).collect();

        for (status, failure_type, count) in counts {
            stats.total += count;
            if let Some(entry) = stats.by_status.iter_mut().find(|(s, _)| *s == status) {
                entry.1 += count;
            }
            if let Some(failure_type) = failure_type {
                if let Some(entry) = by_type.iter_mut().find(|(c, _)| *c == failure_type) {
                    entry.1 += count;
                }
            }
        }
        stats.by_failure_type = by_type;

        let count_of = |status: HealingStatus| {
            stats
                .by_status
                .iter()
                .find(|(s, _)| *s == status)
                .map_or(0, |(_, n)| *n)
        };
        let healed = count_of(HealingStatus::Healed);
        let finished = healed + count_of(HealingStatus::Failed) + count_of(HealingStatus::BugConfirmed);
        stats.heal_success_rate = if finished == 0 {
            0.0
        } else {
            healed as f64 / finished as f64
        };
        Ok(stats)
    }

    /// Readiness: the record store answers
    pub fn health(&self) -> bool {
        match self.records.ping() {
            Ok(()) => true,
            Err(e) => {
                warn!(error = %e, "record store health check failed");
                false
            }
        }
    }
}
