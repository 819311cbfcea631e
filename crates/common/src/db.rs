//! SQLite database for failure records and healing patterns

use crate::store::{PatternStore, RecordStore};
use crate::types::{
    now, FailureCategory, FailureRecord, HealingPattern, HealingStatus, NewPattern, PatternKey,
    RecordFilter,
};
use crate::{Error, Result};
use chrono::{DateTime, TimeZone, Utc};
use parking_lot::Mutex;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Database wrapper for state persistence
#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
}

impl Database {
    /// Open or create database at path
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let conn = Connection::open(path.as_ref())?;

        // WAL lets readers proceed while a worker writes
        conn.execute_batch(
            "PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL; PRAGMA busy_timeout=5000;",
        )?;

        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };

        db.init_schema()?;

        info!("Opened database at {:?}", path.as_ref());
        Ok(db)
    }

    /// Open in-memory database (for testing)
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self {
            conn: Arc::new(Mutex::new(conn)),
        };
        db.init_schema()?;
        Ok(db)
    }

    /// Initialize database schema
    fn init_schema(&self) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute_batch(
            r#"
            -- Failure records; seq orders rows created in the same millisecond
            CREATE TABLE IF NOT EXISTS failure_records (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                test_id TEXT NOT NULL,
                test_name TEXT NOT NULL,
                test_type TEXT NOT NULL,
                error_message TEXT NOT NULL,
                dom_snapshot TEXT NOT NULL DEFAULT '',
                screenshot BLOB NOT NULL DEFAULT x'',
                console_errors TEXT NOT NULL DEFAULT '[]',
                network_logs TEXT NOT NULL DEFAULT '[]',
                url TEXT NOT NULL DEFAULT '',
                selector TEXT,
                failure_type TEXT,
                status TEXT NOT NULL,
                healed_selector TEXT,
                confidence_score REAL,
                heal_source TEXT,
                failure_reason TEXT,
                last_error TEXT,
                healing_attempts INTEGER NOT NULL DEFAULT 0,
                transient_failures INTEGER NOT NULL DEFAULT 0,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                generation INTEGER NOT NULL DEFAULT 1,
                CHECK ((healed_selector IS NULL) = (confidence_score IS NULL))
            );
            CREATE INDEX IF NOT EXISTS idx_failure_records_status ON failure_records(status, created_at);
            CREATE INDEX IF NOT EXISTS idx_failure_records_type ON failure_records(failure_type);
            CREATE INDEX IF NOT EXISTS idx_failure_records_updated ON failure_records(updated_at);

            -- Healing patterns, one row per cache key
            CREATE TABLE IF NOT EXISTS healing_patterns (
                id TEXT PRIMARY KEY,
                test_type TEXT NOT NULL,
                original_selector TEXT NOT NULL,
                page_url TEXT NOT NULL DEFAULT '',
                healed_selector TEXT NOT NULL,
                confidence_score REAL NOT NULL,
                dom_context TEXT,
                created_at INTEGER NOT NULL,
                updated_at INTEGER NOT NULL,
                last_used_at INTEGER NOT NULL,
                use_count INTEGER NOT NULL DEFAULT 1,
                UNIQUE (test_type, original_selector, page_url)
            );
            CREATE INDEX IF NOT EXISTS idx_healing_patterns_usage ON healing_patterns(use_count, last_used_at);
            "#,
        )?;

        debug!("Database schema initialized");
        Ok(())
    }

    fn query_record(conn: &Connection, id: &str) -> Result<Option<FailureRecord>> {
        let raw = conn
            .query_row(
                &format!("SELECT {} FROM failure_records WHERE id = ?1", RECORD_COLUMNS),
                params![id],
                RawRecord::from_row,
            )
            .optional()?;
        raw.map(RawRecord::parse).transpose()
    }

    fn query_pattern(conn: &Connection, key: &PatternKey) -> Result<Option<HealingPattern>> {
        let raw = conn
            .query_row(
                &format!(
                    "SELECT {} FROM healing_patterns
                     WHERE test_type = ?1 AND original_selector = ?2 AND page_url = ?3",
                    PATTERN_COLUMNS
                ),
                params![key.test_type, key.original_selector, key.page_url],
                RawPattern::from_row,
            )
            .optional()?;
        raw.map(RawPattern::parse).transpose()
    }
}

// ============================================================================
// Failure records
// ============================================================================

const RECORD_COLUMNS: &str = "id, test_id, test_name, test_type, error_message, dom_snapshot, \
    screenshot, console_errors, network_logs, url, selector, failure_type, status, \
    healed_selector, confidence_score, heal_source, failure_reason, last_error, \
    healing_attempts, transient_failures, created_at, updated_at, generation";

const TERMINAL_STATUSES: &str = "('healed', 'failed', 'bug_confirmed')";

impl RecordStore for Database {
    fn insert_record(&self, record: &FailureRecord) -> Result<()> {
        let conn = self.conn.lock();

        conn.execute(
            &format!(
                "INSERT INTO failure_records ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15,
                         ?16, ?17, ?18, ?19, ?20, ?21, ?22, ?23)",
                RECORD_COLUMNS
            ),
            params![
                record.id,
                record.test_id,
                record.test_name,
                record.test_type,
                record.error_message,
                record.dom_snapshot,
                record.screenshot,
                serde_json::to_string(&record.console_errors)?,
                serde_json::to_string(&record.network_logs)?,
                record.url,
                record.selector,
                record.failure_type.map(|t| t.as_str()),
                record.status.as_str(),
                record.healed_selector,
                record.confidence_score,
                record.heal_source.map(|s| s.as_str()),
                record.failure_reason.map(|r| r.as_str()),
                record.last_error,
                record.healing_attempts,
                record.transient_failures,
                record.created_at.timestamp_millis(),
                record.updated_at.timestamp_millis(),
                record.generation,
            ],
        )?;

        debug!("Inserted failure record {}", record.id);
        Ok(())
    }

    fn get_record(&self, id: &str) -> Result<Option<FailureRecord>> {
        let conn = self.conn.lock();
        Self::query_record(&conn, id)
    }

    fn list_records(&self, filter: &RecordFilter) -> Result<Vec<FailureRecord>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM failure_records
             WHERE (?1 IS NULL OR status = ?1) AND (?2 IS NULL OR failure_type = ?2)
             ORDER BY created_at DESC, seq DESC
             LIMIT ?3 OFFSET ?4",
            RECORD_COLUMNS
        ))?;

        let rows = stmt.query_map(
            params![
                filter.status.map(|s| s.as_str()),
                filter.failure_type.map(|t| t.as_str()),
                filter.limit as i64,
                filter.offset as i64,
            ],
            RawRecord::from_row,
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.parse()?);
        }

        Ok(results)
    }

    fn pending_ids(&self, limit: usize) -> Result<Vec<String>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT id FROM failure_records WHERE status = 'pending'
             ORDER BY created_at ASC, seq ASC LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| row.get(0))?;

        let mut ids = Vec::new();
        for row in rows {
            ids.push(row?);
        }
        Ok(ids)
    }

    fn claim_record(&self, id: &str) -> Result<Option<FailureRecord>> {
        let conn = self.conn.lock();

        let claimed = conn.execute(
            "UPDATE failure_records
             SET status = 'analyzing', healing_attempts = healing_attempts + 1,
                 updated_at = ?1, generation = generation + 1
             WHERE id = ?2 AND status = 'pending'",
            params![now().timestamp_millis(), id],
        )?;

        if claimed == 0 {
            return Ok(None);
        }
        debug!("Claimed failure record {}", id);
        Self::query_record(&conn, id)
    }

    fn replace_record(&self, record: &FailureRecord, expected_generation: i64) -> Result<bool> {
        let conn = self.conn.lock();

        let rows = conn.execute(
            "UPDATE failure_records
             SET failure_type = ?1, status = ?2, healed_selector = ?3, confidence_score = ?4,
                 heal_source = ?5, failure_reason = ?6, last_error = ?7, healing_attempts = ?8,
                 transient_failures = ?9, selector = ?10, updated_at = ?11, generation = ?12
             WHERE id = ?13 AND generation = ?14",
            params![
                record.failure_type.map(|t| t.as_str()),
                record.status.as_str(),
                record.healed_selector,
                record.confidence_score,
                record.heal_source.map(|s| s.as_str()),
                record.failure_reason.map(|r| r.as_str()),
                record.last_error,
                record.healing_attempts,
                record.transient_failures,
                record.selector,
                record.updated_at.timestamp_millis(),
                record.generation,
                record.id,
                expected_generation,
            ],
        )?;

        if rows == 0 {
            let exists: i64 = conn.query_row(
                "SELECT COUNT(*) FROM failure_records WHERE id = ?1",
                params![record.id],
                |row| row.get(0),
            )?;
            if exists == 0 {
                return Err(Error::not_found("record", &record.id));
            }
            return Ok(false);
        }

        debug!("Updated failure record {} to generation {}", record.id, record.generation);
        Ok(true)
    }

    fn delete_terminal_before(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let conn = self.conn.lock();

        let rows = conn.execute(
            &format!(
                "DELETE FROM failure_records WHERE status IN {} AND updated_at < ?1",
                TERMINAL_STATUSES
            ),
            params![cutoff.timestamp_millis()],
        )?;

        if rows > 0 {
            debug!("Deleted {} terminal failure records", rows);
        }
        Ok(rows as u64)
    }

    fn count_by_status_and_type(&self) -> Result<Vec<(HealingStatus, Option<FailureCategory>, u64)>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(
            "SELECT status, failure_type, COUNT(*) FROM failure_records
             GROUP BY status, failure_type",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, Option<String>>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut counts = Vec::new();
        for row in rows {
            let (status, failure_type, count) = row?;
            counts.push((
                status.parse()?,
                failure_type.map(|t| t.parse()).transpose()?,
                count as u64,
            ));
        }
        Ok(counts)
    }

    fn ping(&self) -> Result<()> {
        let conn = self.conn.lock();
        conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0))?;
        Ok(())
    }
}

// ============================================================================
// Healing patterns
// ============================================================================

const PATTERN_COLUMNS: &str = "id, test_type, original_selector, page_url, healed_selector, \
    confidence_score, dom_context, created_at, updated_at, last_used_at, use_count";

impl PatternStore for Database {
    fn get_pattern(&self, key: &PatternKey) -> Result<Option<HealingPattern>> {
        let conn = self.conn.lock();
        Self::query_pattern(&conn, key)
    }

    fn upsert_pattern(&self, pattern: &NewPattern) -> Result<HealingPattern> {
        let conn = self.conn.lock();
        let fresh = pattern.clone().into_pattern();

        // Equal confidence replaces: the most recent store wins ties.
        conn.execute(
            &format!(
                "INSERT INTO healing_patterns ({})
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
                 ON CONFLICT (test_type, original_selector, page_url) DO UPDATE SET
                     healed_selector = excluded.healed_selector,
                     confidence_score = excluded.confidence_score,
                     dom_context = excluded.dom_context,
                     updated_at = excluded.updated_at
                 WHERE excluded.confidence_score >= healing_patterns.confidence_score",
                PATTERN_COLUMNS
            ),
            params![
                fresh.id,
                fresh.key.test_type,
                fresh.key.original_selector,
                fresh.key.page_url,
                fresh.healed_selector,
                fresh.confidence_score,
                fresh.dom_context,
                fresh.created_at.timestamp_millis(),
                fresh.updated_at.timestamp_millis(),
                fresh.last_used_at.timestamp_millis(),
                fresh.use_count as i64,
            ],
        )?;

        Self::query_pattern(&conn, &pattern.key)?
            .ok_or_else(|| Error::Internal(format!("pattern {} vanished after upsert", pattern.key)))
    }

    fn touch_pattern(&self, key: &PatternKey, used_at: DateTime<Utc>) -> Result<bool> {
        let conn = self.conn.lock();

        let rows = conn.execute(
            "UPDATE healing_patterns
             SET use_count = use_count + 1, last_used_at = MAX(last_used_at, ?1)
             WHERE test_type = ?2 AND original_selector = ?3 AND page_url = ?4",
            params![
                used_at.timestamp_millis(),
                key.test_type,
                key.original_selector,
                key.page_url
            ],
        )?;
        Ok(rows > 0)
    }

    fn list_patterns(
        &self,
        test_type: Option<&str>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<HealingPattern>> {
        let conn = self.conn.lock();

        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM healing_patterns
             WHERE (?1 IS NULL OR test_type = ?1)
             ORDER BY use_count DESC, last_used_at DESC, id ASC
             LIMIT ?2 OFFSET ?3",
            PATTERN_COLUMNS
        ))?;
        let rows = stmt.query_map(
            params![test_type, limit as i64, offset as i64],
            RawPattern::from_row,
        )?;

        let mut results = Vec::new();
        for row in rows {
            results.push(row?.parse()?);
        }
        Ok(results)
    }

    fn delete_pattern(&self, id: &str) -> Result<bool> {
        let conn = self.conn.lock();
        let rows = conn.execute("DELETE FROM healing_patterns WHERE id = ?1", params![id])?;

        if rows > 0 {
            debug!("Deleted healing pattern {}", id);
        }

        Ok(rows > 0)
    }
}

fn timestamp(millis: i64) -> Result<DateTime<Utc>> {
    Utc.timestamp_millis_opt(millis)
        .single()
        .ok_or_else(|| Error::Internal(format!("invalid stored timestamp {}", millis)))
}

/// Raw database row before parsing
struct RawRecord {
    id: String,
    test_id: String,
    test_name: String,
    test_type: String,
    error_message: String,
    dom_snapshot: String,
    screenshot: Vec<u8>,
    console_errors: String,
    network_logs: String,
    url: String,
    selector: Option<String>,
    failure_type: Option<String>,
    status: String,
    healed_selector: Option<String>,
    confidence_score: Option<f64>,
    heal_source: Option<String>,
    failure_reason: Option<String>,
    last_error: Option<String>,
    healing_attempts: u32,
    transient_failures: u32,
    created_at: i64,
    updated_at: i64,
    generation: i64,
}

impl RawRecord {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            test_id: row.get(1)?,
            test_name: row.get(2)?,
            test_type: row.get(3)?,
            error_message: row.get(4)?,
            dom_snapshot: row.get(5)?,
            screenshot: row.get(6)?,
            console_errors: row.get(7)?,
            network_logs: row.get(8)?,
            url: row.get(9)?,
            selector: row.get(10)?,
            failure_type: row.get(11)?,
            status: row.get(12)?,
            healed_selector: row.get(13)?,
            confidence_score: row.get(14)?,
            heal_source: row.get(15)?,
            failure_reason: row.get(16)?,
            last_error: row.get(17)?,
            healing_attempts: row.get(18)?,
            transient_failures: row.get(19)?,
            created_at: row.get(20)?,
            updated_at: row.get(21)?,
            generation: row.get(22)?,
        })
    }

    fn parse(self) -> Result<FailureRecord> {
        Ok(FailureRecord {
            id: self.id,
            test_id: self.test_id,
            test_name: self.test_name,
            test_type: self.test_type,
            error_message: self.error_message,
            dom_snapshot: self.dom_snapshot,
            screenshot: self.screenshot,
            console_errors: serde_json::from_str(&self.console_errors)?,
            network_logs: serde_json::from_str(&self.network_logs)?,
            url: self.url,
            selector: self.selector,
            failure_type: self.failure_type.map(|t| t.parse()).transpose()?,
            status: self.status.parse()?,
            healed_selector: self.healed_selector,
            confidence_score: self.confidence_score,
            heal_source: self.heal_source.map(|s| s.parse()).transpose()?,
            failure_reason: self.failure_reason.map(|r| r.parse()).transpose()?,
            last_error: self.last_error,
            healing_attempts: self.healing_attempts,
            transient_failures: self.transient_failures,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
            generation: self.generation,
        })
    }
}

struct RawPattern {
    id: String,
    test_type: String,
    original_selector: String,
    page_url: String,
    healed_selector: String,
    confidence_score: f64,
    dom_context: Option<String>,
    created_at: i64,
    updated_at: i64,
    last_used_at: i64,
    use_count: i64,
}

impl RawPattern {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            test_type: row.get(1)?,
            original_selector: row.get(2)?,
            page_url: row.get(3)?,
            healed_selector: row.get(4)?,
            confidence_score: row.get(5)?,
            dom_context: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
            last_used_at: row.get(9)?,
            use_count: row.get(10)?,
        })
    }

    fn parse(self) -> Result<HealingPattern> {
        Ok(HealingPattern {
            id: self.id,
            key: PatternKey::new(self.test_type, self.original_selector, self.page_url),
            healed_selector: self.healed_selector,
            confidence_score: self.confidence_score,
            dom_context: self.dom_context,
            created_at: timestamp(self.created_at)?,
            updated_at: timestamp(self.updated_at)?,
            last_used_at: timestamp(self.last_used_at)?,
            use_count: self.use_count.max(0) as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{FailureContext, FailureError, FailureReason, HealSource, NetworkLogEntry, NewFailure};

    fn new_record(test_id: &str) -> FailureRecord {
        FailureRecord::from_new(
            NewFailure {
                test_id: test_id.to_string(),
                test_name: "checkout submits".to_string(),
                test_type: None,
                error: FailureError {
                    message: "Timeout 30000ms exceeded".to_string(),
                },
                context: FailureContext {
                    dom: "<button>Submit</button>".to_string(),
                    screenshot: vec![0x89, 0x50, 0x4e, 0x47],
                    console_errors: vec!["warning".to_string()],
                    network_logs: vec![NetworkLogEntry::response(200, "https://app.test/")],
                    url: "https://app.test/checkout".to_string(),
                    selector: Some("#submit-btn".to_string()),
                },
            },
            "e2e",
        )
    }

    #[test]
    fn test_record_roundtrip() {
        let db = Database::open_memory().unwrap();
        let record = new_record("t1");
        db.insert_record(&record).unwrap();

        let loaded = db.get_record(&record.id).unwrap().unwrap();
        assert_eq!(loaded, record);
        assert!(db.get_record("missing").unwrap().is_none());
        assert!(db.insert_record(&record).is_err());
    }

    #[test]
    fn test_claim_and_compare_and_swap() {
        let db = Database::open_memory().unwrap();
        let record = new_record("t1");
        db.insert_record(&record).unwrap();

        let mut claimed = db.claim_record(&record.id).unwrap().unwrap();
        assert_eq!(claimed.status, HealingStatus::Analyzing);
        assert_eq!(claimed.healing_attempts, 1);
        assert!(db.claim_record(&record.id).unwrap().is_none());

        let expected = claimed.generation;
        claimed.status = HealingStatus::Healed;
        claimed.failure_type = Some(FailureCategory::SelectorIssue);
        claimed.healed_selector = Some("[data-testid=\"submit\"]".to_string());
        claimed.confidence_score = Some(0.9);
        claimed.heal_source = Some(HealSource::Generator);
        claimed.touch();
        assert!(db.replace_record(&claimed, expected).unwrap());
        assert!(!db.replace_record(&claimed, expected).unwrap());

        let loaded = db.get_record(&record.id).unwrap().unwrap();
        assert_eq!(loaded.status, HealingStatus::Healed);
        assert_eq!(loaded.heal_source, Some(HealSource::Generator));
        assert_eq!(loaded.generation, claimed.generation);

        let mut ghost = new_record("ghost");
        ghost.failure_reason = Some(FailureReason::NoViableCandidate);
        assert!(matches!(
            db.replace_record(&ghost, 1),
            Err(Error::NotFound { .. })
        ));
    }

    #[test]
    fn test_pairing_is_enforced_by_schema() {
        let db = Database::open_memory().unwrap();
        let mut record = new_record("t1");
        record.healed_selector = Some("#x".to_string());
        assert!(db.insert_record(&record).is_err());
    }

    #[test]
    fn test_retention_only_removes_old_terminal_records() {
        let db = Database::open_memory().unwrap();
        let mut old_failed = new_record("failed");
        old_failed.status = HealingStatus::Failed;
        old_failed.updated_at = Utc::now() - chrono::Duration::days(40);
        let mut old_pending = new_record("pending");
        old_pending.updated_at = Utc::now() - chrono::Duration::days(400);
        let fresh_failed = {
            let mut r = new_record("fresh");
            r.status = HealingStatus::Failed;
            r
        };
        for r in [&old_failed, &old_pending, &fresh_failed] {
            db.insert_record(r).unwrap();
        }

        let deleted = db
            .delete_terminal_before(Utc::now() - chrono::Duration::days(30))
            .unwrap();
        assert_eq!(deleted, 1);
        assert!(db.get_record(&old_failed.id).unwrap().is_none());
        assert!(db.get_record(&old_pending.id).unwrap().is_some());
        assert!(db.get_record(&fresh_failed.id).unwrap().is_some());
    }

    #[test]
    fn test_list_filters_and_counts() {
        let db = Database::open_memory().unwrap();
        let mut ids = Vec::new();
        for i in 0..4 {
            let mut r = new_record(&format!("t{}", i));
            if i % 2 == 0 {
                r.status = HealingStatus::Failed;
                r.failure_type = Some(FailureCategory::TimingIssue);
            }
            db.insert_record(&r).unwrap();
            ids.push(r.id);
        }

        let failed = db
            .list_records(&RecordFilter {
                status: Some(HealingStatus::Failed),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(failed.iter().map(|r| r.id.clone()).collect::<Vec<_>>(), vec![ids[2].clone(), ids[0].clone()]);

        let timing = db
            .list_records(&RecordFilter {
                failure_type: Some(FailureCategory::TimingIssue),
                limit: 1,
                ..Default::default()
            })
            .unwrap();
        assert_eq!(timing.len(), 1);

        let mut counts = db.count_by_status_and_type().unwrap();
        counts.sort_by_key(|(s, _, _)| s.as_str());
        assert_eq!(
            counts,
            vec![
                (HealingStatus::Failed, Some(FailureCategory::TimingIssue), 2),
                (HealingStatus::Pending, None, 2),
            ]
        );
        assert_eq!(db.pending_ids(10).unwrap(), vec![ids[1].clone(), ids[3].clone()]);
        db.ping().unwrap();
    }

    #[test]
    fn test_pattern_upsert_policy() {
        let db = Database::open_memory().unwrap();
        let key = PatternKey::new("e2e", "#submit-btn", "https://app.test/checkout");
        let new = |selector: &str, confidence: f64| NewPattern {
            key: key.clone(),
            healed_selector: selector.to_string(),
            confidence_score: confidence,
            dom_context: Some("<button>".to_string()),
        };

        let first = db.upsert_pattern(&new("[data-testid=\"submit\"]", 0.8)).unwrap();
        assert_eq!(first.use_count, 1);

        let lower = db.upsert_pattern(&new("button", 0.4)).unwrap();
        assert_eq!(lower.healed_selector, "[data-testid=\"submit\"]");
        assert_eq!(lower.id, first.id);

        let tie = db.upsert_pattern(&new("#submit", 0.8)).unwrap();
        assert_eq!(tie.healed_selector, "#submit");
        assert_eq!(tie.created_at, first.created_at);

        assert!(db.touch_pattern(&key, Utc::now()).unwrap());
        assert!(!db
            .touch_pattern(&PatternKey::new("e2e", "#other", ""), Utc::now())
            .unwrap());
        assert_eq!(db.get_pattern(&key).unwrap().unwrap().use_count, 2);

        // Exact, case-sensitive key
        assert!(db
            .get_pattern(&PatternKey::new("E2E", "#submit-btn", "https://app.test/checkout"))
            .unwrap()
            .is_none());

        assert_eq!(db.list_patterns(Some("e2e"), 10, 0).unwrap().len(), 1);
        assert!(db.list_patterns(Some("unit"), 10, 0).unwrap().is_empty());
        assert!(db.delete_pattern(&tie.id).unwrap());
        assert!(!db.delete_pattern(&tie.id).unwrap());
    }
}
