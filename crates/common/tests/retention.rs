use std::sync::Arc;

use chrono::Duration;
use testmend_common::{
    now, Database, FailureContext, FailureError, HealingConfig, HealingQueue, HealingStatus,
    NewFailure, PatternCache, RecordFilter, RecordStore,
};

fn failure(test_id: &str, message: &str) -> NewFailure {
    NewFailure {
        test_id: test_id.to_string(),
        test_name: test_id.to_string(),
        test_type: None,
        error: FailureError {
            message: message.to_string(),
        },
        context: FailureContext::default(),
    }
}

/// Retention only ever removes old terminal records
///
/// Pending and analyzing records are kept no matter how old they are.
#[test]
fn cleanup_keeps_unfinished_records() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = Arc::new(Database::open(dir.path().join("state.db")).expect("open database"));
    let cache = Arc::new(PatternCache::new(db.clone()).expect("pattern cache"));
    let queue = HealingQueue::new(db.clone(), cache, HealingConfig::default()).expect("queue");

    let finished = queue.enqueue(failure("old-auth", "403 Forbidden")).expect("enqueue");
    queue.process_next().expect("process");
    let recent = queue.enqueue(failure("recent", "401 Unauthorized")).expect("enqueue");
    queue.process_next().expect("process");
    let analyzing = queue.enqueue(failure("stuck", "boom")).expect("enqueue");
    queue.claim(&analyzing.id).expect("claim");
    let pending = queue.enqueue(failure("waiting", "boom")).expect("enqueue");

    for id in [&finished.id, &analyzing.id, &pending.id] {
        let mut record = queue.get(id).expect("get");
        let expected = record.generation;
        record.updated_at = now() - Duration::days(45);
        record.generation += 1;
        assert!(db.replace_record(&record, expected).expect("age record"));
    }

    assert_eq!(queue.cleanup(30).expect("cleanup"), 1);
    assert!(queue.get(&finished.id).is_err());
    assert_eq!(queue.get(&analyzing.id).expect("get").status, HealingStatus::Analyzing);
    assert_eq!(queue.get(&pending.id).expect("get").status, HealingStatus::Pending);
    assert_eq!(queue.get(&recent.id).expect("get").status, HealingStatus::Failed);

    assert_eq!(queue.list(&RecordFilter::default()).expect("list").len(), 3);
    assert!(queue.cleanup(0).is_err());
}
