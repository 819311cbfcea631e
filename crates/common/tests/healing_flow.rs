use std::sync::Arc;

use testmend_common::{
    Database, FailureCategory, FailureContext, FailureError, FailureReason, HealSource,
    HealingConfig, HealingQueue, HealingStatus, NetworkLogEntry, NewFailure, PatternCache,
    RecordFilter,
};

const CHECKOUT_PAGE: &str = r#"<!doctype html>
<html>
  <body>
    <form id="checkout">
      <input name="email" placeholder="Email address">
      <button data-testid="submit-button" class="btn btn-primary">Submit</button>
    </form>
  </body>
</html>"#;

fn selector_failure(test_id: &str, dom: &str) -> NewFailure {
    NewFailure {
        test_id: test_id.to_string(),
        test_name: "checkout submits order".to_string(),
        test_type: None,
        error: FailureError {
            message: "Timeout 30000ms exceeded waiting for selector \"#submit-btn\"".to_string(),
        },
        context: FailureContext {
            dom: dom.to_string(),
            url: "https://shop.test/checkout".to_string(),
            ..Default::default()
        },
    }
}

fn open_queue(dir: &tempfile::TempDir) -> (HealingQueue, Arc<PatternCache>) {
    let db = Arc::new(Database::open(dir.path().join("state.db")).expect("open database"));
    let cache = Arc::new(PatternCache::new(db.clone()).expect("pattern cache"));
    let queue = HealingQueue::new(db, cache.clone(), HealingConfig::default()).expect("queue");
    (queue, cache)
}

/// Selector failure end to end against SQLite
///
/// The first record heals from the DOM and seeds the cache; the second
/// record with the same key heals from the cache.
#[test]
fn selector_failure_heals_then_hits_cache() {
    let dir = tempfile::tempdir().expect("tempdir");
    let (queue, cache) = open_queue(&dir);

    let first = queue
        .enqueue(selector_failure("checkout-1", CHECKOUT_PAGE))
        .expect("enqueue");
    assert_eq!(first.status, HealingStatus::Pending);

    let healed = queue.process_next().expect("process").expect("a pending record");
    assert_eq!(healed.id, first.id);
    assert_eq!(healed.status, HealingStatus::Healed);
    assert_eq!(healed.failure_type, Some(FailureCategory::SelectorIssue));
    assert_eq!(
        healed.healed_selector.as_deref(),
        Some("[data-testid=\"submit-button\"]")
    );
    assert_eq!(healed.heal_source, Some(HealSource::Generator));

    let persisted = queue.get(&first.id).expect("get");
    assert_eq!(persisted, healed);

    let second = queue
        .enqueue(selector_failure("checkout-2", CHECKOUT_PAGE))
        .expect("enqueue");
    let from_cache = queue.process_next().expect("process").expect("a pending record");
    assert_eq!(from_cache.id, second.id);
    assert_eq!(from_cache.heal_source, Some(HealSource::Cache));
    assert_eq!(from_cache.healed_selector, healed.healed_selector);

    cache.flush();
    let pattern = cache
        .find("e2e", "#submit-btn", Some("https://shop.test/checkout"))
        .expect("find")
        .expect("cached pattern");
    // Stored once, read by the second record and by this lookup
    assert_eq!(pattern.use_count, 3);

    let stats = queue.stats().expect("stats");
    assert_eq!(stats.total, 2);
    assert_eq!(stats.heal_success_rate, 1.0);
}

/// Records survive reopening the database
#[test]
fn records_persist_across_reopen() {
    let dir = tempfile::tempdir().expect("tempdir");
    let id = {
        let (queue, _) = open_queue(&dir);
        let mut auth = selector_failure("login-1", CHECKOUT_PAGE);
        auth.error.message = "Request failed with status 401 Unauthorized".to_string();
        auth.context.network_logs = vec![NetworkLogEntry::response(401, "https://shop.test/api/me")];
        let record = queue.enqueue(auth).expect("enqueue");
        queue.process_next().expect("process");
        record.id
    };

    let (queue, _) = open_queue(&dir);
    let record = queue.get(&id).expect("get after reopen");
    assert_eq!(record.status, HealingStatus::Failed);
    assert_eq!(record.failure_type, Some(FailureCategory::AuthIssue));
    assert_eq!(record.failure_reason, Some(FailureReason::NonSelectorCategory));
    assert_eq!(record.network_logs.len(), 1);

    let failed = queue
        .list(&RecordFilter {
            status: Some(HealingStatus::Failed),
            ..Default::default()
        })
        .expect("list");
    assert_eq!(failed.len(), 1);
    assert!(queue.health());
}
