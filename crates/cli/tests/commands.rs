use std::path::PathBuf;

use testmend_cli::client::StoreClient;
use testmend_cli::commands::pattern::{self, PatternCommands};
use testmend_cli::commands::queue::{self, build_failure, EnqueueArgs, QueueCommands};
use testmend_cli::output::OutputFormat;
use testmend_common::{HealingConfig, HealingStatus, RecordFilter};

fn enqueue_args(dom_file: PathBuf) -> EnqueueArgs {
    EnqueueArgs {
        json: None,
        test_id: Some("checkout-1".to_string()),
        test_name: Some("checkout submits order".to_string()),
        test_type: None,
        error: Some("Timeout 30000ms exceeded waiting for selector \"#submit-btn\"".to_string()),
        dom_file: Some(dom_file),
        screenshot: None,
        url: "https://shop.test/checkout".to_string(),
        selector: None,
        console_errors: Vec::new(),
        network_log: None,
        heal: true,
    }
}

/// Enqueue with `--heal` against an on-disk store, then inspect the
/// pattern it produced
#[test]
fn enqueue_and_heal_populates_patterns() {
    let dir = tempfile::tempdir().expect("tempdir");
    let dom_file = dir.path().join("page.html");
    std::fs::write(
        &dom_file,
        r#"<form id="checkout"><button data-testid="submit-button">Submit</button></form>"#,
    )
    .expect("write dom");

    let client = StoreClient::open(dir.path().join("state.db"), HealingConfig::default())
        .expect("open store");
    queue::execute(
        QueueCommands::Enqueue(enqueue_args(dom_file)),
        &client,
        OutputFormat::Json,
    )
    .expect("enqueue");

    let records = client
        .queue()
        .list(&RecordFilter::default())
        .expect("list");
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].status, HealingStatus::Healed);

    let patterns = client.cache().list(None, 10, 0).expect("patterns");
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].healed_selector, "[data-testid=\"submit-button\"]");

    pattern::execute(
        PatternCommands::Purge {
            id: patterns[0].id.clone(),
        },
        &client,
        OutputFormat::Plain,
    )
    .expect("purge");
    assert!(client.cache().list(None, 10, 0).expect("patterns").is_empty());
}

/// A JSON failure report is accepted with camelCase keys
#[test]
fn json_report_parses() {
    let dir = tempfile::tempdir().expect("tempdir");
    let report = dir.path().join("failure.json");
    std::fs::write(
        &report,
        r#"{
            "testId": "login-1",
            "testName": "login works",
            "error": {"message": "Request failed with status 401"},
            "context": {
                "url": "https://shop.test/login",
                "consoleErrors": [],
                "networkLogs": [{"statusCode": 401, "url": "https://shop.test/api/me"}]
            }
        }"#,
    )
    .expect("write report");

    let mut args = enqueue_args(PathBuf::new());
    args.json = Some(report);
    let failure = build_failure(args).expect("build failure");
    assert_eq!(failure.test_id, "login-1");
    assert_eq!(failure.context.network_logs.len(), 1);

    let client = StoreClient::in_memory().expect("store");
    let record = client.queue().enqueue(failure).expect("enqueue");
    let analyzed = client
        .queue()
        .process_next()
        .expect("process")
        .expect("pending record");
    assert_eq!(analyzed.id, record.id);
    assert_eq!(analyzed.status, HealingStatus::Failed);
}

#[test]
fn cleanup_rejects_out_of_range_threshold() {
    let client = StoreClient::in_memory().expect("store");
    let result = queue::execute(
        QueueCommands::Cleanup {
            older_than_days: 0,
        },
        &client,
        OutputFormat::Plain,
    );
    assert!(result.is_err());
}

#[test]
fn health_reports_in_every_format() {
    let client = StoreClient::in_memory().expect("store");
    for format in [OutputFormat::Json, OutputFormat::Yaml, OutputFormat::Plain] {
        queue::execute(QueueCommands::Health, &client, format).expect("healthy store");
    }
}

/// Pattern uses counted before a command fails still reach the database
/// once the client is dropped
#[test]
fn failing_command_keeps_pattern_usage() {
    let dir = tempfile::tempdir().expect("tempdir");
    let db = dir.path().join("state.db");

    {
        let client = StoreClient::open(&db, HealingConfig::default()).expect("open store");
        pattern::execute(
            PatternCommands::Store {
                original: "#submit-btn".to_string(),
                healed: "[data-testid=\"submit-button\"]".to_string(),
                confidence: 0.9,
                test_type: "e2e".to_string(),
                page_url: None,
                dom_context: None,
            },
            &client,
            OutputFormat::Json,
        )
        .expect("store");
        pattern::execute(
            PatternCommands::Find {
                original: "#submit-btn".to_string(),
                test_type: "e2e".to_string(),
                page_url: None,
            },
            &client,
            OutputFormat::Json,
        )
        .expect("find");
        let result = queue::execute(
            QueueCommands::Cleanup {
                older_than_days: 0,
            },
            &client,
            OutputFormat::Json,
        );
        assert!(result.is_err());
    }

    let client = StoreClient::open(&db, HealingConfig::default()).expect("reopen store");
    let patterns = client.cache().list(None, 10, 0).expect("patterns");
    assert_eq!(patterns.len(), 1);
    assert_eq!(patterns[0].use_count, 2);
}
