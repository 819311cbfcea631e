//! Healing queue commands

use anyhow::{Context, Result};
use clap::{Args, Subcommand};
use serde::Serialize;
use std::io::Read;
use std::path::{Path, PathBuf};
use testmend_common::{
    FailureCategory, FailureContext, FailureError, FailureRecord, HealingStatus, NetworkLogEntry,
    NewFailure, RecordFilter, RecordPatch,
};

use crate::client::StoreClient;
use crate::output::{
    confidence, or_dash, print_fields, print_item, print_list, print_message, print_structured,
    print_success, status_label, OutputFormat, TableDisplay,
};

#[derive(Subcommand)]
pub enum QueueCommands {
    /// Report a failed test
    Enqueue(EnqueueArgs),

    /// List failure records, newest first
    List(ListArgs),

    /// Show one failure record
    Get {
        /// Record ID
        id: String,
    },

    /// Correct a record by hand
    Update(UpdateArgs),

    /// Analyze pending records now
    Heal {
        /// Maximum records to process
        #[arg(short, long, default_value = "100")]
        limit: usize,
    },

    /// Delete finished records older than a threshold
    Cleanup {
        /// Age threshold in days (1-365)
        #[arg(long, default_value = "30")]
        older_than_days: u32,
    },

    /// Queue counts and heal success rate
    Stats,

    /// Check that the store is readable
    Health,
}

#[derive(Args)]
pub struct EnqueueArgs {
    /// Read the whole failure report as JSON from a file (`-` for stdin)
    #[arg(long, conflicts_with_all = ["test_id", "test_name", "error"])]
    pub json: Option<PathBuf>,

    /// Test identifier
    #[arg(long, required_unless_present = "json")]
    pub test_id: Option<String>,

    /// Test display name
    #[arg(long, required_unless_present = "json")]
    pub test_name: Option<String>,

    /// Test type used for pattern lookups
    #[arg(long)]
    pub test_type: Option<String>,

    /// Error message reported by the runner
    #[arg(short, long, required_unless_present = "json")]
    pub error: Option<String>,

    /// HTML snapshot of the page at failure time
    #[arg(long)]
    pub dom_file: Option<PathBuf>,

    /// Screenshot captured at failure time
    #[arg(long)]
    pub screenshot: Option<PathBuf>,

    /// Page URL
    #[arg(long, default_value = "")]
    pub url: String,

    /// Selector the test used
    #[arg(long)]
    pub selector: Option<String>,

    /// Browser console error (repeatable)
    #[arg(long = "console-error")]
    pub console_errors: Vec<String>,

    /// JSON array of captured network events
    #[arg(long)]
    pub network_log: Option<PathBuf>,

    /// Analyze the record right away
    #[arg(long)]
    pub heal: bool,
}

#[derive(Args)]
pub struct ListArgs {
    /// Filter by status
    #[arg(short, long)]
    pub status: Option<HealingStatus>,

    /// Filter by failure type
    #[arg(short = 't', long)]
    pub failure_type: Option<FailureCategory>,

    /// Page size (1-100)
    #[arg(short, long, default_value = "50")]
    pub limit: usize,

    /// Records to skip
    #[arg(short, long, default_value = "0")]
    pub offset: usize,
}

#[derive(Args)]
pub struct UpdateArgs {
    /// Record ID
    pub id: String,

    /// New status
    #[arg(short, long)]
    pub status: Option<HealingStatus>,

    /// Replacement selector
    #[arg(long)]
    pub healed_selector: Option<String>,

    /// Confidence in the replacement (0-1)
    #[arg(long)]
    pub confidence: Option<f64>,

    /// Healing attempt count
    #[arg(long)]
    pub attempts: Option<u32>,

    /// Only apply if the record is currently in this status
    #[arg(long)]
    pub expected_status: Option<HealingStatus>,

    /// Only apply if the record is still at this generation
    #[arg(long)]
    pub expected_generation: Option<i64>,
}

/// Record display wrapper for list output
#[derive(Serialize)]
pub struct RecordRow {
    pub id: String,
    pub test_id: String,
    pub status: HealingStatus,
    pub failure_type: Option<FailureCategory>,
    pub selector: Option<String>,
    pub healed_selector: Option<String>,
    pub confidence_score: Option<f64>,
    pub healing_attempts: u32,
    pub updated_at: String,
}

impl From<&FailureRecord> for RecordRow {
    fn from(record: &FailureRecord) -> Self {
        Self {
            id: record.id.clone(),
            test_id: record.test_id.clone(),
            status: record.status,
            failure_type: record.failure_type,
            selector: record.selector.clone(),
            healed_selector: record.healed_selector.clone(),
            confidence_score: record.confidence_score,
            healing_attempts: record.healing_attempts,
            updated_at: record.updated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl TableDisplay for RecordRow {
    fn headers() -> Vec<&'static str> {
        vec![
            "ID", "Test", "Status", "Type", "Selector", "Healed", "Confidence", "Attempts",
            "Updated",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.test_id.clone(),
            status_label(self.status),
            or_dash(self.failure_type),
            or_dash(self.selector.as_deref()),
            or_dash(self.healed_selector.as_deref()),
            confidence(self.confidence_score),
            self.healing_attempts.to_string(),
            self.updated_at.clone(),
        ]
    }
}

/// Execute queue commands
pub fn execute(cmd: QueueCommands, client: &StoreClient, format: OutputFormat) -> Result<()> {
    let queue = client.queue();

    match cmd {
        QueueCommands::Enqueue(args) => {
            let heal = args.heal;
            let failure = build_failure(args)?;
            let mut record = queue.enqueue(failure)?;
            if heal {
                let claimed = queue.claim(&record.id)?;
                record = queue.analyze(claimed)?;
            }

            if format.is_structured() {
                print_structured(&record, format);
            } else {
                print_success(&format!("Enqueued failure {}", record.id));
                if heal {
                    print_item(&RecordRow::from(&record), format);
                }
            }
        }

        QueueCommands::List(args) => {
            let filter = RecordFilter {
                status: args.status,
                failure_type: args.failure_type,
                limit: args.limit,
                offset: args.offset,
            };
            let records = queue.list(&filter)?;
            if format.is_structured() {
                print_structured(&records, format);
            } else {
                let rows: Vec<RecordRow> = records.iter().map(RecordRow::from).collect();
                print_list(&rows, format);
            }
        }

        QueueCommands::Get { id } => {
            let record = queue.get(&id)?;
            if format.is_structured() {
                print_structured(&record, format);
            } else {
                print_fields(&record_fields(&record), format);
            }
        }

        QueueCommands::Update(args) => {
            let patch = RecordPatch {
                status: args.status,
                healed_selector: args.healed_selector,
                confidence_score: args.confidence,
                healing_attempts: args.attempts,
                expected_status: args.expected_status,
                expected_generation: args.expected_generation,
            };
            let record = queue.update(&args.id, patch)?;
            if format.is_structured() {
                print_structured(&record, format);
            } else {
                print_success(&format!("Updated record {}", record.id));
                print_item(&RecordRow::from(&record), format);
            }
        }

        QueueCommands::Heal { limit } => {
            let processed = queue.process_pending(limit)?;
            if format.is_structured() {
                print_structured(&processed, format);
            } else if processed.is_empty() {
                print_message("No pending failures.", format);
            } else {
                let rows: Vec<RecordRow> = processed.iter().map(RecordRow::from).collect();
                print_list(&rows, format);
            }
        }

        QueueCommands::Cleanup { older_than_days } => {
            let deleted = queue.cleanup(older_than_days)?;
            if format.is_structured() {
                print_structured(&serde_json::json!({ "deletedCount": deleted }), format);
            } else {
                print_success(&format!(
                    "Deleted {} finished record(s) older than {} day(s)",
                    deleted, older_than_days
                ));
            }
        }

        QueueCommands::Stats => {
            let stats = queue.stats()?;
            if format.is_structured() {
                print_structured(&stats, format);
            } else {
                let mut fields = vec![("total", stats.total.to_string())];
                fields.extend(
                    stats
                        .by_status
                        .iter()
                        .map(|(status, count)| (status.as_str(), count.to_string())),
                );
                fields.extend(
                    stats
                        .by_failure_type
                        .iter()
                        .filter(|(_, count)| *count > 0)
                        .map(|(category, count)| (category.as_str(), count.to_string())),
                );
                fields.push((
                    "heal_success_rate",
                    format!("{:.1}%", stats.heal_success_rate * 100.0),
                ));
                print_fields(&fields, format);
            }
        }

        QueueCommands::Health => {
            let healthy = queue.health();
            if format.is_structured() {
                print_structured(&serde_json::json!({ "healthy": healthy }), format);
            } else if healthy {
                print_success(&format!("Store is healthy at {}", client.path().display()));
            }
            if !healthy {
                // No process::exit here: the client's Drop must still run
                anyhow::bail!("store is not responding at {}", client.path().display());
            }
        }
    }

    Ok(())
}

fn record_fields(record: &FailureRecord) -> Vec<(&'static str, String)> {
    vec![
        ("id", record.id.clone()),
        ("test_id", record.test_id.clone()),
        ("test_name", record.test_name.clone()),
        ("test_type", record.test_type.clone()),
        ("status", status_label(record.status)),
        ("failure_type", or_dash(record.failure_type)),
        ("failure_reason", or_dash(record.failure_reason.map(|r| r.as_str()))),
        ("error", record.error_message.clone()),
        ("url", record.url.clone()),
        ("selector", or_dash(record.selector.as_deref())),
        ("healed_selector", or_dash(record.healed_selector.as_deref())),
        ("confidence", confidence(record.confidence_score)),
        ("heal_source", or_dash(record.heal_source.map(|s| s.as_str()))),
        ("healing_attempts", record.healing_attempts.to_string()),
        ("last_error", or_dash(record.last_error.as_deref())),
        ("console_errors", record.console_errors.len().to_string()),
        ("network_events", record.network_logs.len().to_string()),
        ("dom_bytes", record.dom_snapshot.len().to_string()),
        ("screenshot_bytes", record.screenshot.len().to_string()),
        ("generation", record.generation.to_string()),
        ("created_at", record.created_at.to_rfc3339()),
        ("updated_at", record.updated_at.to_rfc3339()),
    ]
}

/// Build the enqueue request from flags or a JSON report
pub fn build_failure(args: EnqueueArgs) -> Result<NewFailure> {
    if let Some(path) = &args.json {
        let content = read_input(path)?;
        let failure: NewFailure =
            serde_json::from_str(&content).context("failure report is not valid JSON")?;
        return Ok(failure);
    }

    let dom = match &args.dom_file {
        Some(path) => read_input(path)?,
        None => String::new(),
    };
    let screenshot = match &args.screenshot {
        Some(path) => std::fs::read(path)
            .with_context(|| format!("failed to read screenshot {}", path.display()))?,
        None => Vec::new(),
    };
    let network_logs: Vec<NetworkLogEntry> = match &args.network_log {
        Some(path) => serde_json::from_str(&read_input(path)?)
            .context("network log must be a JSON array")?,
        None => Vec::new(),
    };

    Ok(NewFailure {
        test_id: args.test_id.unwrap_or_default(),
        test_name: args.test_name.unwrap_or_default(),
        test_type: args.test_type,
        error: FailureError {
            message: args.error.unwrap_or_default(),
        },
        context: FailureContext {
            dom,
            screenshot,
            console_errors: args.console_errors,
            network_logs,
            url: args.url,
            selector: args.selector,
        },
    })
}

/// Read a file, or stdin for `-`
pub fn read_input(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
    }
}
