//! Ad-hoc analysis commands
//!
//! These run the classifier and candidate generator without touching the
//! store.

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use std::path::PathBuf;
use testmend_common::{
    CandidateGenerator, ClassifierInput, FailureClassifier, HealingConfig, NetworkLogEntry,
    SelectorCandidate,
};

use crate::commands::queue::read_input;
use crate::output::{
    confidence, or_dash, print_fields, print_list, print_structured, OutputFormat, TableDisplay,
};

#[derive(Subcommand)]
pub enum AnalyzeCommands {
    /// Classify a failure without enqueuing it
    Classify {
        /// Error message reported by the runner
        #[arg(short, long)]
        error: String,

        /// HTML snapshot of the page
        #[arg(long)]
        dom_file: Option<PathBuf>,

        /// Browser console error (repeatable)
        #[arg(long = "console-error")]
        console_errors: Vec<String>,

        /// JSON array of captured network events
        #[arg(long)]
        network_log: Option<PathBuf>,

        /// Selector the test used
        #[arg(long)]
        selector: Option<String>,
    },

    /// Propose replacement selectors from a DOM snapshot
    Alternatives {
        /// Selector that no longer matches
        selector: String,

        /// HTML snapshot of the page (`-` for stdin)
        #[arg(long)]
        dom_file: PathBuf,

        /// Maximum candidates
        #[arg(short, long, default_value = "5")]
        max: usize,
    },
}

/// Candidate display wrapper
#[derive(Serialize)]
pub struct CandidateRow {
    pub rank: usize,
    #[serde(flatten)]
    pub candidate: SelectorCandidate,
}

impl TableDisplay for CandidateRow {
    fn headers() -> Vec<&'static str> {
        vec!["#", "Selector", "Strategy", "Confidence", "Rationale"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.rank.to_string(),
            self.candidate.selector.clone(),
            self.candidate.strategy.to_string(),
            confidence(Some(self.candidate.confidence_score)),
            self.candidate.rationale.clone(),
        ]
    }
}

/// Execute analysis commands
pub fn execute(cmd: AnalyzeCommands, config: &HealingConfig, format: OutputFormat) -> Result<()> {
    match cmd {
        AnalyzeCommands::Classify {
            error,
            dom_file,
            console_errors,
            network_log,
            selector,
        } => {
            let dom = match &dom_file {
                Some(path) => read_input(path)?,
                None => String::new(),
            };
            let network_logs: Vec<NetworkLogEntry> = match &network_log {
                Some(path) => serde_json::from_str(&read_input(path)?)?,
                None => Vec::new(),
            };

            let classifier = FailureClassifier::from_config(config);
            let input = ClassifierInput::new(&error, &dom, &console_errors, &network_logs)
                .with_selector(selector.as_deref());
            let report = classifier.report(&input);

            if format.is_structured() {
                print_structured(&report, format);
            } else {
                let mut fields = vec![
                    ("failure_type", report.failure_type.to_string()),
                    ("description", report.description.clone()),
                    ("selector", or_dash(report.selector.as_deref())),
                ];
                fields.extend(
                    report
                        .recommended_actions
                        .iter()
                        .map(|action| ("action", action.clone())),
                );
                print_fields(&fields, format);
            }
        }

        AnalyzeCommands::Alternatives {
            selector,
            dom_file,
            max,
        } => {
            let dom = read_input(&dom_file)?;
            let candidates =
                CandidateGenerator::from_config(config).find_alternatives(&selector, &dom, max);
            let rows: Vec<CandidateRow> = candidates
                .into_iter()
                .enumerate()
                .map(|(i, candidate)| CandidateRow {
                    rank: i + 1,
                    candidate,
                })
                .collect();
            print_list(&rows, format);
        }
    }

    Ok(())
}
