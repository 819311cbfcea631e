//! Healing pattern commands

use anyhow::Result;
use clap::Subcommand;
use serde::Serialize;
use testmend_common::{HealingCache, HealingPattern, NewPattern, PatternKey};

use crate::client::StoreClient;
use crate::output::{
    confidence, or_dash, print_item, print_list, print_message, print_structured, print_success,
    OutputFormat, TableDisplay,
};

#[derive(Subcommand)]
pub enum PatternCommands {
    /// Record a selector repair
    Store {
        /// Selector the test used
        #[arg(long)]
        original: String,

        /// Selector that works now
        #[arg(long)]
        healed: String,

        /// Confidence in the repair (0-1)
        #[arg(short, long)]
        confidence: f64,

        /// Test type
        #[arg(short = 't', long, default_value = "e2e")]
        test_type: String,

        /// Page URL the repair applies to
        #[arg(long)]
        page_url: Option<String>,

        /// Free-form context kept with the pattern
        #[arg(long)]
        dom_context: Option<String>,
    },

    /// Look up the repair for a selector
    Find {
        /// Selector the test used
        original: String,

        /// Test type
        #[arg(short = 't', long, default_value = "e2e")]
        test_type: String,

        /// Page URL
        #[arg(long)]
        page_url: Option<String>,
    },

    /// List stored patterns, most used first
    List {
        /// Only patterns for this test type
        #[arg(short = 't', long)]
        test_type: Option<String>,

        /// Page size
        #[arg(short, long, default_value = "50")]
        limit: usize,

        /// Patterns to skip
        #[arg(short, long, default_value = "0")]
        offset: usize,
    },

    /// Delete a pattern
    Purge {
        /// Pattern ID
        id: String,
    },
}

/// Pattern display wrapper
#[derive(Serialize)]
pub struct PatternRow {
    pub id: String,
    pub test_type: String,
    pub original_selector: String,
    pub page_url: String,
    pub healed_selector: String,
    pub confidence_score: f64,
    pub use_count: u64,
    pub last_used_at: String,
}

impl From<&HealingPattern> for PatternRow {
    fn from(pattern: &HealingPattern) -> Self {
        Self {
            id: pattern.id.clone(),
            test_type: pattern.key.test_type.clone(),
            original_selector: pattern.key.original_selector.clone(),
            page_url: pattern.key.page_url.clone(),
            healed_selector: pattern.healed_selector.clone(),
            confidence_score: pattern.confidence_score,
            use_count: pattern.use_count,
            last_used_at: pattern.last_used_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

impl TableDisplay for PatternRow {
    fn headers() -> Vec<&'static str> {
        vec![
            "ID", "Type", "Original", "Page", "Healed", "Confidence", "Uses", "Last Used",
        ]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.id.clone(),
            self.test_type.clone(),
            self.original_selector.clone(),
            or_dash(Some(self.page_url.as_str()).filter(|u| !u.is_empty())),
            self.healed_selector.clone(),
            confidence(Some(self.confidence_score)),
            self.use_count.to_string(),
            self.last_used_at.clone(),
        ]
    }
}

/// Execute pattern commands
pub fn execute(cmd: PatternCommands, client: &StoreClient, format: OutputFormat) -> Result<()> {
    let cache = client.cache();

    match cmd {
        PatternCommands::Store {
            original,
            healed,
            confidence,
            test_type,
            page_url,
            dom_context,
        } => {
            let stored = cache.store(NewPattern {
                key: PatternKey::new(test_type, original, page_url.unwrap_or_default()),
                healed_selector: healed.clone(),
                confidence_score: confidence,
                dom_context,
            })?;
            if format.is_structured() {
                print_structured(&stored, format);
            } else {
                if stored.healed_selector == healed {
                    print_success(&format!("Stored pattern {}", stored.id));
                } else {
                    print_message(
                        "Kept the existing pattern; it has higher confidence.",
                        format,
                    );
                }
                print_item(&PatternRow::from(&stored), format);
            }
        }

        PatternCommands::Find {
            original,
            test_type,
            page_url,
        } => match cache.find(&test_type, &original, page_url.as_deref())? {
            Some(pattern) if format.is_structured() => print_structured(&pattern, format),
            Some(pattern) => print_item(&PatternRow::from(&pattern), format),
            None if format.is_structured() => print_structured(&serde_json::Value::Null, format),
            None => print_message("No pattern found.", format),
        },

        PatternCommands::List {
            test_type,
            limit,
            offset,
        } => {
            let patterns = cache.list(test_type.as_deref(), limit, offset)?;
            if format.is_structured() {
                print_structured(&patterns, format);
            } else {
                let rows: Vec<PatternRow> = patterns.iter().map(PatternRow::from).collect();
                print_list(&rows, format);
            }
        }

        PatternCommands::Purge { id } => {
            cache.purge(&id)?;
            if format.is_structured() {
                print_structured(&serde_json::json!({ "purged": id }), format);
            } else {
                print_success(&format!("Purged pattern {}", id));
            }
        }
    }

    Ok(())
}
