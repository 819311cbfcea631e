//! Output formatting for CLI

use clap::ValueEnum;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use testmend_common::HealingStatus;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

impl OutputFormat {
    /// JSON and YAML print the full domain value instead of the display row
    pub fn is_structured(&self) -> bool {
        matches!(self, OutputFormat::Json | OutputFormat::Yaml)
    }
}

/// Trait for items that can be displayed in a table
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn new_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Serialize any value as JSON or YAML
pub fn print_structured<T: Serialize + ?Sized>(value: &T, format: OutputFormat) {
    match format {
        OutputFormat::Yaml => {
            print!("{}", serde_yaml::to_string(value).unwrap_or_default());
        }
        _ => {
            println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
        }
    }
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(T::headers());
            table.add_row(item.row());
            println!("{table}");
        }
        OutputFormat::Json | OutputFormat::Yaml => print_structured(item, format),
        OutputFormat::Plain => {
            let row = item.row();
            for (header, value) in T::headers().iter().zip(row.iter()) {
                println!("{}: {}", header, value);
            }
        }
    }
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) {
    if items.is_empty() && !format.is_structured() {
        println!("No items found.");
        return;
    }

    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(T::headers());
            for item in items {
                table.add_row(item.row());
            }
            println!("{table}");
        }
        OutputFormat::Json | OutputFormat::Yaml => print_structured(items, format),
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                let row = item.row();
                for (header, value) in T::headers().iter().zip(row.iter()) {
                    println!("{}: {}", header, value);
                }
            }
        }
    }
}

/// Print field/value pairs, as a two-column table or plain lines
pub fn print_fields(fields: &[(&str, String)], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let mut table = new_table();
            table.set_header(vec!["Field", "Value"]);
            for (field, value) in fields {
                table.add_row(vec![field.to_string(), value.clone()]);
            }
            println!("{table}");
        }
        _ => {
            for (field, value) in fields {
                println!("{}: {}", field, value);
            }
        }
    }
}

/// Print a simple message
pub fn print_message(message: &str, format: OutputFormat) {
    if format.is_structured() {
        print_structured(&serde_json::json!({ "message": message }), format);
    } else {
        println!("{}", message);
    }
}

/// Colored status label for terminal output
pub fn status_label(status: HealingStatus) -> String {
    let label = status.as_str();
    match status {
        HealingStatus::Healed => label.green().to_string(),
        HealingStatus::Failed => label.red().to_string(),
        HealingStatus::BugConfirmed => label.magenta().bold().to_string(),
        HealingStatus::Analyzing => label.cyan().to_string(),
        HealingStatus::Pending => label.yellow().to_string(),
    }
}

/// Format an optional value, `-` when absent
pub fn or_dash<T: ToString>(value: Option<T>) -> String {
    value.map_or_else(|| "-".to_string(), |v| v.to_string())
}

/// Format a confidence score
pub fn confidence(score: Option<f64>) -> String {
    or_dash(score.map(|s| format!("{:.2}", s)))
}

/// Print success message
pub fn print_success(message: &str) {
    println!("{} {}", "✅".green(), message);
}

/// Print error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "❌".red(), message.red());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_or_dash_and_confidence() {
        assert_eq!(or_dash::<String>(None), "-");
        assert_eq!(or_dash(Some(3)), "3");
        assert_eq!(confidence(Some(0.8567)), "0.86");
        assert_eq!(confidence(None), "-");
    }

    #[test]
    fn test_structured_formats() {
        assert!(OutputFormat::Json.is_structured());
        assert!(OutputFormat::Yaml.is_structured());
        assert!(!OutputFormat::Plain.is_structured());
    }
}
