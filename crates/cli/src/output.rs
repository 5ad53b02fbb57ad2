//! Output formatting utilities

use anyhow::Result;
use clap::ValueEnum;
use colored::Colorize;
use jdiag_lib::{Outcome, RunSummary};
use tabled::{settings::Style, Table, Tabled};

/// Output format for the run summary
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Row for the run summary table
#[derive(Tabled)]
struct SummaryRow {
    #[tabled(rename = "Pod")]
    pod: String,
    #[tabled(rename = "Container")]
    container: String,
    #[tabled(rename = "Diagnostic")]
    diagnostic: String,
    #[tabled(rename = "Outcome")]
    outcome: String,
}

/// Print the run summary in the requested format
pub fn print_summary(summary: &RunSummary, format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Table => {
            let rows: Vec<SummaryRow> = summary
                .records
                .iter()
                .map(|record| SummaryRow {
                    pod: record.pod.clone(),
                    container: record.container.clone().unwrap_or_else(|| "-".to_string()),
                    diagnostic: record
                        .kind
                        .map(|kind| kind.to_string())
                        .unwrap_or_else(|| "-".to_string()),
                    outcome: color_outcome(&record.outcome),
                })
                .collect();

            let table = Table::new(rows).with(Style::rounded()).to_string();
            println!("{}", table);
            println!(
                "\n{} targets, {} collected, {} failed",
                summary.total_targets, summary.succeeded, summary.failed
            );

            if summary.fully_succeeded() {
                print_success("all diagnostics collected");
            } else {
                print_error("some diagnostics failed");
            }
        }
    }

    Ok(())
}

/// Print a success message
pub fn print_success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

fn color_outcome(outcome: &Outcome) -> String {
    match outcome {
        Outcome::Written { path } => format!("{} {}", "saved".green(), path.display()),
        Outcome::Failed { error, message } => {
            format!("{}: {}", error.red(), message)
        }
    }
}
