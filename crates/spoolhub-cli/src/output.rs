//! Table and JSON output formatting for CLI commands.

use chrono::SecondsFormat;
use serde::Serialize;
use tabled::{Table, Tabled};

use spoolhub_entity::job::PrintJob;

/// Output format selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    #[default]
    Table,
    /// JSON output
    Json,
}

/// One row of the job table.
#[derive(Debug, Serialize, Tabled)]
pub struct JobRow {
    #[tabled(rename = "ID")]
    pub id: String,
    #[tabled(rename = "Document")]
    pub document: String,
    #[tabled(rename = "User")]
    pub user: String,
    #[tabled(rename = "Status")]
    pub status: String,
    #[tabled(rename = "Paper")]
    pub paper: String,
    #[tabled(rename = "Submitted")]
    pub submitted: String,
    #[tabled(rename = "Errors")]
    pub errors: usize,
}

impl From<&PrintJob> for JobRow {
    fn from(job: &PrintJob) -> Self {
        Self {
            id: job.id.to_string(),
            document: job.document_name.clone(),
            user: job.submitted_by.clone(),
            status: job.status.to_string(),
            paper: format!("{:?} @ {} dpi", job.settings.paper, job.settings.dpi),
            submitted: job.submitted_at.to_rfc3339_opts(SecondsFormat::Secs, true),
            errors: job.error_log.len(),
        }
    }
}

/// Print the job list in the selected format
pub fn print_jobs(jobs: &[PrintJob], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if jobs.is_empty() {
                println!("No jobs found.");
            } else {
                let rows: Vec<JobRow> = jobs.iter().map(JobRow::from).collect();
                println!("{}", Table::new(rows));
            }
        }
        OutputFormat::Json => print_json(jobs),
    }
}

/// Print a single item as pretty JSON
pub fn print_json<T: Serialize + ?Sized>(item: &T) {
    let json = serde_json::to_string_pretty(item).unwrap_or_else(|_| "null".to_string());
    println!("{}", json);
}

/// Print a success message
pub fn print_success(msg: &str) {
    println!("✓ {}", msg);
}

/// Print a warning message
pub fn print_warning(msg: &str) {
    println!("⚠ {}", msg);
}

/// Print an error message
pub fn print_error(msg: &str) {
    eprintln!("✗ {}", msg);
}

/// Print a key-value pair
pub fn print_kv(key: &str, value: &str) {
    println!("  {:<16} {}", format!("{}:", key), value);
}
