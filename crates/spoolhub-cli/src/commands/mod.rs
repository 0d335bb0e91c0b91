//! CLI command definitions and dispatch.

pub mod job;
pub mod submit;
pub mod work;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use spoolhub_core::error::AppError;

use crate::context::{self, Context};
use crate::output::OutputFormat;

/// SpoolHub: a print spooler with preview and confirmation
#[derive(Debug, Parser)]
#[command(name = "spoolhub", version, about, long_about = None)]
pub struct Cli {
    /// Path to a configuration file (overrides the config/ directory)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Configuration environment, selects config/{env}.toml
    #[arg(short, long, env = "SPOOLHUB_ENV", default_value = "development")]
    pub env: String,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Submit files as a new print job
    Submit(submit::SubmitArgs),
    /// List all jobs, oldest first
    List,
    /// Show one job in detail
    Show(job::JobIdArg),
    /// Cancel a queued or printing job
    Cancel(job::JobIdArg),
    /// Requeue a failed job
    Retry(job::JobIdArg),
    /// Confirm a previewed job for printing
    Confirm(job::JobIdArg),
    /// Delete a job and all of its files
    Remove(job::JobIdArg),
    /// Run the print pipeline
    Work(work::WorkArgs),
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(&self) -> Result<(), AppError> {
        let config = context::load_config(self.config.as_deref(), &self.env)?;
        let ctx = Context::open(config).await?;

        match &self.command {
            Commands::Submit(args) => submit::execute(args, &ctx).await,
            Commands::List => job::list(&ctx, self.format),
            Commands::Show(args) => job::show(args, &ctx, self.format).await,
            Commands::Cancel(args) => job::cancel(args, &ctx).await,
            Commands::Retry(args) => job::retry(args, &ctx).await,
            Commands::Confirm(args) => job::confirm(args, &ctx).await,
            Commands::Remove(args) => job::remove(args, &ctx).await,
            Commands::Work(args) => work::execute(args, &ctx).await,
        }
    }
}
