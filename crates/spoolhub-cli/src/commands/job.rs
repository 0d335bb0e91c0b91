//! Job inspection and operator actions.

use clap::Args;

use spoolhub_core::error::AppError;
use spoolhub_core::types::JobId;
use spoolhub_entity::job::PrintJob;

use crate::context::Context;
use crate::output::{self, OutputFormat};

/// A single job id argument
#[derive(Debug, Args)]
pub struct JobIdArg {
    /// Job id
    pub id: JobId,
}

fn require(ctx: &Context, id: &JobId) -> Result<PrintJob, AppError> {
    ctx.store
        .get(id)
        .ok_or_else(|| AppError::not_found(format!("Job {id} not found")))
}

/// List all jobs
pub fn list(ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    output::print_jobs(&ctx.store.list_jobs(), format);
    Ok(())
}

/// Show one job with its pages and output
pub async fn show(args: &JobIdArg, ctx: &Context, format: OutputFormat) -> Result<(), AppError> {
    let job = require(ctx, &args.id)?;

    if format == OutputFormat::Json {
        output::print_json(&job);
        return Ok(());
    }

    let pages = ctx.printer.rendered_pages(&job.id).await?;
    let document = ctx.printer.output_path(&job.id);

    println!("Job {}:", job.id);
    output::print_kv("Document", &job.document_name);
    output::print_kv("User", &job.submitted_by);
    output::print_kv("Status", job.status.as_str());
    output::print_kv("Submitted", &job.submitted_at.to_rfc3339());
    output::print_kv(
        "Paper",
        &format!("{:?} @ {} dpi", job.settings.paper, job.settings.dpi),
    );
    output::print_kv("Color", &job.settings.is_color.to_string());
    output::print_kv("Copies", &job.settings.copies.to_string());
    for path in &job.source_paths {
        output::print_kv("Source", &path.display().to_string());
    }
    output::print_kv("Rendered pages", &pages.len().to_string());
    if document.exists() {
        output::print_kv("Output", &document.display().to_string());
    }
    for entry in &job.error_log {
        output::print_kv("Error", entry);
    }
    Ok(())
}

/// Report the outcome of an operator action
fn report(ctx: &Context, id: &JobId, action: &str, applied: bool) -> Result<(), AppError> {
    let job = require(ctx, id)?;
    if applied {
        output::print_success(&format!("Job {id} {action}; now {}", job.status));
    } else {
        output::print_warning(&format!(
            "Job {id} is {}; nothing to {action}",
            job.status
        ));
    }
    Ok(())
}

/// Cancel a job
pub async fn cancel(args: &JobIdArg, ctx: &Context) -> Result<(), AppError> {
    require(ctx, &args.id)?;
    let applied = ctx.store.cancel(&args.id).await?;
    report(ctx, &args.id, "cancel", applied)
}

/// Retry a failed job
pub async fn retry(args: &JobIdArg, ctx: &Context) -> Result<(), AppError> {
    require(ctx, &args.id)?;
    let applied = ctx.store.retry(&args.id).await?;
    report(ctx, &args.id, "retry", applied)
}

/// Confirm a previewed job
pub async fn confirm(args: &JobIdArg, ctx: &Context) -> Result<(), AppError> {
    require(ctx, &args.id)?;
    let applied = ctx.store.confirm_print(&args.id).await?;
    report(ctx, &args.id, "confirm", applied)
}

/// Remove a job and its output
pub async fn remove(args: &JobIdArg, ctx: &Context) -> Result<(), AppError> {
    let existed = ctx.store.remove(&args.id).await?;
    let had_output = ctx.printer.purge(&args.id).await?;
    if existed || had_output {
        output::print_success(&format!("Job {} removed", args.id));
        Ok(())
    } else {
        Err(AppError::not_found(format!("Job {} not found", args.id)))
    }
}
