//! Job submission.

use std::path::PathBuf;

use clap::Args;

use spoolhub_core::error::AppError;
use spoolhub_core::types::JobId;
use spoolhub_entity::job::{PaperSize, PrintJob, PrintSettings};

use crate::context::Context;
use crate::output;

/// Arguments for `submit`
#[derive(Debug, Args)]
pub struct SubmitArgs {
    /// Files to print, in order
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Document name (defaults to the first file's name)
    #[arg(short, long)]
    pub name: Option<String>,

    /// Submitting user
    #[arg(short, long, env = "USER", default_value = "anonymous")]
    pub user: String,

    /// Paper size: A4, A5, LETTER or LEGAL
    #[arg(long, default_value = "A4")]
    pub paper: PaperSize,

    /// Resolution in dots per inch (1 to 600)
    #[arg(long, default_value_t = 300)]
    pub dpi: u32,

    /// Print in grayscale
    #[arg(long)]
    pub mono: bool,

    /// Print on both sides
    #[arg(long)]
    pub duplex: bool,

    /// Scale factor
    #[arg(long, default_value_t = 1.0)]
    pub scale: f64,

    /// Number of copies
    #[arg(long, default_value_t = 1)]
    pub copies: u32,
}

impl SubmitArgs {
    fn settings(&self) -> PrintSettings {
        PrintSettings {
            paper: self.paper,
            dpi: self.dpi,
            is_color: !self.mono,
            is_duplex: self.duplex,
            scale: self.scale,
            copies: self.copies,
        }
    }

    fn document_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| {
            self.files
                .first()
                .and_then(|path| path.file_name())
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| "untitled".to_string())
        })
    }
}

/// Spool the files and register the job
pub async fn execute(args: &SubmitArgs, ctx: &Context) -> Result<(), AppError> {
    let settings = args.settings();
    settings.ensure_valid()?;

    let id = JobId::new();
    let mut spooled = Vec::with_capacity(args.files.len());
    for file in &args.files {
        match ctx.store.spool_source(&id, file).await {
            Ok(path) => spooled.push(path),
            Err(e) => {
                ctx.store.remove(&id).await?;
                return Err(e);
            }
        }
    }

    let job = PrintJob::with_id(id, args.document_name(), &args.user, settings, spooled);
    if let Err(e) = ctx.store.submit(job).await {
        ctx.store.remove(&id).await?;
        return Err(e);
    }

    output::print_success(&format!("Job {id} queued ({} file(s))", args.files.len()));
    Ok(())
}
