//! Page sources supply the raw content of a submitted document.

use std::any::Any;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;

/// Tab stops are expanded to this many columns.
const TAB_WIDTH: usize = 4;

/// Kind of content a source supplies; renderers are specialized per kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// Plain UTF-8 text, one logical line per input line.
    Text,
    /// A raster image file.
    Image,
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Image => write!(f, "image"),
        }
    }
}

/// Supplies the content of one input file to a renderer.
pub trait PageSource: Send + Sync + fmt::Debug {
    /// The kind of content this source supplies.
    fn content_type(&self) -> ContentType;

    /// The file this source reads from.
    fn path(&self) -> &Path;

    /// Access to the concrete type, for renderers that need it.
    fn as_any(&self) -> &dyn Any;
}

/// Open the page source matching a file's extension.
///
/// Known raster image extensions produce an [`ImagePageSource`]; anything
/// else is treated as plain text.
pub fn open_source(path: &Path) -> AppResult<Arc<dyn PageSource>> {
    let is_image = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            matches!(
                ext.to_ascii_lowercase().as_str(),
                "png" | "jpg" | "jpeg" | "gif" | "bmp" | "webp" | "tif" | "tiff"
            )
        })
        .unwrap_or(false);

    if is_image {
        Ok(Arc::new(ImagePageSource::open(path)?))
    } else {
        Ok(Arc::new(TextPageSource::open(path)?))
    }
}

/// Fail unless `path` is an existing, openable regular file.
fn ensure_readable(path: &Path) -> AppResult<()> {
    let meta = std::fs::metadata(path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Source file is not readable: {}", path.display()),
            e,
        )
    })?;
    if !meta.is_file() {
        return Err(AppError::storage(format!(
            "Source path is not a regular file: {}",
            path.display()
        )));
    }
    std::fs::File::open(path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Storage,
            format!("Source file is not readable: {}", path.display()),
            e,
        )
    })?;
    Ok(())
}

/// A plain-text document. Lines are read on first use and cached.
#[derive(Debug)]
pub struct TextPageSource {
    path: PathBuf,
    lines: OnceLock<Vec<String>>,
}

impl TextPageSource {
    /// Open a text source, failing if the file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        ensure_readable(&path)?;
        Ok(Self {
            path,
            lines: OnceLock::new(),
        })
    }

    /// All logical lines of the file, tabs expanded.
    pub fn lines(&self) -> AppResult<&[String]> {
        if let Some(lines) = self.lines.get() {
            return Ok(lines);
        }

        let text = std::fs::read_to_string(&self.path).map_err(|e| {
            AppError::with_source(
                ErrorKind::Storage,
                format!("Failed to read text source: {}", self.path.display()),
                e,
            )
        })?;
        let loaded: Vec<String> = text.lines().map(expand_tabs).collect();
        tracing::trace!(path = %self.path.display(), lines = loaded.len(), "Loaded text source");

        Ok(self.lines.get_or_init(|| loaded))
    }
}

impl PageSource for TextPageSource {
    fn content_type(&self) -> ContentType {
        ContentType::Text
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + TAB_WIDTH);
    let mut column = 0usize;
    for ch in line.chars() {
        if ch == '\t' {
            let pad = TAB_WIDTH - column % TAB_WIDTH;
            out.extend(std::iter::repeat_n(' ', pad));
            column += pad;
        } else {
            out.push(ch);
            column += 1;
        }
    }
    out
}

/// A raster image document.
///
/// No renderer in this crate accepts image sources; they exist so that
/// submitting one fails with a clear content error instead of being
/// misread as text.
#[derive(Debug)]
pub struct ImagePageSource {
    path: PathBuf,
}

impl ImagePageSource {
    /// Open an image source, failing if the file cannot be read.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        ensure_readable(&path)?;
        Ok(Self { path })
    }
}

impl PageSource for ImagePageSource {
    fn content_type(&self) -> ContentType {
        ContentType::Image
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}
