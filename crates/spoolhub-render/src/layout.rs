//! Text layout: page geometry, monospace metrics, word wrap, pagination.
//!
//! Everything here is integer pixel arithmetic so that the same text and
//! settings always produce the same pages.

use spoolhub_core::error::AppError;
use spoolhub_core::result::AppResult;
use spoolhub_entity::job::PrintSettings;

/// Points per inch.
const POINTS_PER_INCH: u32 = 72;

/// Largest page canvas, in pixels, a renderer may allocate (256 MiB of RGBA).
pub const MAX_PAGE_PIXELS: u64 = 64 * 1024 * 1024;

/// Monospace font metrics in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextMetrics {
    /// Nominal font size (em height).
    pub font_px: u32,
    /// Horizontal advance of every glyph.
    pub advance: u32,
    /// Distance between consecutive baselines.
    pub line_height: u32,
    /// Distance from a line's top to its baseline.
    pub ascent: u32,
}

impl TextMetrics {
    /// Metrics for a `base_point_size` font at `dpi`.
    pub fn for_dpi(base_point_size: u32, dpi: u32) -> Self {
        let font_px = (base_point_size.saturating_mul(dpi) / POINTS_PER_INCH).max(1);
        Self {
            font_px,
            advance: (font_px * 3 / 5).max(1),
            line_height: (font_px * 6 / 5).max(1),
            ascent: (font_px * 7 / 8).max(1),
        }
    }

    /// Rendered width of `text` in pixels.
    pub fn text_width(&self, text: &str) -> u32 {
        text.chars().count() as u32 * self.advance
    }
}

/// Pixel dimensions of a page and its printable area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageGeometry {
    pub width: u32,
    pub height: u32,
    /// One inch, applied on every side.
    pub margin: u32,
    pub content_width: u32,
    pub content_height: u32,
    pub metrics: TextMetrics,
}

impl PageGeometry {
    /// Compute the geometry for `settings`.
    ///
    /// Fails when the resolution is zero, the page is larger than
    /// [`MAX_PAGE_PIXELS`], or the printable area cannot hold a single line
    /// of text. Nothing is allocated here.
    pub fn new(settings: &PrintSettings, base_point_size: u32) -> AppResult<Self> {
        let dpi = settings.dpi;
        if dpi == 0 {
            return Err(AppError::validation("DPI must be greater than zero"));
        }

        let (width, height) = settings.page_pixels();
        let pixels = u64::from(width) * u64::from(height);
        if pixels > MAX_PAGE_PIXELS {
            return Err(AppError::validation(format!(
                "Page of {width}x{height}px at {dpi} dpi exceeds the {MAX_PAGE_PIXELS} pixel limit"
            )));
        }
        let margin = dpi;
        let content_width = width.saturating_sub(margin.saturating_mul(2));
        let content_height = height.saturating_sub(margin.saturating_mul(2));
        let metrics = TextMetrics::for_dpi(base_point_size, dpi);

        if content_width < metrics.advance || content_height < metrics.line_height {
            return Err(AppError::validation(format!(
                "Printable area {content_width}x{content_height}px is too small for \
                 {}px text on {:?} paper",
                metrics.font_px, settings.paper
            )));
        }

        Ok(Self {
            width,
            height,
            margin,
            content_width,
            content_height,
            metrics,
        })
    }

    /// Number of wrapped lines that fit on one page (always at least one).
    pub fn lines_per_page(&self) -> usize {
        (self.content_height / self.metrics.line_height) as usize
    }
}

/// Greedy word wrap at word boundaries.
///
/// A line that already fits is kept unchanged, which makes wrapping
/// idempotent. A single word wider than `max_width` is kept whole on its
/// own line.
pub fn word_wrap(lines: &[String], metrics: &TextMetrics, max_width: u32) -> Vec<String> {
    let mut wrapped = Vec::with_capacity(lines.len());

    for line in lines {
        if metrics.text_width(line) <= max_width {
            wrapped.push(line.clone());
            continue;
        }

        let mut current = String::new();
        for word in line.split(' ') {
            if current.is_empty() {
                current.push_str(word);
                continue;
            }
            let candidate = metrics.text_width(&current) + metrics.advance + metrics.text_width(word);
            if candidate > max_width {
                wrapped.push(std::mem::take(&mut current));
                current.push_str(word);
            } else {
                current.push(' ');
                current.push_str(word);
            }
        }
        if !current.is_empty() {
            wrapped.push(current);
        }
    }

    wrapped
}

/// Wrapped text split into fixed-size pages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pagination {
    lines: Vec<String>,
    lines_per_page: usize,
}

impl Pagination {
    /// Wrap `lines` for `geometry` and split them into pages.
    pub fn new(lines: &[String], geometry: &PageGeometry) -> Self {
        Self {
            lines: word_wrap(lines, &geometry.metrics, geometry.content_width),
            lines_per_page: geometry.lines_per_page().max(1),
        }
    }

    /// Total wrapped lines.
    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    pub fn lines_per_page(&self) -> usize {
        self.lines_per_page
    }

    /// Number of pages; zero for an empty document.
    pub fn total_pages(&self) -> u32 {
        self.lines.len().div_ceil(self.lines_per_page) as u32
    }

    /// Lines of the 0-based `page_index`, or `None` past the end.
    pub fn page_lines(&self, page_index: u32) -> Option<&[String]> {
        let start = (page_index as usize).checked_mul(self.lines_per_page)?;
        if start >= self.lines.len() {
            return None;
        }
        let end = (start + self.lines_per_page).min(self.lines.len());
        Some(&self.lines[start..end])
    }
}
