//! Page renderers: rasterize one page of a source under given settings.

use std::fmt;

use image::RgbaImage;

use spoolhub_core::config::RenderConfig;
use spoolhub_core::error::AppError;
use spoolhub_core::result::AppResult;
use spoolhub_entity::job::PrintSettings;

use crate::glyph::{self, PAPER};
use crate::layout::{PageGeometry, Pagination};
use crate::source::{ContentType, PageSource, TextPageSource};

/// Computes page counts and rasterizes single pages.
///
/// Implementations are specialized per [`ContentType`] and must reject
/// sources they do not understand with an `UnsupportedContent` error.
pub trait PageRenderer: Send + Sync + fmt::Debug {
    /// Whether this renderer can draw sources of `content`.
    fn supports(&self, content: ContentType) -> bool;

    /// Number of pages `source` occupies under `settings`.
    fn total_pages(&self, source: &dyn PageSource, settings: &PrintSettings) -> AppResult<u32>;

    /// Rasterize the 0-based `page_index`.
    ///
    /// An index past the end of the content yields a blank page of the
    /// correct size rather than an error.
    fn render(
        &self,
        source: &dyn PageSource,
        page_index: u32,
        settings: &PrintSettings,
    ) -> AppResult<RgbaImage>;
}

/// Monospaced plain-text renderer with one-inch margins and a page footer.
#[derive(Debug, Clone)]
pub struct SimpleTextRenderer {
    base_point_size: u32,
}

impl SimpleTextRenderer {
    /// Create a renderer from configuration.
    pub fn new(config: &RenderConfig) -> Self {
        Self {
            base_point_size: config.base_point_size,
        }
    }

    fn text_source<'a>(&self, source: &'a dyn PageSource) -> AppResult<&'a TextPageSource> {
        source
            .as_any()
            .downcast_ref::<TextPageSource>()
            .ok_or_else(|| {
                AppError::unsupported_content(format!(
                    "SimpleTextRenderer only supports text sources, got {} source {}",
                    source.content_type(),
                    source.path().display()
                ))
            })
    }

    /// Lay out the whole source for `settings`.
    pub fn paginate(
        &self,
        source: &dyn PageSource,
        settings: &PrintSettings,
    ) -> AppResult<(PageGeometry, Pagination)> {
        let text = self.text_source(source)?;
        let geometry = PageGeometry::new(settings, self.base_point_size)?;
        let pagination = Pagination::new(text.lines()?, &geometry);
        Ok((geometry, pagination))
    }
}

impl Default for SimpleTextRenderer {
    fn default() -> Self {
        Self::new(&RenderConfig::default())
    }
}

impl PageRenderer for SimpleTextRenderer {
    fn supports(&self, content: ContentType) -> bool {
        content == ContentType::Text
    }

    fn total_pages(&self, source: &dyn PageSource, settings: &PrintSettings) -> AppResult<u32> {
        let (_, pagination) = self.paginate(source, settings)?;
        Ok(pagination.total_pages())
    }

    fn render(
        &self,
        source: &dyn PageSource,
        page_index: u32,
        settings: &PrintSettings,
    ) -> AppResult<RgbaImage> {
        let (geometry, pagination) = self.paginate(source, settings)?;
        let metrics = geometry.metrics;
        let mut page = RgbaImage::from_pixel(geometry.width, geometry.height, PAPER);

        let Some(lines) = pagination.page_lines(page_index) else {
            tracing::debug!(
                page_index,
                total_pages = pagination.total_pages(),
                "Requested page is past the end of the content, rendering blank page"
            );
            return Ok(page);
        };

        for (row, line) in lines.iter().enumerate() {
            let top = geometry.margin + row as u32 * metrics.line_height;
            glyph::draw_text(&mut page, line, geometry.margin, top, &metrics);
        }

        let footer = format!("Page {} of {}", page_index + 1, pagination.total_pages());
        let footer_x = geometry.width.saturating_sub(metrics.text_width(&footer)) / 2;
        let footer_baseline = geometry.height - geometry.margin / 2;
        let footer_top = footer_baseline.saturating_sub(metrics.ascent);
        glyph::draw_text(&mut page, &footer, footer_x, footer_top, &metrics);

        Ok(page)
    }
}
