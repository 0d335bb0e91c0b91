//! Bitmap glyph rasterization.
//!
//! Glyphs come from the embedded 8x8 `font8x8` tables and are scaled by
//! nearest-neighbour sampling into an `advance x font_px` cell.

use font8x8::{BASIC_FONTS, BLOCK_FONTS, BOX_FONTS, LATIN_FONTS, UnicodeFonts};
use image::{Rgba, RgbaImage};

use crate::layout::TextMetrics;

/// Ink colour for text.
pub const INK: Rgba<u8> = Rgba([0, 0, 0, 255]);

/// Paper colour.
pub const PAPER: Rgba<u8> = Rgba([255, 255, 255, 255]);

/// Rows and columns of a source glyph bitmap.
const GLYPH_SIZE: u32 = 8;

/// Look up the bitmap for `ch`, falling back to `?` for unknown characters.
fn glyph_for(ch: char) -> [u8; 8] {
    BASIC_FONTS
        .get(ch)
        .or_else(|| LATIN_FONTS.get(ch))
        .or_else(|| BOX_FONTS.get(ch))
        .or_else(|| BLOCK_FONTS.get(ch))
        .or_else(|| BASIC_FONTS.get('?'))
        .unwrap_or([0; 8])
}

/// Draw `text` with its first cell's top-left corner at `(x, top)`.
///
/// Pixels that fall outside the image are clipped.
pub fn draw_text(image: &mut RgbaImage, text: &str, x: u32, top: u32, metrics: &TextMetrics) {
    let cell_width = metrics.advance;
    let cell_height = metrics.font_px;

    for (index, ch) in text.chars().enumerate() {
        if ch == ' ' {
            continue;
        }
        let origin_x = x + index as u32 * cell_width;
        if origin_x >= image.width() {
            break;
        }
        draw_glyph(image, glyph_for(ch), origin_x, top, cell_width, cell_height);
    }
}

fn draw_glyph(
    image: &mut RgbaImage,
    bitmap: [u8; 8],
    origin_x: u32,
    origin_y: u32,
    cell_width: u32,
    cell_height: u32,
) {
    let (width, height) = image.dimensions();

    for dy in 0..cell_height {
        let py = origin_y + dy;
        if py >= height {
            break;
        }
        let row = bitmap[(dy * GLYPH_SIZE / cell_height) as usize];
        if row == 0 {
            continue;
        }
        for dx in 0..cell_width {
            let px = origin_x + dx;
            if px >= width {
                break;
            }
            // Bit 0 is the leftmost pixel of the row.
            let column = dx * GLYPH_SIZE / cell_width;
            if row & (1 << column) != 0 {
                image.put_pixel(px, py, INK);
            }
        }
    }
}
