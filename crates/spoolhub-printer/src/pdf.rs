//! PDF assembly from persisted page images.
//!
//! Each page image becomes one PDF page whose media box is the image size
//! converted from pixels to points at the job's DPI, with the image drawn
//! full-bleed.

use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{Document, Object, ObjectId, Stream, dictionary};

use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;
use spoolhub_entity::job::PrintSettings;

const POINTS_PER_INCH: f32 = 72.0;

/// Convert a pixel length to PDF points at `dpi`.
pub fn pixels_to_points(pixels: u32, dpi: u32) -> f32 {
    pixels as f32 * POINTS_PER_INCH / dpi as f32
}

/// Build a PDF from `pages` in order and save it to `output`.
///
/// Returns the number of pages written. Blocking; call from a blocking
/// context.
pub fn assemble(pages: &[PathBuf], settings: &PrintSettings, output: &Path) -> AppResult<u32> {
    if settings.dpi == 0 {
        return Err(AppError::validation("DPI must be greater than zero"));
    }

    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::with_capacity(pages.len());

    for page_path in pages {
        let page_id = add_page(&mut doc, pages_id, page_path, settings)?;
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc.compress();

    doc.save(output).map_err(|e| {
        AppError::with_source(
            ErrorKind::Document,
            format!("Failed to save PDF: {}", output.display()),
            e,
        )
    })?;

    Ok(count as u32)
}

fn add_page(
    doc: &mut Document,
    pages_id: ObjectId,
    page_path: &Path,
    settings: &PrintSettings,
) -> AppResult<ObjectId> {
    let decoded = image::open(page_path).map_err(|e| {
        AppError::with_source(
            ErrorKind::Render,
            format!("Failed to decode page image: {}", page_path.display()),
            e,
        )
    })?;
    let (width, height) = (decoded.width(), decoded.height());

    let (color_space, samples) = if settings.is_color {
        ("DeviceRGB", decoded.to_rgb8().into_raw())
    } else {
        ("DeviceGray", decoded.to_luma8().into_raw())
    };

    let image_id = doc.add_object(Stream::new(
        dictionary! {
            "Type" => "XObject",
            "Subtype" => "Image",
            "Width" => width as i64,
            "Height" => height as i64,
            "ColorSpace" => color_space,
            "BitsPerComponent" => 8,
        },
        samples,
    ));

    let page_width = pixels_to_points(width, settings.dpi);
    let page_height = pixels_to_points(height, settings.dpi);

    let content = Content {
        operations: vec![
            Operation::new("q", vec![]),
            Operation::new(
                "cm",
                vec![
                    page_width.into(),
                    0.into(),
                    0.into(),
                    page_height.into(),
                    0.into(),
                    0.into(),
                ],
            ),
            Operation::new("Do", vec!["Im0".into()]),
            Operation::new("Q", vec![]),
        ],
    };
    let encoded = content.encode().map_err(|e| {
        AppError::with_source(ErrorKind::Document, "Failed to encode page content", e)
    })?;
    let content_id = doc.add_object(Stream::new(dictionary! {}, encoded));

    Ok(doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "MediaBox" => vec![0.into(), 0.into(), page_width.into(), page_height.into()],
        "Contents" => content_id,
        "Resources" => dictionary! {
            "XObject" => dictionary! {
                "Im0" => image_id,
            },
        },
    }))
}
