//! Print settings and paper sizes.

use serde::{Deserialize, Serialize};
use validator::Validate;

use spoolhub_core::error::{AppError, ErrorKind};
use spoolhub_core::result::AppResult;

/// Millimetres per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Supported paper sizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum PaperSize {
    A4,
    A5,
    Letter,
    Legal,
}

impl PaperSize {
    /// Physical `(width, height)` in millimetres, portrait.
    pub const fn dimensions_mm(&self) -> (f64, f64) {
        match self {
            Self::A4 => (210.0, 297.0),
            Self::A5 => (148.0, 210.0),
            Self::Letter => (215.9, 279.4),
            Self::Legal => (215.9, 355.6),
        }
    }

    /// Page size in whole pixels at the given resolution.
    pub fn pixel_size(&self, dpi: u32) -> (u32, u32) {
        let (width_mm, height_mm) = self.dimensions_mm();
        (mm_to_px(width_mm, dpi), mm_to_px(height_mm, dpi))
    }
}

impl std::str::FromStr for PaperSize {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "A4" => Ok(Self::A4),
            "A5" => Ok(Self::A5),
            "LETTER" => Ok(Self::Letter),
            "LEGAL" => Ok(Self::Legal),
            other => Err(AppError::validation(format!("Unknown paper size '{other}'"))),
        }
    }
}

fn mm_to_px(mm: f64, dpi: u32) -> u32 {
    (mm / MM_PER_INCH * f64::from(dpi)).round() as u32
}

/// Highest accepted resolution.
pub const MAX_DPI: u32 = 600;

/// Highest accepted copy count.
pub const MAX_COPIES: u32 = 999;

/// Immutable rendering parameters of a job.
#[derive(Debug, Clone, Copy, PartialEq, Validate, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintSettings {
    pub paper: PaperSize,
    #[validate(range(min = 1, max = 600))]
    pub dpi: u32,
    pub is_color: bool,
    pub is_duplex: bool,
    #[validate(range(exclusive_min = 0.0, max = 10.0))]
    pub scale: f64,
    #[validate(range(min = 1, max = 999))]
    pub copies: u32,
}

impl PrintSettings {
    /// A4 at 300 DPI, color, single-sided, one copy.
    pub const fn a4_300_dpi() -> Self {
        Self {
            paper: PaperSize::A4,
            dpi: 300,
            is_color: true,
            is_duplex: false,
            scale: 1.0,
            copies: 1,
        }
    }

    /// Check that the settings describe a printable configuration.
    pub fn ensure_valid(&self) -> AppResult<()> {
        // Range checks let NaN through.
        if !self.scale.is_finite() {
            return Err(AppError::validation(format!(
                "Scale must be a finite number, got {}",
                self.scale
            )));
        }
        self.validate().map_err(|e| {
            AppError::with_source(
                ErrorKind::Validation,
                format!("Invalid print settings: {e}"),
                e,
            )
        })
    }

    /// Page size in pixels for these settings.
    pub fn page_pixels(&self) -> (u32, u32) {
        self.paper.pixel_size(self.dpi)
    }
}

impl Default for PrintSettings {
    fn default() -> Self {
        Self::a4_300_dpi()
    }
}
