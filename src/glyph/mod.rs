//! Glyph rasterization and density calibration.
//!
//! 1. **Rasterization** - render one character into a fixed-size cell
//! 2. **Calibration** - measure ink coverage of every printable glyph and
//!    sort them into a darkness lookup table with packed bitmaps
//! 3. **Caching** - keep calibrations in memory and on disk, keyed by font
//!    identity and tool version

mod cache;
mod calibrator;
mod font;
mod rasterizer;

use std::path::PathBuf;

pub use cache::{default_dir as default_cache_dir, CacheRecord, CalibrationCache, TOOL_VERSION};
pub use calibrator::{
    calibrate, measure_glyphs, Calibration, GlyphSample, ASCII_COUNT, ASCII_MAX, ASCII_MIN,
};
pub use font::{find_system_font, FontIdentity, FontSpec, DEFAULT_POINT_SIZE, SCREEN_DPI};
pub use rasterizer::{ink_density, CellSize, FontRasterizer, GlyphRasterizer, MIN_CELL_DIM};

/// Errors loading or parsing a font.
#[derive(Debug, thiserror::Error)]
pub enum FontError {
    #[error("Failed to read font file '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse font: {0}")]
    Parse(String),

    #[error("Font '{0}' has no usable line metrics")]
    MissingMetrics(String),

    #[error("No font configured and no system monospace font found")]
    NotFound,
}

/// Structural invariant violations of a calibration.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CalibrationError {
    #[error("LUT has {actual} glyphs, expected {expected}")]
    LutLength { expected: usize, actual: usize },

    #[error("{widths} widths and {heights} heights, expected {expected} of each")]
    DimensionCount {
        expected: usize,
        widths: usize,
        heights: usize,
    },

    #[error("Glyph code {0} is not printable ASCII")]
    NonPrintable(u8),

    #[error("Glyph '{0}' appears more than once in the LUT")]
    DuplicateGlyph(char),

    #[error(
        "Glyph {index} is {width}x{height}, expected {expected_width}x{expected_height}"
    )]
    InconsistentDimensions {
        index: usize,
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    #[error("Glyph cells have zero area")]
    EmptyCell,

    #[error("Glyph cells of {width}x{height} are too large")]
    CellTooLarge { width: u32, height: u32 },

    #[error("Pixmaps hold {actual} bytes, expected {expected}")]
    PixmapLength { expected: usize, actual: usize },

    #[error("Bitmap for '{character}' has {actual} bytes, expected {expected}")]
    BitmapSize {
        character: char,
        expected: usize,
        actual: usize,
    },

    #[error("Invalid cell aspect ratio {0}")]
    InvalidAspect(f64),
}

/// Errors reading or writing cached calibrations.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed cache record: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid cache record: {0}")]
    Invalid(String),

    #[error("Cache record rejected: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Cache record written by version {found}, expected {expected}")]
    VersionMismatch { found: String, expected: String },

    #[error("Cache record belongs to font {found}, expected {expected}")]
    FontMismatch { found: String, expected: String },

    #[error("Cache has no directory")]
    Disabled,
}
