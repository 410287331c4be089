//! Single-glyph rasterization into fixed-size grayscale cells.

use std::path::Path;

use fontdue::{Font, FontSettings};

use super::font::{FontIdentity, FontSpec};
use super::FontError;

/// Smallest allowed cell edge in pixels.
pub const MIN_CELL_DIM: u32 = 10;

/// Dimensions of one glyph cell in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CellSize {
    pub width: u32,
    pub height: u32,
}

impl CellSize {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn area(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Height over width.
    pub fn aspect(&self) -> f64 {
        self.height as f64 / self.width as f64
    }
}

/// Renders single characters of one font into grayscale cells.
///
/// Output bitmaps are row-major, `cell.width * cell.height` bytes,
/// 0 = black ink and 255 = white background. Implementations must be
/// deterministic: the same font, size and character always produce the same
/// bytes, otherwise cached calibrations would not match fresh ones.
pub trait GlyphRasterizer: Send + Sync {
    /// Identity of the font being rendered.
    fn identity(&self) -> &FontIdentity;

    /// Cell size derived from the font metrics, at least
    /// [`MIN_CELL_DIM`] on both axes.
    fn cell_size(&self) -> CellSize;

    /// Render `ch` into a cell of the given size.
    fn rasterize(&self, ch: char, cell: CellSize) -> Vec<u8>;
}

/// Ink coverage of a rendered cell: mean of `1 - gray / 255`.
pub fn ink_density(bitmap: &[u8]) -> f64 {
    if bitmap.is_empty() {
        return 0.0;
    }
    let sum: f64 = bitmap.iter().map(|&g| 1.0 - g as f64 / 255.0).sum();
    sum / bitmap.len() as f64
}

/// [`GlyphRasterizer`] backed by a TrueType/OpenType font via fontdue.
pub struct FontRasterizer {
    font: Font,
    identity: FontIdentity,
    px: f32,
    ascent: f32,
    descent: f32,
}

impl FontRasterizer {
    /// Parse a font from memory. `family` overrides the name embedded in
    /// the font file.
    pub fn from_bytes(
        bytes: &[u8],
        family: Option<&str>,
        point_size: f32,
    ) -> Result<Self, FontError> {
        let font = Font::from_bytes(bytes, FontSettings::default())
            .map_err(|e| FontError::Parse(e.to_string()))?;

        let family = family
            .map(str::to_string)
            .or_else(|| font.name().map(str::to_string))
            .unwrap_or_else(|| "unknown".to_string());
        let identity = FontIdentity::new(family, point_size);
        let px = identity.pixel_size();

        let (ascent, descent) = match font.horizontal_line_metrics(px) {
            Some(lm) => (lm.ascent, lm.descent),
            None => {
                // No hhea data: approximate from the tallest reference glyphs.
                let m = font.metrics('M', px);
                let g = font.metrics('g', px);
                ((m.height as i32 + m.ymin) as f32, g.ymin.min(0) as f32)
            }
        };
        if !ascent.is_finite() || !descent.is_finite() {
            return Err(FontError::MissingMetrics(identity.family().to_string()));
        }

        Ok(Self {
            font,
            identity,
            px,
            ascent,
            descent,
        })
    }

    /// Load a font file from disk.
    pub fn from_file(
        path: &Path,
        family: Option<&str>,
        point_size: f32,
    ) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match Self::from_bytes(&bytes, family, point_size) {
            Err(FontError::Parse(msg)) => Err(FontError::Parse(format!(
                "{}: {}",
                path.display(),
                msg
            ))),
            other => other,
        }
    }

    pub fn from_spec(spec: &FontSpec) -> Result<Self, FontError> {
        Self::from_file(&spec.path, spec.family.as_deref(), spec.point_size)
    }

    /// Distance from the cell top to the baseline.
    fn baseline(&self, cell: CellSize) -> i32 {
        let y = cell.height as i32 - self.descent.abs().round() as i32;
        y.clamp(0, cell.height as i32)
    }
}

impl GlyphRasterizer for FontRasterizer {
    fn identity(&self) -> &FontIdentity {
        &self.identity
    }

    fn cell_size(&self) -> CellSize {
        let advance = self.font.metrics('M', self.px).advance_width;
        let line_height = self.ascent - self.descent;
        CellSize::new(
            (advance.round() as u32).max(MIN_CELL_DIM),
            (line_height.ceil() as u32).max(MIN_CELL_DIM),
        )
    }

    fn rasterize(&self, ch: char, cell: CellSize) -> Vec<u8> {
        let mut out = vec![255u8; cell.area()];
        if self.font.lookup_glyph_index(ch) == 0 && ch != ' ' {
            log::debug!("'{}' has no glyph in {}", ch, self.identity);
        }

        let (metrics, coverage) = self.font.rasterize(ch, self.px);
        let baseline = self.baseline(cell);
        // fontdue's ymin is the offset of the bitmap bottom from the baseline
        let top = baseline - (metrics.ymin + metrics.height as i32);
        let left = metrics.xmin;

        for gy in 0..metrics.height {
            let y = top + gy as i32;
            if y < 0 || y >= cell.height as i32 {
                continue;
            }
            for gx in 0..metrics.width {
                let x = left + gx as i32;
                if x < 0 || x >= cell.width as i32 {
                    continue;
                }
                let ink = coverage[gy * metrics.width + gx];
                let idx = y as usize * cell.width as usize + x as usize;
                out[idx] = out[idx].min(255 - ink);
            }
        }
        out
    }
}
