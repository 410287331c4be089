//! Preview compositing from calibrated glyph bitmaps.
//!
//! Each glyph index paints its bitmap into a `cell.width x cell.height`
//! block of the output raster. The glyph cells are first resampled
//! (nearest neighbour) to the requested output cell once, then copied.

use image::imageops::{self, FilterType};
use image::GrayImage;

use super::grid::Grid;
use crate::glyph::{Calibration, CellSize};

/// Glyph bitmaps of one calibration resampled to an output cell size.
#[derive(Debug, Clone)]
pub struct GlyphAtlas {
    cell: CellSize,
    glyphs: Vec<Vec<u8>>,
}

impl GlyphAtlas {
    /// Resample every glyph of `calibration` to `cell`.
    pub fn new(calibration: &Calibration, cell: CellSize) -> Self {
        let source = calibration.cell_size();
        let glyphs = (0..calibration.glyph_count())
            .map(|index| resample(calibration.glyph_bitmap(index), source, cell))
            .collect();
        Self { cell, glyphs }
    }

    pub fn cell(&self) -> CellSize {
        self.cell
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    /// Bitmap for LUT index `index`, clamped to the last glyph.
    pub fn glyph(&self, index: u8) -> &[u8] {
        let last = self.glyphs.len().saturating_sub(1);
        &self.glyphs[(index as usize).min(last)]
    }
}

/// Nearest-neighbour resample of a row-major bitmap.
fn resample(src: &[u8], from: CellSize, to: CellSize) -> Vec<u8> {
    if from == to {
        return src.to_vec();
    }
    match GrayImage::from_raw(from.width, from.height, src.to_vec()) {
        Some(cell) => imageops::resize(&cell, to.width, to.height, FilterType::Nearest).into_raw(),
        None => vec![255u8; to.area()],
    }
}

/// Paint one grid row of glyphs into `band`, a slice covering
/// `cell.height` full raster rows.
pub fn draw_glyph_row(indices: &[u8], atlas: &GlyphAtlas, band: &mut [u8]) {
    let cell_w = atlas.cell.width as usize;
    let stride = indices.len() * cell_w;
    for (col, &index) in indices.iter().enumerate() {
        let glyph = atlas.glyph(index);
        for (gy, glyph_row) in glyph.chunks_exact(cell_w).enumerate() {
            let start = gy * stride + col * cell_w;
            band[start..start + cell_w].copy_from_slice(glyph_row);
        }
    }
}

/// Composite a grid of glyph indices into a grayscale preview.
///
/// # Arguments
/// * `indices` - LUT indices, one per cell
/// * `calibration` - Source of the glyph bitmaps
/// * `cell` - Output size of one glyph cell
///
/// # Returns
/// A `(columns * cell.width) x (rows * cell.height)` image, white where no
/// ink was drawn.
pub fn draw_glyph_bitmaps(indices: &Grid<u8>, calibration: &Calibration, cell: CellSize) -> GrayImage {
    let atlas = GlyphAtlas::new(calibration, cell);
    draw_with_atlas(indices, &atlas)
}

/// Same as [`draw_glyph_bitmaps`] with a prepared atlas.
pub fn draw_with_atlas(indices: &Grid<u8>, atlas: &GlyphAtlas) -> GrayImage {
    let (width, height) = preview_size(indices, atlas.cell);
    let mut raw = vec![255u8; width as usize * height as usize];
    if raw.is_empty() || atlas.is_empty() {
        return GrayImage::from_raw(width, height, raw).unwrap_or_else(|| GrayImage::new(0, 0));
    }

    let band_len = width as usize * atlas.cell.height as usize;
    for (row, band) in raw.chunks_mut(band_len).enumerate() {
        draw_glyph_row(indices.row(row), atlas, band);
    }
    GrayImage::from_raw(width, height, raw).unwrap_or_else(|| GrayImage::new(0, 0))
}

/// Pixel size of the composited preview.
pub fn preview_size(indices: &Grid<u8>, cell: CellSize) -> (u32, u32) {
    (
        indices.width() as u32 * cell.width,
        indices.height() as u32 * cell.height,
    )
}
