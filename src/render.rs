//! Font-rendered preview of text lines.
//!
//! The glyph-bitmap preview reuses calibrated cells; this renderer instead
//! draws each character through a [`GlyphRasterizer`], so it also handles
//! characters outside the calibrated set.

use std::collections::HashMap;

use image::GrayImage;

use crate::glyph::{CellSize, GlyphRasterizer, MIN_CELL_DIM};

/// Draws lines of text onto a white raster, one cell per character.
pub struct TextRenderer<'a> {
    rasterizer: &'a dyn GlyphRasterizer,
    cell: CellSize,
}

impl<'a> TextRenderer<'a> {
    pub fn new(rasterizer: &'a dyn GlyphRasterizer) -> Self {
        let cell = rasterizer.cell_size();
        Self {
            rasterizer,
            cell: CellSize::new(cell.width.max(MIN_CELL_DIM), cell.height.max(MIN_CELL_DIM)),
        }
    }

    pub fn cell_size(&self) -> CellSize {
        self.cell
    }

    /// Render `lines` top to bottom. The raster is as wide as the longest
    /// line; shorter lines leave white space on the right.
    pub fn render<S: AsRef<str>>(&self, lines: &[S]) -> GrayImage {
        let columns = lines
            .iter()
            .map(|l| l.as_ref().chars().count())
            .max()
            .unwrap_or(0);
        let width = columns as u32 * self.cell.width;
        let height = lines.len() as u32 * self.cell.height;
        let mut img = GrayImage::from_pixel(width, height, image::Luma([255]));

        let mut glyphs: HashMap<char, Vec<u8>> = HashMap::new();
        for (row, line) in lines.iter().enumerate() {
            for (col, ch) in line.as_ref().chars().enumerate() {
                if ch == ' ' {
                    continue;
                }
                let bitmap = glyphs
                    .entry(ch)
                    .or_insert_with(|| self.rasterizer.rasterize(ch, self.cell));
                self.blit(&mut img, bitmap, col as u32 * self.cell.width, row as u32 * self.cell.height);
            }
        }
        img
    }

    fn blit(&self, img: &mut GrayImage, bitmap: &[u8], x0: u32, y0: u32) {
        let w = self.cell.width as usize;
        for (gy, row) in bitmap.chunks_exact(w).enumerate().take(self.cell.height as usize) {
            for (gx, &value) in row.iter().enumerate() {
                img.put_pixel(x0 + gx as u32, y0 + gy as u32, image::Luma([value]));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::glyph::FontIdentity;

    /// Draws a full black cell for every character.
    struct InkRasterizer {
        identity: FontIdentity,
    }

    impl GlyphRasterizer for InkRasterizer {
        fn identity(&self) -> &FontIdentity {
            &self.identity
        }

        fn cell_size(&self) -> CellSize {
            CellSize::new(10, 12)
        }

        fn rasterize(&self, _ch: char, cell: CellSize) -> Vec<u8> {
            vec![0; cell.area()]
        }
    }

    #[test]
    fn test_render_layout() {
        let rasterizer = InkRasterizer {
            identity: FontIdentity::new("Ink", 12.0),
        };
        let renderer = TextRenderer::new(&rasterizer);
        let img = renderer.render(&["a b", "c"]);
        assert_eq!(img.dimensions(), (30, 24));
        assert_eq!(img.get_pixel(5, 5)[0], 0);
        assert_eq!(img.get_pixel(15, 5)[0], 255);
        assert_eq!(img.get_pixel(25, 5)[0], 0);
        assert_eq!(img.get_pixel(25, 20)[0], 255);
    }

    #[test]
    fn test_render_nothing() {
        let rasterizer = InkRasterizer {
            identity: FontIdentity::new("Ink", 12.0),
        };
        let lines: Vec<String> = Vec::new();
        assert_eq!(TextRenderer::new(&rasterizer).render(&lines).dimensions(), (0, 0));
    }
}
