use image::GrayImage;

use super::Backend;
use crate::ascii::{self, DitherKind, GlyphAtlas, Grid};

/// Runs every stage on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct SequentialBackend;

impl Backend for SequentialBackend {
    fn name(&self) -> &'static str {
        "sequential"
    }

    fn emphasize_edges(&self, luma: &Grid) -> Grid {
        ascii::emphasize_edges(luma)
    }

    fn reduce(&self, luma: &Grid, columns: usize, rows: usize) -> Grid {
        ascii::reduce(luma, columns, rows)
    }

    fn shape(&self, cells: &Grid, gamma: f32) -> Grid {
        ascii::shape(cells, gamma)
    }

    fn dither(&self, cells: &mut Grid, kind: DitherKind, levels: u32) {
        ascii::apply_dither(cells, kind, levels);
    }

    fn map_glyphs(&self, cells: &Grid, n: usize) -> Grid<u8> {
        ascii::map_glyphs(cells, n)
    }

    fn assemble_lines(&self, indices: &Grid<u8>, lut: &[u8]) -> Vec<String> {
        ascii::assemble_lines(indices, lut)
    }

    fn draw_bitmaps(&self, indices: &Grid<u8>, atlas: &GlyphAtlas) -> GrayImage {
        ascii::draw_with_atlas(indices, atlas)
    }
}
