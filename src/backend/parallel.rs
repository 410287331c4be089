use image::GrayImage;
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuildError, ThreadPoolBuilder};

use super::Backend;
use crate::ascii::{self, DitherKind, GlyphAtlas, Grid, IntegralImage};

/// Splits row-independent stages across a dedicated rayon pool.
///
/// Every stage except Floyd-Steinberg is partitioned by output row; each
/// worker owns its row slice exclusively. Floyd-Steinberg carries error
/// into the next row while scanning, so it runs as one sequential pass.
pub struct ParallelBackend {
    pool: ThreadPool,
}

impl ParallelBackend {
    /// Build a pool with `threads` workers, 0 for one per core.
    pub fn new(threads: usize) -> Result<Self, ThreadPoolBuildError> {
        let pool = ThreadPoolBuilder::new()
            .num_threads(threads)
            .thread_name(|i| format!("glyphcast-worker-{}", i))
            .build()?;
        Ok(Self { pool })
    }

    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }
}

impl std::fmt::Debug for ParallelBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParallelBackend")
            .field("threads", &self.threads())
            .finish()
    }
}

impl Backend for ParallelBackend {
    fn name(&self) -> &'static str {
        "parallel"
    }

    fn emphasize_edges(&self, luma: &Grid) -> Grid {
        if luma.is_empty() {
            return luma.clone();
        }
        let (width, height) = (luma.width(), luma.height());

        self.pool.install(|| {
            let mut dx_pass = Grid::new(width, height);
            let mut sx_pass = Grid::new(width, height);
            dx_pass
                .as_mut_slice()
                .par_chunks_mut(width)
                .zip(sx_pass.as_mut_slice().par_chunks_mut(width))
                .enumerate()
                .for_each(|(y, (dx_row, sx_row))| {
                    ascii::convolve_row_x(luma, y, &ascii::DERIVATIVE_5, dx_row);
                    ascii::convolve_row_x(luma, y, &ascii::SMOOTH_5, sx_row);
                });

            let mut magnitude = Grid::new(width, height);
            magnitude
                .as_mut_slice()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| ascii::magnitude_row(&dx_pass, &sx_pass, y, row));

            let (lo, hi) = ascii::min_max(magnitude.as_slice());
            let mut out = luma.clone();
            out.as_mut_slice()
                .par_chunks_mut(width)
                .zip(magnitude.as_slice().par_chunks(width))
                .for_each(|(row, mag)| ascii::emphasize_row(row, mag, lo, hi));
            out
        })
    }

    fn reduce(&self, luma: &Grid, columns: usize, rows: usize) -> Grid {
        if luma.is_empty() || columns == 0 || rows == 0 {
            return Grid::new(0, 0);
        }

        // the prefix sum itself is a serial scan
        let integral = IntegralImage::new(luma);
        let x_edges = ascii::bin_edges(luma.width(), columns);
        let y_edges = ascii::bin_edges(luma.height(), rows);

        let mut cells = Grid::new(columns, rows);
        self.pool.install(|| {
            cells
                .as_mut_slice()
                .par_chunks_mut(columns)
                .enumerate()
                .for_each(|(row, out)| {
                    let (y0, y1) = ascii::row_span(&y_edges, row, luma.height());
                    ascii::reduce_row(&integral, &x_edges, y0, y1, out);
                });
        });
        cells
    }

    fn shape(&self, cells: &Grid, gamma: f32) -> Grid {
        let mut out = Grid::new(cells.width(), cells.height());
        if out.is_empty() {
            return out;
        }
        let width = cells.width();
        self.pool.install(|| {
            out.as_mut_slice()
                .par_chunks_mut(width)
                .enumerate()
                .for_each(|(y, row)| {
                    ascii::blur_row(cells, y, row);
                    ascii::gamma_row(row, gamma);
                });
        });
        out
    }

    fn dither(&self, cells: &mut Grid, kind: DitherKind, levels: u32) {
        if cells.is_empty() {
            return;
        }
        match kind {
            DitherKind::None => {}
            DitherKind::Ordered => {
                let width = cells.width();
                self.pool.install(|| {
                    cells
                        .as_mut_slice()
                        .par_chunks_mut(width)
                        .enumerate()
                        .for_each(|(y, row)| ascii::ordered_row(row, y));
                });
            }
            DitherKind::FloydSteinberg => ascii::apply_floyd_steinberg(cells, levels),
        }
    }

    fn map_glyphs(&self, cells: &Grid, n: usize) -> Grid<u8> {
        let mut indices = Grid::new(cells.width(), cells.height());
        if indices.is_empty() {
            return indices;
        }
        let width = cells.width();
        self.pool.install(|| {
            indices
                .as_mut_slice()
                .par_chunks_mut(width)
                .zip(cells.as_slice().par_chunks(width))
                .for_each(|(out, row)| ascii::map_row(row, n, out));
        });
        indices
    }

    fn assemble_lines(&self, indices: &Grid<u8>, lut: &[u8]) -> Vec<String> {
        if indices.is_empty() {
            return Vec::new();
        }
        let width = indices.width();
        self.pool.install(|| {
            indices
                .as_slice()
                .par_chunks(width)
                .map(|row| ascii::line_for_row(row, lut))
                .collect()
        })
    }

    fn draw_bitmaps(&self, indices: &Grid<u8>, atlas: &GlyphAtlas) -> GrayImage {
        let (width, height) = ascii::preview_size(indices, atlas.cell());
        let mut raw = vec![255u8; width as usize * height as usize];
        if !raw.is_empty() && !atlas.is_empty() {
            let band_len = width as usize * atlas.cell().height as usize;
            self.pool.install(|| {
                raw.par_chunks_mut(band_len)
                    .enumerate()
                    .for_each(|(row, band)| ascii::draw_glyph_row(indices.row(row), atlas, band));
            });
        }
        GrayImage::from_raw(width, height, raw).unwrap_or_else(|| GrayImage::new(0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::SequentialBackend;

    fn noise(width: usize, height: usize, mut seed: u32) -> Grid {
        let data = (0..width * height)
            .map(|_| {
                seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
                (seed >> 8) as f32 / (1u32 << 24) as f32
            })
            .collect();
        Grid::from_vec(width, height, data).unwrap()
    }

    #[test]
    fn test_stages_match_sequential() {
        let parallel = ParallelBackend::new(3).unwrap();
        let sequential = SequentialBackend;
        let luma = noise(61, 37, 9);

        assert_eq!(parallel.emphasize_edges(&luma), sequential.emphasize_edges(&luma));
        let cells = sequential.reduce(&luma, 17, 9);
        assert_eq!(parallel.reduce(&luma, 17, 9), cells);
        assert_eq!(parallel.shape(&cells, 1.8), sequential.shape(&cells, 1.8));
        assert_eq!(parallel.map_glyphs(&cells, 95), sequential.map_glyphs(&cells, 95));
    }

    #[test]
    fn test_empty_inputs() {
        let parallel = ParallelBackend::new(2).unwrap();
        let empty = Grid::new(0, 0);
        assert!(parallel.emphasize_edges(&empty).is_empty());
        assert!(parallel.reduce(&empty, 8, 4).is_empty());
        assert!(parallel.shape(&empty, 2.0).is_empty());
        assert!(parallel.map_glyphs(&empty, 95).is_empty());
        assert!(parallel.assemble_lines(&Grid::new(0, 0), b" #").is_empty());
    }
}
