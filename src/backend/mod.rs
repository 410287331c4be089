//! Interchangeable execution strategies for the pipeline stages.
//!
//! [`SequentialBackend`] runs every stage on the calling thread.
//! [`ParallelBackend`] splits row-independent stages across a rayon thread
//! pool. Both call the same per-row kernels from [`crate::ascii`], so their
//! results are identical, not merely close.

mod parallel;
mod sequential;

use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::ascii::{DitherKind, GlyphAtlas, Grid};

pub use parallel::ParallelBackend;
pub use sequential::SequentialBackend;

/// The stage operations the pipeline needs from an execution strategy.
pub trait Backend: Send + Sync {
    /// Short name for logs.
    fn name(&self) -> &'static str;

    /// Darken full-resolution luminance along edges.
    fn emphasize_edges(&self, luma: &Grid) -> Grid;

    /// Exact-area reduction into a `columns x rows` cell grid.
    fn reduce(&self, luma: &Grid, columns: usize, rows: usize) -> Grid;

    /// 3x3 blur then gamma.
    fn shape(&self, cells: &Grid, gamma: f32) -> Grid;

    /// Dither in place.
    fn dither(&self, cells: &mut Grid, kind: DitherKind, levels: u32);

    /// Luminance cells to LUT indices for a LUT of `n` glyphs.
    fn map_glyphs(&self, cells: &Grid, n: usize) -> Grid<u8>;

    /// Text lines for a grid of LUT indices.
    fn assemble_lines(&self, indices: &Grid<u8>, lut: &[u8]) -> Vec<String>;

    /// Composite glyph bitmaps into a preview raster.
    fn draw_bitmaps(&self, indices: &Grid<u8>, atlas: &GlyphAtlas) -> GrayImage;
}

/// Which backend to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Parallel when more than one core is available
    #[default]
    Auto,
    Sequential,
    Parallel,
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackendKind::Auto => "auto",
            BackendKind::Sequential => "sequential",
            BackendKind::Parallel => "parallel",
        };
        f.write_str(name)
    }
}

/// Number of cores the process may use, 1 if unknown.
pub fn available_cores() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

/// Pick a backend for `kind`.
///
/// `threads` sizes the parallel pool, 0 meaning one thread per core. If the
/// pool cannot be built the sequential backend is returned instead.
pub fn detect(kind: BackendKind, threads: usize) -> Box<dyn Backend> {
    let want_parallel = match kind {
        BackendKind::Sequential => false,
        BackendKind::Parallel => true,
        BackendKind::Auto => threads > 1 || (threads == 0 && available_cores() > 1),
    };

    if !want_parallel {
        log::debug!("Using sequential backend");
        return Box::new(SequentialBackend);
    }

    match ParallelBackend::new(threads) {
        Ok(backend) => {
            log::debug!("Using parallel backend with {} threads", backend.threads());
            Box::new(backend)
        }
        Err(e) => {
            log::warn!("Failed to start thread pool, falling back to sequential: {}", e);
            Box::new(SequentialBackend)
        }
    }
}
