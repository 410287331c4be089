//! Image to glyph-grid pipeline.
//!
//! One call to [`AsciiPipeline::process`] turns one frame into text lines, a
//! glyph-bitmap preview and the cell grid as an image. The calibration is
//! shared read-only through an `Arc`; every call works on fresh buffers.

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use image::{DynamicImage, GrayImage};

use crate::ascii::{self, DitherKind, Frame, GlyphAtlas, DEFAULT_LEVELS};
use crate::backend::Backend;
use crate::glyph::{Calibration, CalibrationCache, CalibrationError, CellSize, FontIdentity, GlyphRasterizer};

/// Errors raised while building or running a pipeline.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    #[error("Calibration failed: {0}")]
    Calibration(#[from] CalibrationError),

    #[error("Calibration has no glyphs")]
    EmptyLut,

    #[error("Calibration has {0} glyphs, at most 256 can be indexed")]
    TooManyGlyphs(usize),

    #[error("Frame holds {actual} bytes, {expected} required")]
    FrameSize { expected: usize, actual: usize },

    #[error("Requested font {requested} but the calibration is for {calibrated}")]
    FontMismatch {
        requested: FontIdentity,
        calibrated: FontIdentity,
    },
}

/// Per-run options. Owned by the caller, only read by the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub struct AsciiParams {
    /// Requested columns, raised to at least 8.
    pub columns: usize,
    /// 1.0 leaves values unchanged, >1 brightens midtones, <1 darkens.
    pub gamma: f32,
    pub dithering: DitherKind,
    /// Floyd-Steinberg quantization levels, clamped to [2, 256].
    pub levels: u32,
    /// When set, must match the calibration's font.
    pub font: Option<FontIdentity>,
}

impl Default for AsciiParams {
    fn default() -> Self {
        Self {
            columns: crate::config::DEFAULT_COLUMNS,
            gamma: 1.0,
            dithering: DitherKind::None,
            levels: DEFAULT_LEVELS,
            font: None,
        }
    }
}

/// Output of one pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// One string per row, top to bottom, each `columns` glyphs long.
    pub lines: Vec<String>,
    /// Glyph bitmaps composited at the output cell size.
    pub preview: GrayImage,
    /// Final cell values (after shaping and dithering) as 8-bit luminance.
    pub cells_image: GrayImage,
}

impl PipelineResult {
    pub fn empty() -> Self {
        Self {
            lines: Vec::new(),
            preview: GrayImage::new(0, 0),
            cells_image: GrayImage::new(0, 0),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn columns(&self) -> usize {
        self.lines.first().map(|l| l.len()).unwrap_or(0)
    }

    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    /// Lines joined with `\n`, with a trailing newline when not empty.
    pub fn to_text(&self) -> String {
        let mut text = self.lines.join("\n");
        if !text.is_empty() {
            text.push('\n');
        }
        text
    }
}

/// Orchestrates reduce, shape, dither and map over one calibration.
pub struct AsciiPipeline {
    calibration: Arc<Calibration>,
    backend: Box<dyn Backend>,
    atlas: GlyphAtlas,
}

impl AsciiPipeline {
    /// Create a pipeline over a published calibration.
    ///
    /// The preview uses the calibration's own cell size until
    /// [`Self::with_output_cell`] says otherwise.
    pub fn new(calibration: Arc<Calibration>, backend: Box<dyn Backend>) -> Result<Self, PipelineError> {
        match calibration.glyph_count() {
            0 => return Err(PipelineError::EmptyLut),
            n if n > 256 => return Err(PipelineError::TooManyGlyphs(n)),
            _ => {}
        }
        let atlas = GlyphAtlas::new(&calibration, calibration.cell_size());
        Ok(Self {
            calibration,
            backend,
            atlas,
        })
    }

    /// Calibrate (or load from `cache`) the rasterizer's font, then build a
    /// pipeline over it.
    pub fn for_rasterizer(
        cache: &CalibrationCache,
        rasterizer: &dyn GlyphRasterizer,
        backend: Box<dyn Backend>,
    ) -> Result<Self, PipelineError> {
        let calibration = cache.ensure_calibrated(rasterizer)?;
        Self::new(calibration, backend)
    }

    /// Composite previews at `cell` instead of the calibrated cell size.
    /// Zero dimensions are raised to one pixel.
    pub fn with_output_cell(mut self, cell: CellSize) -> Self {
        let cell = CellSize::new(cell.width.max(1), cell.height.max(1));
        self.atlas = GlyphAtlas::new(&self.calibration, cell);
        self
    }

    pub fn calibration(&self) -> &Arc<Calibration> {
        &self.calibration
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    pub fn output_cell(&self) -> CellSize {
        self.atlas.cell()
    }

    /// Run the pipeline on a decoded image of any color type.
    pub fn process_image(&self, img: &DynamicImage, params: &AsciiParams) -> Result<PipelineResult, PipelineError> {
        self.process(&Frame::from_image(img), params)
    }

    /// Run the pipeline on one frame.
    ///
    /// # Arguments
    /// * `frame` - Interleaved 8-bit pixels
    /// * `params` - Columns, gamma, dithering and optional font check
    ///
    /// # Returns
    /// The text lines and rasters, or an empty result for a zero-size frame.
    pub fn process(&self, frame: &Frame, params: &AsciiParams) -> Result<PipelineResult, PipelineError> {
        if let Some(requested) = &params.font {
            if requested != self.calibration.font() {
                return Err(PipelineError::FontMismatch {
                    requested: requested.clone(),
                    calibrated: self.calibration.font().clone(),
                });
            }
        }

        if frame.width == 0 || frame.height == 0 {
            return Ok(PipelineResult::empty());
        }
        if frame.data.len() < frame.expected_len() {
            return Err(PipelineError::FrameSize {
                expected: frame.expected_len(),
                actual: frame.data.len(),
            });
        }

        let started = Instant::now();
        let (columns, rows) = ascii::grid_size(frame.width, frame.height, params.columns, self.calibration.aspect());

        let luma = ascii::to_luminance(frame);
        let emphasized = self.backend.emphasize_edges(&luma);
        let cells = self.backend.reduce(&emphasized, columns, rows);
        let mut shaped = self.backend.shape(&cells, params.gamma);
        self.backend.dither(&mut shaped, params.dithering, params.levels);
        let indices = self.backend.map_glyphs(&shaped, self.calibration.glyph_count());

        // text assembly and compositing only read `indices`
        let lut = self.calibration.lut();
        let backend = self.backend.as_ref();
        let (lines, preview) = thread::scope(|s| {
            let text = s.spawn(|| backend.assemble_lines(&indices, lut));
            let preview = backend.draw_bitmaps(&indices, &self.atlas);
            let lines = text
                .join()
                .unwrap_or_else(|panic| std::panic::resume_unwind(panic));
            (lines, preview)
        });

        log::debug!(
            "{}x{} frame -> {}x{} cells on {} backend in {:?}",
            frame.width,
            frame.height,
            columns,
            rows,
            backend.name(),
            started.elapsed()
        );

        Ok(PipelineResult {
            lines,
            preview,
            cells_image: shaped.to_gray_image(),
        })
    }
}

impl std::fmt::Debug for AsciiPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AsciiPipeline")
            .field("font", self.calibration.font())
            .field("backend", &self.backend.name())
            .field("output_cell", &self.atlas.cell())
            .finish()
    }
}
