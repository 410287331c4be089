//! Glyph density calibration.
//!
//! Every printable ASCII glyph is rendered into a cell, its ink coverage is
//! measured, and the glyphs are sorted from lightest to darkest. The result
//! is a darkness -> glyph lookup table plus the per-glyph bitmaps packed in
//! the same order, used for compositing previews without touching the font
//! again.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use image::GrayImage;

use super::font::FontIdentity;
use super::rasterizer::{ink_density, CellSize, GlyphRasterizer, MIN_CELL_DIM};
use super::CalibrationError;

/// First printable ASCII code (space).
pub const ASCII_MIN: u8 = 32;
/// Last printable ASCII code (`~`).
pub const ASCII_MAX: u8 = 126;
/// Number of glyphs in every calibration.
pub const ASCII_COUNT: usize = (ASCII_MAX - ASCII_MIN + 1) as usize;

/// One measured glyph.
#[derive(Debug, Clone, PartialEq)]
pub struct GlyphSample {
    pub character: u8,
    /// Ink coverage in [0, 1], darker = higher.
    pub density: f64,
    /// Row-major grayscale cell, 0 = black.
    pub bitmap: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

/// Darkness-ordered glyph table for one font.
///
/// Immutable once built. `lut()[0]` is the lightest glyph and
/// `lut()[ASCII_COUNT - 1]` the darkest; `pixmaps()` holds each glyph's
/// bitmap in the same order.
#[derive(Debug, Clone, PartialEq)]
pub struct Calibration {
    font: FontIdentity,
    lut: Vec<u8>,
    pixmaps: Vec<u8>,
    pixmap_widths: Vec<u32>,
    pixmap_heights: Vec<u32>,
    aspect: f64,
}

impl Calibration {
    /// Assemble a calibration from its parts, checking every structural
    /// invariant: `ASCII_COUNT` unique printable glyphs, one width and height
    /// per glyph, all cells the same size, and a pixmap buffer whose length
    /// is the sum of the cell areas.
    pub fn from_parts(
        font: FontIdentity,
        lut: Vec<u8>,
        pixmaps: Vec<u8>,
        pixmap_widths: Vec<u32>,
        pixmap_heights: Vec<u32>,
        aspect: f64,
    ) -> Result<Self, CalibrationError> {
        if lut.len() != ASCII_COUNT {
            return Err(CalibrationError::LutLength {
                expected: ASCII_COUNT,
                actual: lut.len(),
            });
        }
        if pixmap_widths.len() != ASCII_COUNT || pixmap_heights.len() != ASCII_COUNT {
            return Err(CalibrationError::DimensionCount {
                expected: ASCII_COUNT,
                widths: pixmap_widths.len(),
                heights: pixmap_heights.len(),
            });
        }

        let mut seen = HashSet::with_capacity(ASCII_COUNT);
        for &c in &lut {
            if !(ASCII_MIN..=ASCII_MAX).contains(&c) {
                return Err(CalibrationError::NonPrintable(c));
            }
            if !seen.insert(c) {
                return Err(CalibrationError::DuplicateGlyph(c as char));
            }
        }

        let (w0, h0) = (pixmap_widths[0], pixmap_heights[0]);
        for (index, (&w, &h)) in pixmap_widths.iter().zip(&pixmap_heights).enumerate() {
            if w != w0 || h != h0 {
                return Err(CalibrationError::InconsistentDimensions {
                    index,
                    width: w,
                    height: h,
                    expected_width: w0,
                    expected_height: h0,
                });
            }
        }
        if w0 == 0 || h0 == 0 {
            return Err(CalibrationError::EmptyCell);
        }

        let expected = total_area(&pixmap_widths, &pixmap_heights).ok_or(
            CalibrationError::CellTooLarge {
                width: w0,
                height: h0,
            },
        )?;
        if pixmaps.len() != expected {
            return Err(CalibrationError::PixmapLength {
                expected,
                actual: pixmaps.len(),
            });
        }

        if !aspect.is_finite() || aspect <= 0.0 {
            return Err(CalibrationError::InvalidAspect(aspect));
        }

        Ok(Self {
            font,
            lut,
            pixmaps,
            pixmap_widths,
            pixmap_heights,
            aspect,
        })
    }

    pub fn font(&self) -> &FontIdentity {
        &self.font
    }

    /// Glyph codes ordered from lightest to darkest.
    pub fn lut(&self) -> &[u8] {
        &self.lut
    }

    /// Concatenated glyph bitmaps in LUT order.
    pub fn pixmaps(&self) -> &[u8] {
        &self.pixmaps
    }

    pub fn pixmap_widths(&self) -> &[u32] {
        &self.pixmap_widths
    }

    pub fn pixmap_heights(&self) -> &[u32] {
        &self.pixmap_heights
    }

    /// Cell height over cell width.
    pub fn aspect(&self) -> f64 {
        self.aspect
    }

    pub fn glyph_count(&self) -> usize {
        self.lut.len()
    }

    /// Shared cell size of all glyphs.
    pub fn cell_size(&self) -> CellSize {
        CellSize::new(self.pixmap_widths[0], self.pixmap_heights[0])
    }

    pub fn lightest(&self) -> char {
        self.lut[0] as char
    }

    pub fn darkest(&self) -> char {
        self.lut[self.lut.len() - 1] as char
    }

    /// Byte offset of glyph `index` inside [`Self::pixmaps`]: the sum of the
    /// areas of all glyphs before it.
    pub fn glyph_offset(&self, index: usize) -> usize {
        // all cells share one size and their total is the pixmap length
        index * self.cell_size().area()
    }

    /// Bitmap of glyph `index` (LUT order).
    pub fn glyph_bitmap(&self, index: usize) -> &[u8] {
        let start = self.glyph_offset(index);
        &self.pixmaps[start..start + self.cell_size().area()]
    }

    /// Write every glyph cell as `glyph_<code>.png` into `dir`.
    pub fn export_glyphs(&self, dir: &Path) -> Result<Vec<PathBuf>, image::ImageError> {
        std::fs::create_dir_all(dir)?;
        let mut written = Vec::with_capacity(self.lut.len());
        for (index, &code) in self.lut.iter().enumerate() {
            let img = GrayImage::from_raw(
                self.pixmap_widths[index],
                self.pixmap_heights[index],
                self.glyph_bitmap(index).to_vec(),
            )
            .ok_or_else(|| {
                image::ImageError::Parameter(image::error::ParameterError::from_kind(
                    image::error::ParameterErrorKind::DimensionMismatch,
                ))
            })?;
            let path = dir.join(format!("glyph_{}.png", code));
            img.save(&path)?;
            written.push(path);
        }
        Ok(written)
    }
}

/// Sum of `width * height` over all glyphs, `None` on overflow.
pub(crate) fn total_area(widths: &[u32], heights: &[u32]) -> Option<usize> {
    widths
        .iter()
        .zip(heights)
        .try_fold(0usize, |total, (&w, &h)| {
            (w as usize)
                .checked_mul(h as usize)
                .and_then(|area| total.checked_add(area))
        })
}

/// Render and measure every printable glyph, in ASCII order.
pub fn measure_glyphs(rasterizer: &dyn GlyphRasterizer) -> Vec<GlyphSample> {
    let cell = rasterizer.cell_size();
    let cell = CellSize::new(cell.width.max(MIN_CELL_DIM), cell.height.max(MIN_CELL_DIM));

    (ASCII_MIN..=ASCII_MAX)
        .map(|code| {
            let bitmap = rasterizer.rasterize(code as char, cell);
            GlyphSample {
                character: code,
                density: ink_density(&bitmap),
                bitmap,
                width: cell.width,
                height: cell.height,
            }
        })
        .collect()
}

/// Build a calibration for the rasterizer's font.
///
/// Glyphs are sorted by ascending density with a stable sort, so glyphs of
/// equal density keep their ASCII order and the table is reproducible.
pub fn calibrate(rasterizer: &dyn GlyphRasterizer) -> Result<Calibration, CalibrationError> {
    let started = Instant::now();
    let mut samples = measure_glyphs(rasterizer);
    let cell = CellSize::new(samples[0].width, samples[0].height);

    for sample in &samples {
        if sample.bitmap.len() != cell.area() {
            return Err(CalibrationError::BitmapSize {
                character: sample.character as char,
                expected: cell.area(),
                actual: sample.bitmap.len(),
            });
        }
    }

    samples.sort_by(|a, b| a.density.total_cmp(&b.density));

    let mut lut = Vec::with_capacity(ASCII_COUNT);
    let mut pixmaps = Vec::with_capacity(ASCII_COUNT * cell.area());
    let mut widths = Vec::with_capacity(ASCII_COUNT);
    let mut heights = Vec::with_capacity(ASCII_COUNT);
    for sample in samples {
        lut.push(sample.character);
        pixmaps.extend_from_slice(&sample.bitmap);
        widths.push(sample.width);
        heights.push(sample.height);
    }

    let calibration = Calibration::from_parts(
        rasterizer.identity().clone(),
        lut,
        pixmaps,
        widths,
        heights,
        cell.aspect(),
    )?;
    log::info!(
        "Calibrated {} ({}x{} cells) in {:?}: '{}' .. '{}'",
        rasterizer.identity(),
        cell.width,
        cell.height,
        started.elapsed(),
        calibration.lightest(),
        calibration.darkest()
    );
    Ok(calibration)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Fills a deterministic, code-dependent number of pixels with ink.
    struct StripeRasterizer {
        identity: FontIdentity,
        cell: CellSize,
    }

    impl StripeRasterizer {
        fn new(width: u32, height: u32) -> Self {
            Self {
                identity: FontIdentity::new("Stripe", 12.0),
                cell: CellSize::new(width, height),
            }
        }
    }

    impl GlyphRasterizer for StripeRasterizer {
        fn identity(&self) -> &FontIdentity {
            &self.identity
        }

        fn cell_size(&self) -> CellSize {
            self.cell
        }

        fn rasterize(&self, ch: char, cell: CellSize) -> Vec<u8> {
            // pairs of characters share a density to exercise tie-breaking
            let rank = (ch as usize - ASCII_MIN as usize) / 2;
            let inked = rank * cell.area() / ASCII_COUNT;
            let mut bitmap = vec![255u8; cell.area()];
            bitmap[..inked].fill(0);
            bitmap
        }
    }

    #[test]
    fn test_calibration_has_all_printable_glyphs() {
        let calibration = calibrate(&StripeRasterizer::new(10, 20)).unwrap();
        assert_eq!(calibration.glyph_count(), ASCII_COUNT);
        let unique: HashSet<u8> = calibration.lut().iter().copied().collect();
        assert_eq!(unique.len(), ASCII_COUNT);
        assert!(calibration
            .lut()
            .iter()
            .all(|c| (ASCII_MIN..=ASCII_MAX).contains(c)));
    }

    #[test]
    fn test_lut_sorted_by_density() {
        let calibration = calibrate(&StripeRasterizer::new(12, 24)).unwrap();
        let densities: Vec<f64> = (0..calibration.glyph_count())
            .map(|i| ink_density(calibration.glyph_bitmap(i)))
            .collect();
        assert!(densities.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_equal_densities_keep_ascii_order() {
        let calibration = calibrate(&StripeRasterizer::new(10, 20)).unwrap();
        // ' ' and '!' share rank 0, '"' and '#' rank 1
        assert_eq!(&calibration.lut()[..4], b" !\"#");
        assert_eq!(calibration.lightest(), ' ');
        assert_eq!(calibration.darkest(), '~');
    }

    #[test]
    fn test_pixmaps_follow_lut_order() {
        let rasterizer = StripeRasterizer::new(10, 10);
        let calibration = calibrate(&rasterizer).unwrap();
        let cell = calibration.cell_size();
        assert_eq!(calibration.pixmaps().len(), ASCII_COUNT * cell.area());
        for (i, &code) in calibration.lut().iter().enumerate() {
            assert_eq!(calibration.glyph_offset(i), i * cell.area());
            assert_eq!(
                calibration.glyph_bitmap(i),
                rasterizer.rasterize(code as char, cell).as_slice()
            );
        }
    }

    #[test]
    fn test_aspect_is_height_over_width() {
        let calibration = calibrate(&StripeRasterizer::new(10, 25)).unwrap();
        assert!((calibration.aspect() - 2.5).abs() < 1e-12);
        assert_eq!(calibration.cell_size(), CellSize::new(10, 25));
    }

    #[test]
    fn test_small_cells_are_clamped() {
        let calibration = calibrate(&StripeRasterizer::new(4, 6)).unwrap();
        assert_eq!(calibration.cell_size(), CellSize::new(10, 10));
    }

    #[test]
    fn test_from_parts_rejects_short_lut() {
        let good = calibrate(&StripeRasterizer::new(10, 10)).unwrap();
        let mut lut = good.lut().to_vec();
        lut.pop();
        let err = Calibration::from_parts(
            good.font().clone(),
            lut,
            good.pixmaps().to_vec(),
            good.pixmap_widths().to_vec(),
            good.pixmap_heights().to_vec(),
            good.aspect(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::LutLength {
                expected: ASCII_COUNT,
                actual: 94
            }
        ));
    }

    #[test]
    fn test_from_parts_rejects_duplicates() {
        let good = calibrate(&StripeRasterizer::new(10, 10)).unwrap();
        let mut lut = good.lut().to_vec();
        lut[1] = lut[0];
        let err = Calibration::from_parts(
            good.font().clone(),
            lut,
            good.pixmaps().to_vec(),
            good.pixmap_widths().to_vec(),
            good.pixmap_heights().to_vec(),
            good.aspect(),
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::DuplicateGlyph(_)));
    }

    #[test]
    fn test_from_parts_rejects_inconsistent_dimensions() {
        let good = calibrate(&StripeRasterizer::new(10, 10)).unwrap();
        let mut widths = good.pixmap_widths().to_vec();
        widths[5] = 11;
        let err = Calibration::from_parts(
            good.font().clone(),
            good.lut().to_vec(),
            good.pixmaps().to_vec(),
            widths,
            good.pixmap_heights().to_vec(),
            good.aspect(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CalibrationError::InconsistentDimensions { index: 5, .. }
        ));
    }

    #[test]
    fn test_from_parts_rejects_pixmap_length() {
        let good = calibrate(&StripeRasterizer::new(10, 10)).unwrap();
        let mut pixmaps = good.pixmaps().to_vec();
        pixmaps.truncate(pixmaps.len() - 1);
        let err = Calibration::from_parts(
            good.font().clone(),
            good.lut().to_vec(),
            pixmaps,
            good.pixmap_widths().to_vec(),
            good.pixmap_heights().to_vec(),
            good.aspect(),
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::PixmapLength { .. }));
    }

    #[test]
    fn test_from_parts_rejects_overflowing_cells() {
        let good = calibrate(&StripeRasterizer::new(10, 10)).unwrap();
        let err = Calibration::from_parts(
            good.font().clone(),
            good.lut().to_vec(),
            good.pixmaps().to_vec(),
            vec![u32::MAX; ASCII_COUNT],
            vec![u32::MAX; ASCII_COUNT],
            good.aspect(),
        )
        .unwrap_err();
        assert!(matches!(err, CalibrationError::CellTooLarge { .. }));
    }

    #[test]
    fn test_total_area() {
        assert_eq!(total_area(&[10, 10], &[20, 20]), Some(400));
        assert_eq!(total_area(&[], &[]), Some(0));
        assert_eq!(total_area(&[u32::MAX; 95], &[u32::MAX; 95]), None);
    }

    #[test]
    fn test_export_glyphs_writes_one_png_per_glyph() {
        let calibration = calibrate(&StripeRasterizer::new(10, 12)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let written = calibration.export_glyphs(dir.path()).unwrap();
        assert_eq!(written.len(), ASCII_COUNT);
        let at = image::open(dir.path().join("glyph_64.png")).unwrap().to_luma8();
        assert_eq!(at.dimensions(), (10, 12));
        let index = calibration.lut().iter().position(|&c| c == b'@').unwrap();
        assert_eq!(at.as_raw().as_slice(), calibration.glyph_bitmap(index));
    }
}
