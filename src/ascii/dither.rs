//! Dithering of the shaped cell grid.
//!
//! Every kind keeps values inside [0, 1]. Ordered dithering is elementwise
//! and can be split across workers by row. Floyd-Steinberg has a true
//! sequential dependency and always runs as a single serpentine pass.

use serde::{Deserialize, Serialize};

use super::grid::Grid;

/// Quantization levels used by Floyd-Steinberg when none are configured.
pub const DEFAULT_LEVELS: u32 = 32;
/// Lower and upper bound for Floyd-Steinberg levels.
pub const MIN_LEVELS: u32 = 2;
pub const MAX_LEVELS: u32 = 256;

/// Amplitude of the Bayer bias.
pub const ORDERED_STRENGTH: f32 = 1.0 / 16.0;

/// 4x4 Bayer threshold matrix (divide by 16 for thresholds in [0, 1)).
#[rustfmt::skip]
pub const BAYER_4X4: [[u8; 4]; 4] = [
    [ 0,  8,  2, 10],
    [12,  4, 14,  6],
    [ 3, 11,  1,  9],
    [15,  7, 13,  5],
];

/// Dithering algorithm applied before glyph mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DitherKind {
    /// No dithering
    #[default]
    None,
    /// Serpentine error diffusion
    FloydSteinberg,
    /// Bayer 4x4 threshold bias
    Ordered,
}

impl DitherKind {
    /// Whether this kind can be split into independent rows.
    pub fn is_row_independent(&self) -> bool {
        !matches!(self, DitherKind::FloydSteinberg)
    }
}

impl std::fmt::Display for DitherKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            DitherKind::None => "none",
            DitherKind::FloydSteinberg => "floyd-steinberg",
            DitherKind::Ordered => "ordered",
        };
        f.write_str(name)
    }
}

/// Clamp a requested level count into `[MIN_LEVELS, MAX_LEVELS]`.
#[inline]
pub fn clamp_levels(levels: u32) -> u32 {
    levels.clamp(MIN_LEVELS, MAX_LEVELS)
}

/// Bayer bias for the cell at `(x, y)`.
#[inline]
pub fn bayer_bias(x: usize, y: usize) -> f32 {
    let threshold = BAYER_4X4[y % 4][x % 4] as f32 / 16.0;
    (threshold - 0.5) * ORDERED_STRENGTH
}

/// Ordered dithering of row `y`, in place.
pub fn ordered_row(row: &mut [f32], y: usize) {
    for (x, v) in row.iter_mut().enumerate() {
        *v = (*v + bayer_bias(x, y)).clamp(0.0, 1.0);
    }
}

/// Ordered dithering of the whole grid, in place.
pub fn apply_ordered(grid: &mut Grid) {
    let width = grid.width().max(1);
    for (y, row) in grid.as_mut_slice().chunks_mut(width).enumerate() {
        ordered_row(row, y);
    }
}

/// Serpentine Floyd-Steinberg error diffusion, in place.
///
/// Even rows scan left to right, odd rows right to left. Error goes 7/16
/// ahead in the row, then 3/16 behind-below, 5/16 below and 1/16
/// ahead-below, mirrored with the scan direction. Error that would leave
/// the grid is dropped.
pub fn apply_floyd_steinberg(grid: &mut Grid, levels: u32) {
    let levels = clamp_levels(levels);
    let step = 1.0 / (levels - 1) as f32;
    let width = grid.width();
    let height = grid.height();
    if width == 0 || height == 0 {
        return;
    }

    let data = grid.as_mut_slice();
    for y in 0..height {
        // current row and the row below are disjoint borrows
        let (head, tail) = data.split_at_mut((y + 1) * width);
        let current = &mut head[y * width..];
        let mut below = tail.get_mut(..width);

        let forward = y % 2 == 0;
        for i in 0..width {
            let x = if forward { i } else { width - 1 - i };
            let v = current[x].clamp(0.0, 1.0);
            let q = ((v / step).round() * step).clamp(0.0, 1.0);
            current[x] = q;
            let err = v - q;
            if err == 0.0 {
                continue;
            }

            let ahead = if forward { x.checked_add(1) } else { x.checked_sub(1) };
            let behind = if forward { x.checked_sub(1) } else { x.checked_add(1) };
            let ahead = ahead.filter(|&a| a < width);
            let behind = behind.filter(|&b| b < width);

            if let Some(a) = ahead {
                current[a] += err * 7.0 / 16.0;
            }
            if let Some(next) = below.as_deref_mut() {
                if let Some(b) = behind {
                    next[b] += err * 3.0 / 16.0;
                }
                next[x] += err * 5.0 / 16.0;
                if let Some(a) = ahead {
                    next[a] += err * 1.0 / 16.0;
                }
            }
        }
    }
}

/// Dispatch on `kind`. `levels` only matters for Floyd-Steinberg.
pub fn apply(grid: &mut Grid, kind: DitherKind, levels: u32) {
    match kind {
        DitherKind::None => {}
        DitherKind::Ordered => apply_ordered(grid),
        DitherKind::FloydSteinberg => apply_floyd_steinberg(grid, levels),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

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
    fn test_none_is_identity() {
        let mut grid = noise(7, 5, 1);
        let before = grid.clone();
        apply(&mut grid, DitherKind::None, DEFAULT_LEVELS);
        assert_eq!(grid, before);
    }

    #[test]
    fn test_all_kinds_preserve_bounds() {
        for kind in [DitherKind::None, DitherKind::Ordered, DitherKind::FloydSteinberg] {
            for levels in [0, 2, 5, 32, 1000] {
                let mut grid = noise(33, 17, 42);
                // push some cells to the extremes
                grid.set(0, 0, 0.0);
                grid.set(1, 0, 1.0);
                apply(&mut grid, kind, levels);
                assert!(
                    grid.as_slice().iter().all(|v| (0.0..=1.0).contains(v)),
                    "{kind} with {levels} levels left [0, 1]"
                );
            }
        }
    }

    #[test]
    fn test_ordered_bias_range() {
        let mut lo = f32::INFINITY;
        let mut hi = f32::NEG_INFINITY;
        for y in 0..4 {
            for x in 0..4 {
                let b = bayer_bias(x, y);
                lo = lo.min(b);
                hi = hi.max(b);
            }
        }
        assert!((lo - (-0.5 / 16.0)).abs() < 1e-7);
        assert!((hi - (15.0 / 16.0 - 0.5) / 16.0).abs() < 1e-7);
    }

    #[test]
    fn test_ordered_tiles_every_four() {
        let mut grid = Grid::filled(8, 8, 0.5f32);
        apply_ordered(&mut grid);
        for y in 0..4 {
            for x in 0..4 {
                assert_eq!(grid.get(x, y), grid.get(x + 4, y + 4));
            }
        }
    }

    #[test]
    fn test_floyd_steinberg_binary_half_gray() {
        let mut grid = Grid::filled(128, 128, 0.5f32);
        apply_floyd_steinberg(&mut grid, 2);
        let ones = grid.as_slice().iter().filter(|&&v| v == 1.0).count();
        assert!(grid.as_slice().iter().all(|&v| v == 0.0 || v == 1.0));
        let ratio = ones as f64 / grid.len() as f64;
        assert!((ratio - 0.5).abs() < 0.05, "ratio of ones was {ratio}");
    }

    #[test]
    fn test_floyd_steinberg_outputs_on_level_grid() {
        let mut grid = noise(20, 10, 7);
        apply_floyd_steinberg(&mut grid, 5);
        for &v in grid.as_slice() {
            let scaled = v * 4.0;
            assert!((scaled - scaled.round()).abs() < 1e-5);
        }
    }

    #[test]
    fn test_floyd_steinberg_exact_levels_untouched() {
        let mut grid = Grid::filled(6, 6, 1.0f32);
        apply_floyd_steinberg(&mut grid, DEFAULT_LEVELS);
        assert!(grid.as_slice().iter().all(|&v| v == 1.0));
    }

    #[test]
    fn test_clamp_levels() {
        assert_eq!(clamp_levels(0), 2);
        assert_eq!(clamp_levels(32), 32);
        assert_eq!(clamp_levels(999), 256);
    }

    #[test]
    fn test_single_row_and_column() {
        let mut row = Grid::filled(9, 1, 0.3f32);
        apply_floyd_steinberg(&mut row, 2);
        let mut col = Grid::filled(1, 9, 0.3f32);
        apply_floyd_steinberg(&mut col, 2);
        assert!(row.as_slice().iter().chain(col.as_slice()).all(|&v| v == 0.0 || v == 1.0));
    }
}
