//! Cell-grid smoothing and gamma remapping.

use super::grid::Grid;

/// 3x3 box blur producing row `y` of `out`. Borders replicate.
pub fn blur_row(src: &Grid, y: usize, out: &mut [f32]) {
    for (x, value) in out.iter_mut().enumerate() {
        let mut acc = 0.0f32;
        for dy in -1..=1isize {
            for dx in -1..=1isize {
                acc += src.get_clamped(x as isize + dx, y as isize + dy);
            }
        }
        *value = acc / 9.0;
    }
}

/// 3x3 box blur over the whole grid.
pub fn blur(src: &Grid) -> Grid {
    let mut out = Grid::new(src.width(), src.height());
    for y in 0..src.height() {
        blur_row(src, y, out.row_mut(y));
    }
    out
}

/// Whether `gamma` changes anything. 1.0 is skipped for exactness, and
/// non-positive or non-finite values are ignored.
#[inline]
pub fn gamma_is_active(gamma: f32) -> bool {
    gamma.is_finite() && gamma > 0.0 && gamma != 1.0
}

/// `v = clamp(v^(1/gamma), 0, 1)` over one row.
pub fn gamma_row(row: &mut [f32], gamma: f32) {
    if !gamma_is_active(gamma) {
        return;
    }
    let exponent = 1.0 / gamma;
    for v in row.iter_mut() {
        *v = v.max(0.0).powf(exponent).clamp(0.0, 1.0);
    }
}

/// Apply gamma to the whole grid in place.
pub fn apply_gamma(grid: &mut Grid, gamma: f32) {
    gamma_row(grid.as_mut_slice(), gamma);
}

/// Blur followed by gamma, the fixed post-reduction shaping order.
pub fn shape(cells: &Grid, gamma: f32) -> Grid {
    let mut out = blur(cells);
    apply_gamma(&mut out, gamma);
    out
}
