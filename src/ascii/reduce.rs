//! Exact-area downsampling of a luminance image into a cell grid.
//!
//! A 2D prefix sum (integral image) makes the sum over any rectangle an
//! O(1) lookup. Bin edges `i * len / bins` partition each axis into
//! contiguous, non-overlapping bins whose sizes differ by at most one pixel,
//! so every source pixel lands in exactly one cell.

use super::grid::Grid;

/// Summed-area table over a luminance image.
///
/// `sums[(y * (width + 1)) + x]` holds the sum of all pixels above and to
/// the left of `(x, y)`, exclusive. Accumulated in f64 so large images do
/// not lose precision.
#[derive(Debug, Clone)]
pub struct IntegralImage {
    width: usize,
    height: usize,
    sums: Vec<f64>,
}

impl IntegralImage {
    pub fn new(src: &Grid) -> Self {
        let width = src.width();
        let height = src.height();
        let stride = width + 1;
        let mut sums = vec![0.0f64; stride * (height + 1)];

        for y in 0..height {
            let mut row_sum = 0.0f64;
            let row = src.row(y);
            for x in 0..width {
                row_sum += row[x] as f64;
                sums[(y + 1) * stride + x + 1] = sums[y * stride + x + 1] + row_sum;
            }
        }

        Self {
            width,
            height,
            sums,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Sum over the half-open rectangle `[x0, x1) x [y0, y1)`.
    #[inline]
    pub fn rect_sum(&self, x0: usize, y0: usize, x1: usize, y1: usize) -> f64 {
        let stride = self.width + 1;
        self.sums[y1 * stride + x1] - self.sums[y0 * stride + x1] - self.sums[y1 * stride + x0]
            + self.sums[y0 * stride + x0]
    }
}

/// Bin boundaries `edges[i] = i * len / bins` for `i` in `0..=bins`.
pub fn bin_edges(len: usize, bins: usize) -> Vec<usize> {
    (0..=bins).map(|i| i * len / bins.max(1)).collect()
}

/// Half-open pixel range of one bin. When there are more bins than pixels
/// an empty bin samples the nearest pixel so it is never left blank.
#[inline]
fn bin_span(edges: &[usize], i: usize, len: usize) -> (usize, usize) {
    let (a, b) = (edges[i], edges[i + 1]);
    if b > a {
        (a, b)
    } else {
        let a = a.min(len - 1);
        (a, a + 1)
    }
}

/// Fill one output row: the mean of every column bin within `[y0, y1)`.
pub fn reduce_row(integral: &IntegralImage, x_edges: &[usize], y0: usize, y1: usize, out: &mut [f32]) {
    for (col, cell) in out.iter_mut().enumerate() {
        let (x0, x1) = bin_span(x_edges, col, integral.width);
        let area = ((x1 - x0) * (y1 - y0)).max(1);
        *cell = (integral.rect_sum(x0, y0, x1, y1) / area as f64) as f32;
    }
}

/// Vertical pixel range covered by output row `row`.
pub fn row_span(y_edges: &[usize], row: usize, height: usize) -> (usize, usize) {
    bin_span(y_edges, row, height)
}

/// Reduce `src` into a `columns x rows` grid of area-weighted means.
pub fn reduce(src: &Grid, columns: usize, rows: usize) -> Grid {
    if src.is_empty() || columns == 0 || rows == 0 {
        return Grid::new(0, 0);
    }

    let integral = IntegralImage::new(src);
    let x_edges = bin_edges(src.width(), columns);
    let y_edges = bin_edges(src.height(), rows);

    let mut cells = Grid::new(columns, rows);
    for row in 0..rows {
        let (y0, y1) = row_span(&y_edges, row, src.height());
        reduce_row(&integral, &x_edges, y0, y1, cells.row_mut(row));
    }
    cells
}
