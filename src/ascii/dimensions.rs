//! Cell grid sizing from the requested column count.

/// Fewest columns a grid may have.
pub const MIN_COLUMNS: usize = 8;
/// Fewest rows a grid may have.
pub const MIN_ROWS: usize = 4;

/// Character aspect ratio (height / width) used when no calibration is at
/// hand. Glyph cells are typically about twice as tall as wide.
pub const DEFAULT_CHAR_ASPECT_RATIO: f64 = 2.0;

/// Calculate the cell grid for an image.
///
/// Glyph cells are `char_aspect` times taller than wide, so a square image
/// needs `char_aspect` times fewer rows than columns to keep its shape:
/// `rows = max(MIN_ROWS, round(img_height / img_width * columns / char_aspect))`.
///
/// # Arguments
/// * `img_width` - Width of the source image in pixels
/// * `img_height` - Height of the source image in pixels
/// * `columns` - Requested column count, raised to at least [`MIN_COLUMNS`]
/// * `char_aspect` - Glyph cell height over width; falls back to
///   [`DEFAULT_CHAR_ASPECT_RATIO`] if not a positive finite number
///
/// # Returns
/// `(columns, rows)`, or `(0, 0)` for an empty image.
///
/// # Example
/// ```
/// use glyphcast::ascii::grid_size;
/// assert_eq!(grid_size(16, 16, 8, 2.0), (8, 4));
/// assert_eq!(grid_size(640, 480, 120, 2.0), (120, 45));
/// ```
pub fn grid_size(img_width: u32, img_height: u32, columns: usize, char_aspect: f64) -> (usize, usize) {
    if img_width == 0 || img_height == 0 {
        return (0, 0);
    }

    let char_aspect = if char_aspect.is_finite() && char_aspect > 0.0 {
        char_aspect
    } else {
        DEFAULT_CHAR_ASPECT_RATIO
    };

    let columns = columns.max(MIN_COLUMNS);
    let rows = (img_height as f64 / img_width as f64 * columns as f64 / char_aspect).round() as usize;
    (columns, rows.max(MIN_ROWS))
}
