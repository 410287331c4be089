//! Image to glyph-grid stages.
//!
//! The pipeline runs these in a fixed order:
//!
//! 1. **Luminance** - RGB/BGR/gray frame to a [0, 1] grid (BT.601)
//! 2. **Edge emphasis** - darken along second-order Sobel edges
//! 3. **Reduction** - exact-area means into the cell grid (integral image)
//! 4. **Shaping** - 3x3 box blur, then gamma
//! 5. **Dithering** - none, ordered (Bayer 4x4) or Floyd-Steinberg
//! 6. **Mapping** - darkness to LUT index, then text lines or glyph bitmaps
//!
//! Every stage that can be split by row exposes a `*_row` kernel so the
//! sequential and parallel backends run the exact same arithmetic.

mod compose;
mod dimensions;
mod dither;
mod edges;
mod grayscale;
mod grid;
mod mapping;
mod reduce;
mod shaping;

pub use compose::{draw_glyph_bitmaps, draw_glyph_row, draw_with_atlas, preview_size, GlyphAtlas};
pub use dimensions::{grid_size, DEFAULT_CHAR_ASPECT_RATIO, MIN_COLUMNS, MIN_ROWS};
pub use dither::{
    apply as apply_dither, apply_floyd_steinberg, apply_ordered, bayer_bias, clamp_levels,
    ordered_row, DitherKind, BAYER_4X4, DEFAULT_LEVELS, MAX_LEVELS, MIN_LEVELS, ORDERED_STRENGTH,
};
pub use edges::{
    convolve_row_x, convolve_row_y, emphasize_edges, emphasize_row, magnitude_row, min_max,
    DERIVATIVE_5, SMOOTH_5,
};
pub use grayscale::{luminance, to_luminance, Frame, PixelFormat};
pub use grid::Grid;
pub use mapping::{assemble_lines, glyph_index, line_for_row, map_glyphs, map_row, map_to_char};
pub use reduce::{bin_edges, reduce, reduce_row, row_span, IntegralImage};
pub use shaping::{apply_gamma, blur, blur_row, gamma_is_active, gamma_row, shape};
