//! Darkness to glyph mapping.
//!
//! One formula serves both text export and bitmap compositing:
//! `idx = round(darkness * (N - 1))`, clamped to `[0, N - 1]`, where
//! darkness is `1 - luminance` and the LUT is ordered lightest first.

use super::grid::Grid;

/// LUT index for a darkness value in a LUT of `n` glyphs.
///
/// # Arguments
/// * `darkness` - Darkness in [0, 1]; values outside are clamped
/// * `n` - Number of glyphs in the LUT
///
/// # Returns
/// An index in `[0, n - 1]`, or 0 when `n` is 0.
#[inline]
pub fn glyph_index(darkness: f32, n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    let max = (n - 1) as f32;
    let scaled = (darkness * max).round();
    if scaled.is_nan() {
        return 0;
    }
    scaled.clamp(0.0, max) as usize
}

/// Glyph for a darkness value. Returns a space for an empty LUT.
pub fn map_to_char(darkness: f32, lut: &[u8]) -> char {
    lut.get(glyph_index(darkness, lut.len()))
        .map(|&b| b as char)
        .unwrap_or(' ')
}

/// Map one row of luminance values to LUT indices.
///
/// # Arguments
/// * `luma` - Luminance values in [0, 1], one per cell
/// * `n` - LUT size
/// * `out` - Destination, same length as `luma`
pub fn map_row(luma: &[f32], n: usize, out: &mut [u8]) {
    for (idx, &v) in out.iter_mut().zip(luma) {
        *idx = glyph_index(1.0 - v, n) as u8;
    }
}

/// Map a luminance grid to a grid of LUT indices.
pub fn map_glyphs(cells: &Grid, n: usize) -> Grid<u8> {
    let mut indices = Grid::new(cells.width(), cells.height());
    for y in 0..cells.height() {
        map_row(cells.row(y), n, indices.row_mut(y));
    }
    indices
}

/// Turn one row of LUT indices into its text line.
pub fn line_for_row(indices: &[u8], lut: &[u8]) -> String {
    indices
        .iter()
        .map(|&i| lut.get(i as usize).map(|&b| b as char).unwrap_or(' '))
        .collect()
}

/// One string per grid row, top to bottom.
pub fn assemble_lines(indices: &Grid<u8>, lut: &[u8]) -> Vec<String> {
    if indices.is_empty() {
        return Vec::new();
    }
    indices.rows().map(|row| line_for_row(row, lut)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const LUT: &[u8] = b" .:-=+*#%@";

    #[test]
    fn test_extremes() {
        assert_eq!(map_to_char(0.0, LUT), ' ');
        assert_eq!(map_to_char(1.0, LUT), '@');
    }

    #[test]
    fn test_rounding_and_clamping() {
        assert_eq!(glyph_index(0.5, 10), 5); // 4.5 rounds away from zero
        assert_eq!(glyph_index(0.49, 10), 4);
        assert_eq!(glyph_index(-3.0, 10), 0);
        assert_eq!(glyph_index(7.0, 10), 9);
        assert_eq!(glyph_index(f32::NAN, 10), 0);
        assert_eq!(glyph_index(0.7, 0), 0);
        assert_eq!(map_to_char(0.5, &[]), ' ');
    }

    #[test]
    fn test_map_row_inverts_luminance() {
        let mut out = [0u8; 3];
        map_row(&[1.0, 0.0, 0.5], 95, &mut out);
        assert_eq!(out, [0, 94, 47]);
    }

    #[test]
    fn test_assemble_lines() {
        let cells = Grid::from_vec(3, 2, vec![1.0f32, 1.0, 1.0, 0.0, 0.0, 0.0]).unwrap();
        let indices = map_glyphs(&cells, LUT.len());
        assert_eq!(assemble_lines(&indices, LUT), vec!["   ", "@@@"]);
    }

    #[test]
    fn test_text_and_index_paths_agree() {
        for i in 0..=100 {
            let luma = i as f32 / 100.0;
            let mut idx = [0u8];
            map_row(&[luma], LUT.len(), &mut idx);
            assert_eq!(LUT[idx[0] as usize] as char, map_to_char(1.0 - luma, LUT));
        }
    }
}
