//! Color frame to linear luminance using the ITU-R BT.601 weights.

use image::DynamicImage;

use super::grid::Grid;

/// Channel order of an interleaved 8-bit frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelFormat {
    /// RGB format (3 bytes per pixel)
    #[default]
    Rgb,
    /// BGR format (3 bytes per pixel), as produced by most capture APIs
    Bgr,
    /// Single-channel grayscale
    Gray,
}

impl PixelFormat {
    pub fn bytes_per_pixel(&self) -> usize {
        match self {
            PixelFormat::Rgb | PixelFormat::Bgr => 3,
            PixelFormat::Gray => 1,
        }
    }
}

/// A decoded image frame.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Interleaved pixel data
    pub data: Vec<u8>,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Pixel format
    pub format: PixelFormat,
}

impl Frame {
    pub fn new(data: Vec<u8>, width: u32, height: u32, format: PixelFormat) -> Self {
        Self {
            data,
            width,
            height,
            format,
        }
    }

    /// Convert any decoded image to an RGB frame.
    pub fn from_image(img: &DynamicImage) -> Self {
        let rgb = img.to_rgb8();
        let (width, height) = rgb.dimensions();
        Self::new(rgb.into_raw(), width, height, PixelFormat::Rgb)
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.format.bytes_per_pixel()
    }

    /// Number of bytes a frame of this size and format must hold.
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.bytes_per_pixel()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0 || self.data.is_empty()
    }
}

/// Luminance of one RGB triple in [0, 1].
///
/// Coefficients are scaled by 1000 (299 + 587 + 114 = 1000) so the weighted
/// sum is an exact integer and pure white maps to exactly 1.0.
#[inline]
pub fn luminance(r: u8, g: u8, b: u8) -> f32 {
    let weighted = 299 * r as u32 + 587 * g as u32 + 114 * b as u32;
    weighted as f32 / 255_000.0
}

/// Convert a frame to a `width x height` grid of luminance in [0, 1].
///
/// Trailing bytes beyond `width * height` pixels are ignored; callers check
/// [`Frame::expected_len`] first.
pub fn to_luminance(frame: &Frame) -> Grid {
    let pixel_count = frame.width as usize * frame.height as usize;
    let mut luma = Vec::with_capacity(pixel_count);

    match frame.format {
        PixelFormat::Rgb => {
            for px in frame.data.chunks_exact(3).take(pixel_count) {
                luma.push(luminance(px[0], px[1], px[2]));
            }
        }
        PixelFormat::Bgr => {
            for px in frame.data.chunks_exact(3).take(pixel_count) {
                luma.push(luminance(px[2], px[1], px[0]));
            }
        }
        PixelFormat::Gray => {
            luma.extend(frame.data.iter().take(pixel_count).map(|&g| g as f32 / 255.0));
        }
    }
    luma.resize(pixel_count, 0.0);

    Grid::from_vec(frame.width as usize, frame.height as usize, luma)
        .unwrap_or_else(|| Grid::new(0, 0))
}
