//! Shared fixtures for integration tests.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};

use glyphcast::ascii::{Frame, Grid, PixelFormat};
use glyphcast::glyph::{CellSize, FontIdentity, GlyphRasterizer};

/// Deterministic stand-in for a real font.
///
/// Glyph `c` inks the first `k * area / 94` pixels of its cell, where
/// `k = (c - 32) * 7 mod 95`. Since 7 and 95 are coprime every glyph gets a
/// distinct density and the darkness order differs from ASCII order.
pub struct BlockRasterizer {
    identity: FontIdentity,
    cell: CellSize,
    calls: AtomicUsize,
}

impl BlockRasterizer {
    pub fn new(family: &str) -> Self {
        Self::with_cell(family, 10, 20)
    }

    pub fn with_cell(family: &str, width: u32, height: u32) -> Self {
        Self {
            identity: FontIdentity::new(family, 12.0),
            cell: CellSize::new(width, height),
            calls: AtomicUsize::new(0),
        }
    }

    /// Number of glyphs rasterized so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn rank(ch: char) -> usize {
        (ch as usize - 32) * 7 % 95
    }
}

impl GlyphRasterizer for BlockRasterizer {
    fn identity(&self) -> &FontIdentity {
        &self.identity
    }

    fn cell_size(&self) -> CellSize {
        self.cell
    }

    fn rasterize(&self, ch: char, cell: CellSize) -> Vec<u8> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let area = cell.area();
        let inked = Self::rank(ch) * area / 94;
        let mut bitmap = vec![255u8; area];
        bitmap[..inked].fill(0);
        bitmap
    }
}

/// Linear congruential generator, enough for reproducible test data.
pub struct Lcg(u32);

impl Lcg {
    pub fn new(seed: u32) -> Self {
        Self(seed)
    }

    pub fn next_u32(&mut self) -> u32 {
        self.0 = self.0.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        self.0
    }

    /// Uniform value in [0, 1).
    pub fn next_f32(&mut self) -> f32 {
        (self.next_u32() >> 8) as f32 / (1u32 << 24) as f32
    }

    pub fn below(&mut self, n: u32) -> u32 {
        self.next_u32() % n
    }
}

pub fn random_grid(width: usize, height: usize, rng: &mut Lcg) -> Grid {
    let data = (0..width * height).map(|_| rng.next_f32()).collect();
    Grid::from_vec(width, height, data).unwrap()
}

pub fn solid_frame(width: u32, height: u32, value: u8) -> Frame {
    Frame::new(
        vec![value; (width * height * 3) as usize],
        width,
        height,
        PixelFormat::Rgb,
    )
}

/// Left-to-right gray ramp, dark to bright.
pub fn ramp_frame(width: u32, height: u32) -> Frame {
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for _y in 0..height {
        for x in 0..width {
            let v = (x * 255 / (width - 1).max(1)) as u8;
            data.extend_from_slice(&[v, v, v]);
        }
    }
    Frame::new(data, width, height, PixelFormat::Rgb)
}

pub fn noise_frame(width: u32, height: u32, rng: &mut Lcg) -> Frame {
    let data = (0..width * height * 3).map(|_| rng.below(256) as u8).collect();
    Frame::new(data, width, height, PixelFormat::Rgb)
}
