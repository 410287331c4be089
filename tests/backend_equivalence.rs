//! Differential tests: the parallel backend must reproduce the sequential
//! backend exactly on generated inputs.

mod common;

use std::sync::Arc;

use common::{noise_frame, random_grid, BlockRasterizer, Lcg};
use glyphcast::ascii::{DitherKind, GlyphAtlas, Grid};
use glyphcast::backend::{Backend, ParallelBackend, SequentialBackend};
use glyphcast::glyph::{calibrate, CellSize};
use glyphcast::{AsciiParams, AsciiPipeline};

const KINDS: [DitherKind; 3] = [DitherKind::None, DitherKind::Ordered, DitherKind::FloydSteinberg];

#[test]
fn test_stage_by_stage_equivalence() {
    let sequential = SequentialBackend;
    let parallel = ParallelBackend::new(4).unwrap();
    let mut rng = Lcg::new(2024);

    for case in 0..40 {
        let w = 1 + rng.below(120) as usize;
        let h = 1 + rng.below(120) as usize;
        let cols = 1 + rng.below(60) as usize;
        let rows = 1 + rng.below(40) as usize;
        let gamma = 0.3 + rng.next_f32() * 2.5;
        let kind = KINDS[case % 3];
        let levels = 2 + rng.below(64);
        let luma = random_grid(w, h, &mut rng);

        let e_seq = sequential.emphasize_edges(&luma);
        let e_par = parallel.emphasize_edges(&luma);
        assert_eq!(e_seq, e_par, "edges differ in case {case}");

        let r_seq = sequential.reduce(&e_seq, cols, rows);
        let r_par = parallel.reduce(&e_par, cols, rows);
        assert_eq!(r_seq, r_par, "reduce differs in case {case}");

        let mut s_seq = sequential.shape(&r_seq, gamma);
        let mut s_par = parallel.shape(&r_par, gamma);
        assert_eq!(s_seq, s_par, "shape differs in case {case}");

        sequential.dither(&mut s_seq, kind, levels);
        parallel.dither(&mut s_par, kind, levels);
        assert_eq!(s_seq, s_par, "{kind} dithering differs in case {case}");

        let m_seq = sequential.map_glyphs(&s_seq, 95);
        let m_par = parallel.map_glyphs(&s_par, 95);
        assert_eq!(m_seq, m_par, "mapping differs in case {case}");
    }
}

#[test]
fn test_text_and_bitmaps_equivalence() {
    let calibration = calibrate(&BlockRasterizer::new("Block")).unwrap();
    let sequential = SequentialBackend;
    let parallel = ParallelBackend::new(3).unwrap();
    let mut rng = Lcg::new(77);

    for _ in 0..10 {
        let w = 1 + rng.below(40) as usize;
        let h = 1 + rng.below(30) as usize;
        let data = (0..w * h).map(|_| rng.below(95) as u8).collect();
        let indices = Grid::from_vec(w, h, data).unwrap();
        let cell = CellSize::new(1 + rng.below(16), 1 + rng.below(24));
        let atlas = GlyphAtlas::new(&calibration, cell);

        assert_eq!(
            sequential.assemble_lines(&indices, calibration.lut()),
            parallel.assemble_lines(&indices, calibration.lut())
        );
        assert_eq!(
            sequential.draw_bitmaps(&indices, &atlas),
            parallel.draw_bitmaps(&indices, &atlas)
        );
    }
}

#[test]
fn test_whole_pipeline_equivalence() {
    let calibration = Arc::new(calibrate(&BlockRasterizer::new("Block")).unwrap());
    let sequential = AsciiPipeline::new(Arc::clone(&calibration), Box::new(SequentialBackend)).unwrap();
    let parallel = AsciiPipeline::new(calibration, Box::new(ParallelBackend::new(0).unwrap())).unwrap();
    let mut rng = Lcg::new(99);

    for case in 0..12 {
        let frame = noise_frame(8 + rng.below(200), 8 + rng.below(150), &mut rng);
        let params = AsciiParams {
            columns: 8 + rng.below(60) as usize,
            gamma: 0.5 + rng.next_f32() * 2.0,
            dithering: KINDS[case % 3],
            levels: 2 + rng.below(40),
            font: None,
        };
        let a = sequential.process(&frame, &params).unwrap();
        let b = parallel.process(&frame, &params).unwrap();
        assert_eq!(a.lines, b.lines, "lines differ in case {case}");
        assert_eq!(a.preview, b.preview, "preview differs in case {case}");
        assert_eq!(a.cells_image, b.cells_image, "cells differ in case {case}");
    }
}
