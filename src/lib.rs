//! glyphcast library crate.
//!
//! Converts raster images into text using glyph densities measured from a
//! real font. [`glyph`] calibrates fonts, [`ascii`] holds the per-stage
//! image kernels, [`backend`] runs them sequentially or on a thread pool and
//! [`pipeline`] ties everything together.

pub mod ascii;
pub mod backend;
pub mod cli;
pub mod config;
pub mod glyph;
pub mod pipeline;
pub mod render;

pub use pipeline::{AsciiParams, AsciiPipeline, PipelineError, PipelineResult};
