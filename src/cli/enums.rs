//! CLI enum types for dithering and backend options.

use clap::ValueEnum;

use crate::ascii::DitherKind;
use crate::backend::BackendKind;

/// Dithering applied before glyph mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Dithering {
    #[default]
    None,
    FloydSteinberg,
    Ordered,
}

impl From<Dithering> for DitherKind {
    fn from(d: Dithering) -> Self {
        match d {
            Dithering::None => DitherKind::None,
            Dithering::FloydSteinberg => DitherKind::FloydSteinberg,
            Dithering::Ordered => DitherKind::Ordered,
        }
    }
}

/// Execution backend for the pipeline stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum BackendChoice {
    #[default]
    Auto,
    Sequential,
    Parallel,
}

impl From<BackendChoice> for BackendKind {
    fn from(b: BackendChoice) -> Self {
        match b {
            BackendChoice::Auto => BackendKind::Auto,
            BackendChoice::Sequential => BackendKind::Sequential,
            BackendChoice::Parallel => BackendKind::Parallel,
        }
    }
}
