//! CLI argument parsing with clap.

use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{BackendChoice, Dithering};

/// Convert images to text art using font-calibrated glyph densities
#[derive(Parser, Debug)]
#[command(name = "glyphcast")]
#[command(version, about = "Font-calibrated image to ASCII converter", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Convert an image to text and preview rasters
    Convert(ConvertArgs),
    /// Calibrate a font and store it in the cache
    Calibrate(CalibrateArgs),
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
    /// Calibration cache management
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

/// Font selection shared by `convert` and `calibrate`.
#[derive(ClapArgs, Debug, Clone, Default, PartialEq)]
pub struct FontArgs {
    /// Font file (TTF/OTF); defaults to a system monospace font
    #[arg(long)]
    pub font: Option<PathBuf>,

    /// Font family name used as the cache key
    #[arg(long)]
    pub family: Option<String>,

    /// Font size in points
    #[arg(long)]
    pub size: Option<f32>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ConvertArgs {
    /// Image to convert
    pub image: PathBuf,

    /// Output columns (at least 8)
    #[arg(long)]
    pub columns: Option<usize>,

    /// Gamma (>1 brightens midtones, <1 darkens)
    #[arg(long, value_parser = parse_gamma)]
    pub gamma: Option<f32>,

    /// Dithering algorithm
    #[arg(long)]
    pub dither: Option<Dithering>,

    /// Floyd-Steinberg quantization levels (2-256)
    #[arg(long, value_parser = clap::value_parser!(u32).range(2..=256))]
    pub levels: Option<u32>,

    #[command(flatten)]
    pub font: FontArgs,

    /// Write text lines to this file instead of stdout
    #[arg(long)]
    pub text_out: Option<PathBuf>,

    /// Write the glyph-bitmap preview image
    #[arg(long)]
    pub preview_out: Option<PathBuf>,

    /// Write the final cell grid as a grayscale image
    #[arg(long)]
    pub cells_out: Option<PathBuf>,

    /// Write the text rendered with the font
    #[arg(long)]
    pub render_out: Option<PathBuf>,

    /// Execution backend
    #[arg(long)]
    pub backend: Option<BackendChoice>,

    /// Worker threads for the parallel backend (0 = one per core)
    #[arg(long)]
    pub threads: Option<usize>,

    /// Do not read or write the on-disk calibration cache
    #[arg(long)]
    pub no_cache: bool,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct CalibrateArgs {
    #[command(flatten)]
    pub font: FontArgs,

    /// Export each glyph cell as PNG into this directory
    #[arg(long)]
    pub export: Option<PathBuf>,

    /// Recalibrate even if a cached calibration exists
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CacheAction {
    /// Delete all cached calibrations
    Clear,
}

/// Parse and validate gamma (positive, finite)
fn parse_gamma(s: &str) -> Result<f32, String> {
    let gamma: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
    if !gamma.is_finite() || gamma <= 0.0 {
        return Err(format!("Gamma must be a positive number, got {}", gamma));
    }
    Ok(gamma)
}
