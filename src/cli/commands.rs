//! Subcommand handlers for convert, calibrate, config and cache actions.

use std::path::{Path, PathBuf};

use super::args::{CacheAction, CalibrateArgs, ConfigAction, ConvertArgs, FontArgs};
use crate::backend;
use crate::config::{default_path as get_config_path, Config, ConfigError};
use crate::glyph::{
    find_system_font, CacheError, CalibrationCache, CalibrationError, FontError, FontRasterizer,
    GlyphRasterizer,
};
use crate::pipeline::{AsciiParams, AsciiPipeline, PipelineError};
use crate::render::TextRenderer;

/// Errors surfaced by subcommands.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Font(#[from] FontError),

    #[error(transparent)]
    Calibration(#[from] CalibrationError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error(transparent)]
    Cache(#[from] CacheError),

    #[error("Failed to process image '{}': {source}", .path.display())]
    Image {
        path: PathBuf,
        source: image::ImageError,
    },

    #[error("Failed to write '{}': {source}", .path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Config file already exists: {}", .0.display())]
    ConfigExists(PathBuf),
}

/// Load the font named by CLI flags, falling back to config and then to a
/// system monospace font.
pub fn load_rasterizer(flags: &FontArgs, config: &Config) -> Result<FontRasterizer, FontError> {
    let path = flags
        .font
        .clone()
        .or_else(|| config.font.path.clone())
        .or_else(find_system_font)
        .ok_or(FontError::NotFound)?;
    let family = flags.family.as_deref().or(config.font.family.as_deref());
    let size = flags.size.unwrap_or(config.font.size);

    log::debug!("Loading font {}", path.display());
    FontRasterizer::from_file(&path, family, size)
}

/// Calibration cache as configured; memory-only when disabled.
pub fn open_cache(config: &Config, no_cache: bool) -> CalibrationCache {
    if no_cache || !config.cache.enabled {
        CalibrationCache::in_memory()
    } else {
        CalibrationCache::new(config.cache_dir())
    }
}

/// Merge CLI overrides into the configured pipeline parameters.
pub fn params_for(args: &ConvertArgs, config: &Config) -> AsciiParams {
    AsciiParams {
        columns: args.columns.unwrap_or(config.ascii.columns),
        gamma: args.gamma.unwrap_or(config.ascii.gamma),
        dithering: args.dither.map(Into::into).unwrap_or(config.ascii.dithering),
        levels: args.levels.unwrap_or(config.ascii.levels),
        font: None,
    }
}

fn save_image(img: &image::GrayImage, path: &Path) -> Result<(), CommandError> {
    img.save(path).map_err(|source| CommandError::Image {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("Wrote {}", path.display());
    Ok(())
}

/// Convert one image and write the requested outputs.
pub fn convert(args: ConvertArgs, config_path: Option<&Path>) -> Result<(), CommandError> {
    let config = Config::load(config_path)?;
    let rasterizer = load_rasterizer(&args.font, &config)?;
    let cache = open_cache(&config, args.no_cache);

    let kind = args.backend.map(Into::into).unwrap_or(config.backend.kind);
    let threads = args.threads.unwrap_or(config.backend.threads);
    let pipeline = AsciiPipeline::for_rasterizer(&cache, &rasterizer, backend::detect(kind, threads))?;

    let img = image::open(&args.image).map_err(|source| CommandError::Image {
        path: args.image.clone(),
        source,
    })?;
    let params = params_for(&args, &config);
    let result = pipeline.process_image(&img, &params)?;
    log::info!(
        "{} -> {}x{} glyphs ({}, {} dithering)",
        args.image.display(),
        result.columns(),
        result.rows(),
        pipeline.calibration().font(),
        params.dithering
    );

    match &args.text_out {
        Some(path) => {
            std::fs::write(path, result.to_text()).map_err(|source| CommandError::Write {
                path: path.clone(),
                source,
            })?;
            log::info!("Wrote {}", path.display());
        }
        None => print!("{}", result.to_text()),
    }
    if let Some(path) = &args.preview_out {
        save_image(&result.preview, path)?;
    }
    if let Some(path) = &args.cells_out {
        save_image(&result.cells_image, path)?;
    }
    if let Some(path) = &args.render_out {
        let rendered = TextRenderer::new(&rasterizer).render(&result.lines);
        save_image(&rendered, path)?;
    }
    Ok(())
}

/// Calibrate a font, optionally exporting its glyph cells.
pub fn calibrate(args: CalibrateArgs, config_path: Option<&Path>) -> Result<(), CommandError> {
    let config = Config::load(config_path)?;
    let rasterizer = load_rasterizer(&args.font, &config)?;
    let cache = open_cache(&config, false);

    if args.force {
        cache.invalidate(rasterizer.identity())?;
    }
    let calibration = cache.ensure_calibrated(&rasterizer)?;
    let cell = calibration.cell_size();

    println!("Font:   {}", calibration.font());
    println!("Cell:   {}x{} (aspect {:.3})", cell.width, cell.height, calibration.aspect());
    println!(
        "LUT:    {}",
        calibration.lut().iter().map(|&c| c as char).collect::<String>()
    );
    if let Some(path) = cache.record_path(calibration.font()) {
        println!("Cache:  {}", path.display());
    }

    if let Some(dir) = &args.export {
        let written = calibration
            .export_glyphs(dir)
            .map_err(|source| CommandError::Image {
                path: dir.clone(),
                source,
            })?;
        println!("Exported {} glyphs to {}", written.len(), dir.display());
    }
    Ok(())
}

/// Handle config subcommand actions.
pub fn handle_config_action(action: ConfigAction, config_path: Option<&Path>) -> Result<(), CommandError> {
    let path = config_path.map(PathBuf::from).unwrap_or_else(get_config_path);
    match action {
        ConfigAction::Show => {
            let config = Config::load(Some(&path))?;
            if path.exists() {
                println!("# Config file: {} (exists)", path.display());
            } else {
                println!("# Config file: {} (not found, showing defaults)", path.display());
            }
            println!("# Cache dir: {}", config.cache_dir().display());
            println!();
            print!("{}", config.to_toml()?);
        }
        ConfigAction::Init => {
            if path.exists() {
                return Err(CommandError::ConfigExists(path));
            }
            Config::default().save(&path)?;
            println!("Created config file: {}", path.display());
        }
    }
    Ok(())
}

/// Handle cache subcommand actions.
pub fn handle_cache_action(action: CacheAction, config_path: Option<&Path>) -> Result<(), CommandError> {
    match action {
        CacheAction::Clear => {
            let config = Config::load(config_path)?;
            let dir = config.cache_dir();
            let removed = CalibrationCache::new(dir.clone()).clear()?;
            println!("Removed {} cached calibration(s) from {}", removed, dir.display());
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ascii::DitherKind;
    use crate::cli::enums::Dithering;

    fn convert_args() -> ConvertArgs {
        ConvertArgs {
            image: PathBuf::from("in.png"),
            columns: None,
            gamma: None,
            dither: None,
            levels: None,
            font: FontArgs::default(),
            text_out: None,
            preview_out: None,
            cells_out: None,
            render_out: None,
            backend: None,
            threads: None,
            no_cache: false,
        }
    }

    #[test]
    fn test_params_from_config() {
        let mut config = Config::default();
        config.ascii.columns = 64;
        config.ascii.dithering = DitherKind::Ordered;
        let params = params_for(&convert_args(), &config);
        assert_eq!(params.columns, 64);
        assert_eq!(params.dithering, DitherKind::Ordered);
        assert_eq!(params.gamma, 1.0);
    }

    #[test]
    fn test_flags_override_config() {
        let mut config = Config::default();
        config.ascii.columns = 64;
        let mut args = convert_args();
        args.columns = Some(40);
        args.dither = Some(Dithering::FloydSteinberg);
        args.levels = Some(4);
        let params = params_for(&args, &config);
        assert_eq!(params.columns, 40);
        assert_eq!(params.dithering, DitherKind::FloydSteinberg);
        assert_eq!(params.levels, 4);
    }

    #[test]
    fn test_open_cache_respects_switches() {
        let mut config = Config::default();
        config.cache.dir = Some(PathBuf::from("/tmp/glyphcast-test"));
        assert!(open_cache(&config, false).dir().is_some());
        assert!(open_cache(&config, true).dir().is_none());
        config.cache.enabled = false;
        assert!(open_cache(&config, false).dir().is_none());
    }

    #[test]
    fn test_missing_font_file() {
        let flags = FontArgs {
            font: Some(PathBuf::from("/definitely/not/a/font.ttf")),
            ..Default::default()
        };
        let err = load_rasterizer(&flags, &Config::default()).err().unwrap();
        assert!(matches!(err, FontError::Io { .. }));
    }

    #[test]
    fn test_config_init_then_show() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        handle_config_action(ConfigAction::Init, Some(&path)).unwrap();
        assert!(path.exists());
        let err = handle_config_action(ConfigAction::Init, Some(&path)).unwrap_err();
        assert!(matches!(err, CommandError::ConfigExists(_)));
        handle_config_action(ConfigAction::Show, Some(&path)).unwrap();
    }
}
