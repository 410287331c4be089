//! Command-line interface definitions and helpers.
//!
//! This module contains all CLI argument parsing, enums, and subcommand handlers.

mod args;
mod commands;
mod enums;

pub use args::{Args, CacheAction, CalibrateArgs, Command, ConfigAction, ConvertArgs, FontArgs};
pub use commands::{
    calibrate, convert, handle_cache_action, handle_config_action, load_rasterizer, open_cache,
    params_for, CommandError,
};
pub use enums::{BackendChoice, Dithering};
