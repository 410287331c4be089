use clap::Parser;

use glyphcast::cli::{self, Args, Command};

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Args::parse();
    let config_path = args.config.as_deref();

    let result = match args.command {
        Command::Convert(convert) => cli::convert(convert, config_path),
        Command::Calibrate(calibrate) => cli::calibrate(calibrate, config_path),
        Command::Config { action } => cli::handle_config_action(action, config_path),
        Command::Cache { action } => cli::handle_cache_action(action, config_path),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
