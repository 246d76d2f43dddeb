//! Lodgen CLI binary.

use clap::Parser;
use lodgen::cli::{map_error, Cli, RunContext};
use lodgen::config::{ConfigLoader, LodgenConfig};
use lodgen::logging::{init_logging, LoggingConfig};
use std::process;
use tracing::{error, info};

fn main() {
    let cli = Cli::parse();

    let config = match load_config(&cli) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    };

    let logging_config = build_logging_config(&cli, &config);
    if let Err(e) = init_logging(&logging_config) {
        eprintln!("Failed to initialize logging: {}", e);
        process::exit(1);
    }

    info!("Lodgen CLI starting");

    let context = RunContext::new(config);
    match context.execute(&cli.command) {
        Ok(output) => {
            info!("Command completed successfully");
            println!("{}", output);
        }
        Err(e) => {
            error!("Command failed: {}", e);
            eprintln!("{}", map_error(&e));
            process::exit(1);
        }
    }
}

fn load_config(cli: &Cli) -> Result<LodgenConfig, lodgen::AppError> {
    match cli.config.as_deref() {
        Some(path) => ConfigLoader::load_from_file(path),
        None => {
            let cwd = std::env::current_dir()?;
            ConfigLoader::load(&cwd)
        }
    }
}

/// Build logging configuration from CLI args, environment, and config file.
/// Precedence: CLI flags override config file override defaults.
fn build_logging_config(cli: &Cli, config: &LodgenConfig) -> LoggingConfig {
    let mut logging = config.logging.clone();

    if cli.verbose {
        logging.level = "debug".to_string();
    }
    if let Some(ref level) = cli.log_level {
        logging.level = level.clone();
    }
    if let Some(ref format) = cli.log_format {
        logging.format = format.clone();
    }
    if let Some(ref output) = cli.log_output {
        logging.output = output.clone();
    }
    if let Some(ref file) = cli.log_file {
        logging.file = Some(file.clone());
    }

    logging
}
