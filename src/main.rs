//! ReSampler CLI - Always-On Capture Buffer
//!
//! Command-line host for the ReSampler capture engine.

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::info;

use resampler::cli::commands::{self, CaptureOptions};
use resampler::cli::{Cli, Commands};

fn main() -> Result<()> {
    let Cli {
        verbose,
        settings,
        command,
    } = Cli::parse();

    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    info!("ReSampler v{}", env!("CARGO_PKG_VERSION"));

    match command {
        Some(cmd) => handle_command(cmd, settings.as_deref()),
        None => {
            println!("ReSampler v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, settings_path: Option<&Path>) -> Result<()> {
    let mut store = commands::open_settings(settings_path).context("Failed to open settings")?;

    match cmd {
        Commands::Capture {
            input,
            block_size,
            duration,
            start,
            width,
            scroll,
            out,
        } => {
            let options = CaptureOptions {
                block_size,
                duration,
                start,
                width,
                scroll,
                out,
            };
            commands::capture(&input, &options, &mut store)
                .with_context(|| format!("Capture of {} failed", input.display()))?;
            Ok(())
        }
        Commands::Settings {
            duration,
            theme,
            recording_path,
        } => {
            commands::settings(
                &mut store,
                duration,
                theme.as_deref(),
                recording_path.as_deref(),
            )?;
            Ok(())
        }
    }
}
