//! CLI Module
//!
//! Command-line host for ReSampler: streams a WAV file through the capture
//! ring block by block, the way an audio callback would, then exports a
//! selection of what the ring holds.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// ReSampler - grab the last N seconds of audio after the fact
#[derive(Parser, Debug)]
#[command(name = "resampler")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file to use instead of the per-user one
    #[arg(long, global = true)]
    pub settings: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Play a WAV file through the capture ring and export a selection
    #[command(name = "capture")]
    Capture {
        /// Input audio file
        input: PathBuf,

        /// Samples per simulated audio callback
        #[arg(short, long, default_value_t = 512)]
        block_size: usize,

        /// Ring length in seconds (defaults to the stored setting)
        #[arg(short, long)]
        duration: Option<u32>,

        /// Selection start as a fraction of the view
        #[arg(long, default_value_t = 0.0)]
        start: f32,

        /// Selection width as a fraction of the view (0 exports nothing)
        #[arg(long, default_value_t = 1.0)]
        width: f32,

        /// Waveform scroll offset in samples
        #[arg(long, default_value_t = 0)]
        scroll: usize,

        /// Folder for the exported take (defaults to the stored setting)
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show or change stored settings
    #[command(name = "settings")]
    Settings {
        /// Ring length in seconds
        #[arg(short, long)]
        duration: Option<u32>,

        /// View theme: rainbow, light, dark or matrix
        #[arg(short, long)]
        theme: Option<String>,

        /// Folder exported takes are written to
        #[arg(short, long)]
        recording_path: Option<PathBuf>,
    },
}
