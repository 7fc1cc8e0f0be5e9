// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use virtualcam::PixelFormat;

mod cli;

#[derive(Parser)]
#[command(name = "virtualcam")]
#[command(about = "Stream frames to a virtual camera device")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List registered backends in the order they are tried
    Backends,

    /// List supported pixel formats and their frame sizes
    Formats {
        /// Frame width used for the size column
        #[arg(long, default_value_t = virtualcam::constants::defaults::WIDTH)]
        width: u32,

        /// Frame height used for the size column
        #[arg(long, default_value_t = virtualcam::constants::defaults::HEIGHT)]
        height: u32,
    },

    /// Stream an animated test pattern
    Stream(StreamArgs),
}

/// Options of the `stream` command; unset options come from the config file
#[derive(clap::Args)]
pub struct StreamArgs {
    /// Frame width
    #[arg(long)]
    pub width: Option<u32>,

    /// Frame height
    #[arg(long)]
    pub height: Option<u32>,

    /// Target frame rate
    #[arg(long)]
    pub fps: Option<f64>,

    /// Pixel format (name like NV12 or code like YUY2)
    #[arg(short, long)]
    pub format: Option<PixelFormat>,

    /// Device to bind to (e.g. /dev/video2 or a PipeWire node name)
    #[arg(short, long)]
    pub device: Option<String>,

    /// Backend to use (see 'virtualcam backends')
    #[arg(short, long)]
    pub backend: Option<String>,

    /// Print the achieved frame rate once a second
    #[arg(long)]
    pub print_fps: bool,

    /// Stop after this many frames
    #[arg(long)]
    pub frames: Option<u64>,

    /// Configuration file (default: ~/.config/virtualcam/config.json if present)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=virtualcam=debug, RUST_LOG=info
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_target(true)
        .with_level(true)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Backends => cli::list_backends(),
        Commands::Formats { width, height } => cli::list_formats(width, height),
        Commands::Stream(args) => cli::stream(args),
    }
}
