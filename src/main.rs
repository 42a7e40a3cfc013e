// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "pos-scanner")]
#[command(about = "Camera barcode scanner for point-of-sale inventory lookup")]
#[command(version = env!("GIT_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan barcodes until the duration ends or Ctrl+C
    Scan {
        /// Serve these images (or directories of images) as the camera
        #[arg(short, long)]
        image: Vec<PathBuf>,

        /// V4L2 device node (default: first capture device)
        #[arg(short, long)]
        device: Option<String>,

        /// Stop after this many seconds
        #[arg(short = 't', long)]
        duration: Option<u64>,

        /// Pretend to run in a browser with this user agent
        #[arg(long)]
        user_agent: Option<String>,

        /// Pretend to run on a page served from this URL
        #[arg(long)]
        page_url: Option<String>,

        /// Config file (default: ~/.config/pos-scanner/config.json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Score and decode a single still image
    Analyze {
        image: PathBuf,

        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the capabilities probed from the host as JSON
    Probe {
        #[arg(long)]
        user_agent: Option<String>,

        #[arg(long)]
        page_url: Option<String>,
    },

    /// Open and immediately release the camera
    Check {
        #[arg(short, long)]
        device: Option<String>,
    },

    /// List available V4L2 capture devices
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=pos_scanner=trace, RUST_LOG=info
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
        Commands::Scan {
            image,
            device,
            duration,
            user_agent,
            page_url,
            config,
        } => cli::scan(cli::ScanOptions {
            images: image,
            device,
            duration,
            host: cli::host_override(user_agent, page_url),
            config,
        })?,
        Commands::Analyze { image, config } => cli::analyze(&image, config.as_deref())?,
        Commands::Probe {
            user_agent,
            page_url,
        } => cli::probe(cli::host_override(user_agent, page_url))?,
        Commands::Check { device } => cli::check(device)?,
        Commands::List => cli::list_devices(),
    }

    Ok(())
}
