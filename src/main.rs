// SPDX-License-Identifier: GPL-3.0-only

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod cli;

#[derive(Parser)]
#[command(name = "vr-render")]
#[command(about = "Render still images through the HMD warp and VR compositor filters")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply HMD lens warp to a side-by-side image
    Warp {
        /// Input image
        #[arg(short, long)]
        input: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Project an image onto the compositor scene and render it
    Composite {
        /// Input image (equirectangular for the sphere scene)
        #[arg(short, long)]
        input: PathBuf,

        /// Output image
        #[arg(short, long)]
        output: PathBuf,

        /// Settings JSON file (see `defaults`)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Output width (default: input width)
        #[arg(long, requires = "height")]
        width: Option<u32>,

        /// Output height (default: input height)
        #[arg(long, requires = "width")]
        height: Option<u32>,

        /// Drag with the primary button by DX DY pixels (repeatable)
        #[arg(long, num_args = 2, value_names = ["DX", "DY"], allow_negative_numbers = true, action = clap::ArgAction::Append)]
        drag: Vec<f64>,

        /// Wheel-up steps (narrows the field of view)
        #[arg(long, default_value = "0")]
        zoom_in: u32,

        /// Wheel-down steps (widens the field of view)
        #[arg(long, default_value = "0")]
        zoom_out: u32,

        /// Move the arcball camera along its view axis
        #[arg(long, allow_negative_numbers = true)]
        translate: Option<f32>,

        /// Use a head-tracked camera turned this many degrees to the left
        #[arg(long, allow_negative_numbers = true)]
        hmd_yaw: Option<f32>,
    },

    /// Print the GPU commands one frame issues, without a GPU
    Trace {
        /// Filter to trace
        #[arg(value_enum)]
        filter: cli::FilterKind,

        /// Output width
        #[arg(long, default_value = "1920")]
        width: u32,

        /// Output height
        #[arg(long, default_value = "1080")]
        height: u32,
    },

    /// Print the default settings as JSON
    Defaults,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    // Set RUST_LOG environment variable to control log level
    // Examples: RUST_LOG=debug, RUST_LOG=gst_vr=debug, RUST_LOG=info
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
        Commands::Warp { input, output } => cli::warp(&input, &output),
        Commands::Composite {
            input,
            output,
            config,
            width,
            height,
            drag,
            zoom_in,
            zoom_out,
            translate,
            hmd_yaw,
        } => cli::composite(cli::CompositeOptions {
            input,
            output,
            config,
            size: width.zip(height),
            drags: drag.chunks_exact(2).map(|d| (d[0], d[1])).collect(),
            zoom_in,
            zoom_out,
            translate,
            hmd_yaw,
        }),
        Commands::Trace {
            filter,
            width,
            height,
        } => cli::trace(filter, width, height),
        Commands::Defaults => cli::print_defaults(),
    }
}
