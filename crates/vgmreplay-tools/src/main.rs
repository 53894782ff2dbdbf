use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod vgm;
use vgm::{RenderOptions, info as vgm_info, read_vgm_as_vec, render as vgm_render};

/// vgmreplay command line tools
#[derive(Parser)]
#[command(
    name = env!("CARGO_PKG_NAME"),
    version = env!("CARGO_PKG_VERSION"),
    about = env!("CARGO_PKG_DESCRIPTION"),
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header, chip and GD3 info for a VGM file (accepts .vgm or .vgz; use '-' for stdin)
    Info {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render a VGM file to a 16-bit stereo 44.1 kHz WAV file
    Render {
        /// Input file to read (use '-' for stdin)
        #[arg(value_name = "FILE")]
        file: PathBuf,
        /// WAV file to write
        #[arg(value_name = "OUTPUT")]
        output: PathBuf,
        /// Times to jump back to the loop point after the first pass
        #[arg(long = "loops", default_value_t = 1)]
        loops: u32,
        /// Silence a chip (e.g. YM2612, or YM2612:2 for the second instance); repeatable
        #[arg(long = "mute", value_name = "CHIP")]
        mute: Vec<String>,
        /// Stop after this many seconds of audio even if the stream continues
        #[arg(long = "max-seconds")]
        max_seconds: Option<u32>,
    },
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Info { file } => {
            let bytes = read_vgm_as_vec(&file)?;
            vgm_info(&file, bytes)?;
        }
        Commands::Render {
            file,
            output,
            loops,
            mute,
            max_seconds,
        } => {
            let bytes = read_vgm_as_vec(&file)?;
            let options = RenderOptions {
                loops,
                mute,
                max_seconds,
            };
            vgm_render(bytes, &output, &options)?;
        }
    }

    Ok(())
}
