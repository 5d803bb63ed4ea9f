//! Command-Line Interface

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};

/// Gaze Warp - Gaze-assisted pointer warping
#[derive(Parser, Debug)]
#[command(name = "gaze-warp")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded session trace through the warp engine
    Replay {
        /// Input trace file, or the name of a trace in the traces directory
        #[arg(short, long)]
        input: PathBuf,

        /// Screenshot used as the screen for saliency refinement
        #[arg(short, long)]
        screen: Option<PathBuf>,

        /// Skip saliency refinement even if a screen is given
        #[arg(long)]
        no_saliency: bool,

        /// Print the full report as JSON
        #[arg(long)]
        json: bool,

        /// Feed samples at the configured polling interval, like live input
        #[arg(long)]
        paced: bool,
    },

    /// Run the saliency detector on a region of an image
    Analyse {
        /// Input image
        #[arg(short, long)]
        image: PathBuf,

        /// Region center X (defaults to the image center)
        #[arg(short = 'x', long)]
        x: Option<i32>,

        /// Region center Y (defaults to the image center)
        #[arg(short = 'y', long)]
        y: Option<i32>,

        /// Region side length (defaults to the configured capture size)
        #[arg(long)]
        size: Option<u32>,
    },

    /// View configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Print the default config file location
    Path,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the trace directory
    pub fn traces_dir() -> PathBuf {
        dirs::home_dir()
            .map(|h| h.join(".gaze_warp").join("traces"))
            .unwrap_or_else(|| PathBuf::from("traces"))
    }

    /// Resolve a `--input` argument
    ///
    /// Existing paths and paths with a directory part are used as given. A
    /// bare name is looked up in [`Cli::traces_dir`], with `.json` appended
    /// when it has no extension.
    pub fn resolve_trace(input: &Path) -> PathBuf {
        if input.exists() || input.components().count() > 1 {
            return input.to_path_buf();
        }
        let mut path = Self::traces_dir().join(input);
        if path.extension().is_none() {
            path.set_extension("json");
        }
        path
    }
}
