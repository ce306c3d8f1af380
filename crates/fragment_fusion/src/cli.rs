//! Command-line interface for fragment_fusion.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Fragment Fusion - swap the tiles back into the picture
#[derive(Parser, Debug)]
#[command(name = "fragment_fusion")]
#[command(about = "Swap picture puzzle with level progression", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = fragment_fusion::DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Override the database path from the config file
    #[arg(long)]
    pub db_path: Option<String>,

    /// Override the asset directory from the config file
    #[arg(long)]
    pub assets_dir: Option<PathBuf>,

    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List all levels with difficulty, pieces, best time and lock state
    Levels,

    /// Show score, completed levels and average best time
    Stats,

    /// Play a level, reading tile indices from stdin
    Play {
        /// Level number (1-based)
        #[arg(short, long)]
        level: usize,
    },

    /// Play a puzzle made from your own image (progress is not saved)
    Custom {
        /// Image file (PNG or JPEG)
        #[arg(short, long)]
        image: PathBuf,

        /// Tiles per side (defaults to the configured custom grid size)
        #[arg(short, long)]
        grid: Option<u32>,
    },

    /// Reset all level progress
    Reset,

    /// Delete the profile image and reset all progress
    DeleteAccount,
}
