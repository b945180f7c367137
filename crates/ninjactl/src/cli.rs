//! Command-line definition for ninjactl.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Version embedded at build time
pub const VERSION: &str = env!("NINJA_VERSION");

/// UTC date the binary was built
pub const BUILD_DATE: &str = env!("NINJA_BUILD_DATE");

/// `--version` text: version plus build date
pub const LONG_VERSION: &str = concat!(
    env!("NINJA_VERSION"),
    " (built ",
    env!("NINJA_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "ninjactl")]
#[command(about = "Trader Ninja - XP, levels and ranks", long_about = None)]
#[command(version = VERSION, long_version = LONG_VERSION)]
pub struct Cli {
    /// Config file (default: $XDG_CONFIG_HOME/trader-ninja/config.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL
    #[arg(long, global = true)]
    pub api_url: Option<String>,

    /// Don't contact the progression service
    #[arg(long, global = true)]
    pub offline: bool,

    /// Print JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    /// Debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// Show a user's XP, level and rank
    Stats {
        /// User identifier
        #[arg(short, long)]
        user: String,
    },

    /// Award XP to a user
    Award {
        /// User identifier
        #[arg(short, long)]
        user: String,

        /// XP to add
        #[arg(short, long)]
        amount: u64,

        /// What the XP is for
        #[arg(short, long, default_value = "manual award")]
        reason: String,
    },

    /// Show the level and rank for an XP total
    Level {
        /// Total XP
        xp: u64,
    },

    /// List rank bands and the XP each starts at
    Ranks,

    /// Inspect or seed the local XP cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },

    /// Print the effective configuration
    Config,
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum CacheAction {
    /// Show cached XP (all users, or one)
    Show {
        #[arg(short, long)]
        user: Option<String>,
    },

    /// Record XP for a user
    Set {
        #[arg(short, long)]
        user: String,

        #[arg(long)]
        xp: u64,
    },
}
