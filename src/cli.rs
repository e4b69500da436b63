use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Plays a fixed set of videos, caching them locally and remembering where
/// each one was paused.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (TOML, YAML or JSON); defaults to reel.toml in the
    /// platform configuration directory
    #[arg(short = 'c', long = "config", value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Increase logging verbosity (default: info, -v: debug, -vv+: trace).
    /// RUST_LOG takes precedence when set.
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load every configured video and export the page
    Load {
        /// Export directory (overrides page.output)
        #[arg(short = 'o', long = "output", value_name = "DIR")]
        output: Option<PathBuf>,
    },
    /// Load one video and start playing it
    Play {
        /// Video identifier
        id: String,
    },
    /// Load one video and pause it at the given offset, remembering it
    Pause {
        /// Video identifier
        id: String,
        /// Offset in seconds
        #[arg(long = "at", value_name = "SECONDS")]
        at: f64,
    },
    /// List cached videos and remembered positions
    Status,
}
