use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// `tastekit` - adaptive taste questionnaire and catalog ranking.
#[derive(Parser, Debug)]
#[command(name = "tastekit")]
#[command(version = "0.1.0")]
#[command(about = "Learn what someone wants to watch in a dozen questions.", long_about = None)]
pub struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the interactive questionnaire, then rank the catalog
    Quiz {
        /// JSON catalog to rank once the questionnaire completes
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Number of recommendations to show
        #[arg(long)]
        top_k: Option<usize>,

        /// Continue a stored session instead of starting a new one
        #[arg(long)]
        resume: Option<String>,
    },

    /// Print the configured question bank
    Questions,

    /// Print the descriptive query derived from a belief profile
    Keywords {
        /// JSON file with `{axis: {mu, sigma}}` or `{axis: mu}`
        #[arg(long)]
        profile: PathBuf,
    },

    /// Rank a catalog against a belief profile
    Rank {
        /// JSON file with `{axis: {mu, sigma}}` or `{axis: mu}`
        #[arg(long)]
        profile: PathBuf,

        /// JSON catalog (defaults to `scoring.catalog_path`)
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Number of recommendations to return
        #[arg(long)]
        top_k: Option<usize>,

        /// Print the ranking as JSON
        #[arg(long)]
        json: bool,
    },

    /// Inspect stored questionnaire sessions
    Sessions {
        #[command(subcommand)]
        session_command: SessionCommands,
    },
}

/// Stored session subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum SessionCommands {
    /// List stored sessions, most recent first
    List,
    /// Print a session snapshot as JSON
    Show {
        /// Session id
        id: String,
    },
    /// Delete a stored session and its answers
    Delete {
        /// Session id
        id: String,
    },
}
