//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

/// Browse a tiered subject taxonomy and build the selected discipline paths for an item
#[derive(Parser, Debug)]
#[command(name = "taxpick")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase log verbosity (-d info, -dd debug, -ddd trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub debug: u8,

    /// Project directory holding .taxpick.toml (default: cwd)
    #[arg(short = 'C', long, global = true)]
    pub project_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pick subjects interactively (fzf)
    Pick {
        /// Editing an existing item rather than submitting a new one
        #[arg(long)]
        edit: bool,
    },

    /// Select a subject path by ids, tier 1 first
    Add {
        /// Subject ids from the top tier down
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Remove (or shorten) the selected path with exactly these ids
    Remove {
        /// Subject ids of the selected path
        #[arg(required = true)]
        ids: Vec<String>,
    },

    /// Show the saved selection
    Show,

    /// List children under a subject path (roots if empty)
    List {
        /// Subject ids from the top tier down
        ids: Vec<String>,
        /// Case-insensitive substring filter on subject text
        #[arg(short, long)]
        filter: Option<String>,
    },

    /// Show the taxonomy as a tree
    Tree,

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },

    /// Generate shell completions
    Completion {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Create config template
    Init {
        /// Create global config
        #[arg(short, long)]
        global: bool,
    },

    /// Show config paths
    Path,
}
