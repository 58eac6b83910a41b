//! CLI argument definitions using clap

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueHint};

use crate::metric::Distance;

/// Fuzzy word lookup backed by a BK-tree (Levenshtein distance)
#[derive(Parser, Debug)]
#[command(name = "bktree")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Debug level: -d info, -dd debug, -ddd trace
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub debug: u8,

    /// Config file layered over the global one
    #[arg(short, long, global = true, env = "BKTREE_CONFIG", value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find all words within a radius of the query
    Search {
        /// Word list, one word per line
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Query word
        query: String,
        /// Maximum edit distance (default from config)
        #[arg(short, long)]
        radius: Option<Distance>,
        /// Use the experimental concurrent search
        #[arg(long)]
        concurrent: bool,
    },

    /// Print the tree as nested JSON
    Export {
        /// Word list, one word per line
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
        /// Indent the output
        #[arg(long)]
        pretty: bool,
    },

    /// Show the tree with edge distances
    Tree {
        /// Word list, one word per line
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Show size and shape of the tree
    Stats {
        /// Word list, one word per line
        #[arg(value_hint = ValueHint::FilePath)]
        file: PathBuf,
    },

    /// Manage settings
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show merged config
    Show,

    /// Print a config template
    Template,

    /// Show config paths
    Path,
}
