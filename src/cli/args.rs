//! CLI argument definitions using clap

use clap::{ArgAction, Parser, Subcommand, ValueHint};

use crate::domain::NodeId;

/// Breadth-first search walkthrough: event log, paced storyboard and BFS tree of small scenes
#[derive(Parser, Debug)]
#[command(name = "bfsviz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Log verbosity, repeat for more (-d info, -dd debug, -ddd trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub debug: u8,

    /// Print author and version
    #[arg(long)]
    pub info: bool,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the traversal event log
    Events {
        /// Scene file, built-in name or name in the scene directory
        #[arg(value_hint = ValueHint::AnyPath)]
        scene: String,
        /// Start node (default: the scene's start)
        #[arg(short, long)]
        start: Option<NodeId>,
        /// One JSON object per line
        #[arg(long)]
        json: bool,
        /// Stop after this many events
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Print the paced pseudocode storyboard
    Play {
        #[arg(value_hint = ValueHint::AnyPath)]
        scene: String,
        #[arg(short, long)]
        start: Option<NodeId>,
    },

    /// Print the BFS tree with distances
    Tree {
        #[arg(value_hint = ValueHint::AnyPath)]
        scene: String,
        #[arg(short, long)]
        start: Option<NodeId>,
    },

    /// Print nodes, labels, positions and adjacency of a scene
    Graph {
        #[arg(value_hint = ValueHint::AnyPath)]
        scene: String,
    },

    /// List built-in and scene-directory scenes
    Scenes,

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
    /// Show effective config
    Show,

    /// Print config template
    Template,

    /// Show config paths
    Path,
}
