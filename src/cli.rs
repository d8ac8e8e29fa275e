//! Command-line interface definitions.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Live index over a directory of blog posts
#[derive(Parser, Debug, Clone)]
#[command(version, about, long_about = None, arg_required_else_help = true)]
pub struct Cli {
    /// Project root directory (default: current directory)
    #[arg(short, long)]
    pub root: Option<PathBuf>,

    /// Posts directory path (relative to project root)
    #[arg(short, long)]
    pub posts: Option<PathBuf>,

    /// Config file name (default: postwatch.toml)
    #[arg(short = 'C', long, default_value = "postwatch.toml")]
    pub config: PathBuf,

    /// subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Filters shared by listing commands
#[derive(clap::Args, Debug, Clone, Default)]
pub struct QueryArgs {
    /// Only posts carrying this tag (repeatable, all must match)
    #[arg(short, long = "tag")]
    pub tags: Vec<String>,

    /// Only posts created at or after this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub after: Option<String>,

    /// Only posts created at or before this date (YYYY-MM-DD or RFC 3339)
    #[arg(long)]
    pub before: Option<String>,

    /// Fuzzy title search, ranks results by similarity
    #[arg(short, long)]
    pub search: Option<String>,
}

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Build the index and keep it in sync with the posts directory
    Watch {
        /// Seconds between full rescans while watching (0 disables)
        #[arg(long)]
        reconcile_secs: Option<u64>,
    },

    /// List all posts, newest first
    List {
        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// List tags with their ids and post counts
    Tags {
        /// Only tags whose name fuzzily matches this term
        #[arg(short, long)]
        search: Option<String>,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Filter posts by tags, date range and title
    Query {
        #[command(flatten)]
        query: QueryArgs,

        /// Print JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Fuzzy-search post titles
    Search {
        /// Search term
        term: String,
    },

    /// Show a single post with its rendered body
    Show {
        /// Post id (directory name)
        id: String,
    },

    /// Remove a post from the index
    Remove {
        /// Post id (directory name)
        id: String,

        /// Also delete the post directory
        #[arg(long)]
        delete: bool,
    },

    /// Move a post to a new id
    Rename {
        /// Current post id
        old: String,
        /// New post id
        new: String,
    },

    /// Print a fresh, unused post id
    NewId,

    /// Rescan the posts directory and report differences
    Reconcile,
}

impl Cli {
    pub const fn is_watch(&self) -> bool {
        matches!(self.command, Commands::Watch { .. })
    }
}
