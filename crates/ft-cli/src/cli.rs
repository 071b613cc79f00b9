//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Application focus tracker.
///
/// Records which application holds focus and summarizes the current session
/// as time per app, a top-N chart and a timeline.
#[derive(Debug, Parser)]
#[command(name = "ft", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Manage observation sessions.
    #[command(subcommand)]
    Session(SessionAction),

    /// Record an application-focus change in the current session.
    Record {
        /// Path or handle of the focused application.
        #[arg(long)]
        path: String,

        /// Title of the focused application.
        #[arg(long)]
        title: String,

        /// When focus changed (ISO 8601 or e.g. "5 minutes ago"). Defaults to now.
        #[arg(long)]
        at: Option<String>,

        /// Producer offset. Defaults to milliseconds since session start.
        #[arg(long)]
        offset: Option<u64>,
    },

    /// Print focus events as a JSON array.
    Events {
        /// Include every session, not just the current one.
        #[arg(long)]
        all: bool,
    },

    /// Show statistics for the current session.
    Stats {
        /// Credit the open visit up to this time. Defaults to now.
        #[arg(long)]
        as_of: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show the applications with the most time, plus everything else.
    Chart {
        /// Number of applications shown individually.
        #[arg(long)]
        top: Option<usize>,

        /// Credit the open visit up to this time. Defaults to now.
        #[arg(long)]
        as_of: Option<String>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Print timeline rows for the current session as JSON.
    Timeline {
        /// Close the open visit at this time so it is included.
        #[arg(long)]
        as_of: Option<String>,
    },

    /// Upgrade a saved statistics payload to the current schema.
    Migrate {
        /// Payload file. Reads stdin when omitted.
        file: Option<PathBuf>,
    },
}

/// Session subcommands.
#[derive(Debug, Subcommand)]
pub enum SessionAction {
    /// Start a new session; it becomes the current one.
    Start {
        /// Session start time. Defaults to now.
        #[arg(long)]
        at: Option<String>,
    },
    /// Show the current session.
    Current,
}
