//! Command-line argument definitions.

use std::path::PathBuf;

use chrono::NaiveDateTime;
use clap::{Parser, Subcommand};

/// Reminder text parser.
///
/// Extracts a reminder time and task from free text such as
/// "нагадай завтра о 15:30 купити хліб".
#[derive(Debug, Parser)]
#[command(name = "remind", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Resolve relative to this local time instead of the current one
    /// (e.g. 2025-03-14T10:00:00).
    #[arg(long, global = true, value_parser = parse_now)]
    pub now: Option<NaiveDateTime>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Parse text with the labeler, falling back to patterns.
    Parse {
        text: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,

        /// Inference deadline in seconds (overrides config).
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Parse text with the pattern fallback only.
    Fallback {
        text: String,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Resolve entities produced elsewhere against the text.
    Resolve {
        text: String,

        /// JSON array of {label, start, end, text} objects.
        #[arg(long)]
        entities: PathBuf,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show how text is encoded for the labeler.
    Tokenize {
        text: String,

        /// Tokenizer vocabulary JSON.
        #[arg(long)]
        vocab: PathBuf,

        /// Sequence length (overrides config).
        #[arg(long)]
        max_length: Option<usize>,

        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show configured assets and labeler state.
    Status,
}

fn parse_now(value: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(value, "%Y-%m-%d %H:%M"))
}
