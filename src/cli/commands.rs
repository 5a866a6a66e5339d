use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// `edubot` - grounded tutoring chatbot for course material.
#[derive(Parser, Debug)]
#[command(name = "edubot")]
#[command(version)]
#[command(about = "A course-material tutor that answers from your documents.", long_about = None)]
pub struct Cli {
    /// Log at debug level
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Ingest documents and ask a single question about them
    Ask {
        /// Text file to ingest before answering (repeatable)
        #[arg(long = "doc", value_name = "FILE")]
        docs: Vec<PathBuf>,

        /// Collection the documents are stored in
        #[arg(long, default_value = "default")]
        collection: String,

        /// Chatbot system prompt
        #[arg(long)]
        system: Option<String>,

        /// Show learning progress after the answer
        #[arg(long)]
        progress: bool,

        /// The question
        question: String,
    },

    /// Ingest documents and start an interactive tutoring session
    Chat {
        /// Text file to ingest before the session starts (repeatable)
        #[arg(long = "doc", value_name = "FILE")]
        docs: Vec<PathBuf>,

        /// Collection the documents are stored in
        #[arg(long, default_value = "default")]
        collection: String,

        /// Chatbot system prompt
        #[arg(long)]
        system: Option<String>,
    },

    /// Print the chunks a document would be split into
    Chunk {
        /// Maximum chunk length in characters (default: ingestion.max_chunk_chars)
        #[arg(long)]
        max_len: Option<usize>,

        /// Text file to split
        file: PathBuf,
    },

    /// Inspect configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Print the effective configuration (API key masked)
    Show,
    /// Print the config file location
    Path,
}
