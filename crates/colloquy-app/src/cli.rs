use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "colloquy", about = "Conversational middleware between a dialog engine and knowledge search")]
pub struct Cli {
    /// Path to config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Provision collaborators and serve the HTTP API
    Serve,

    /// Print text with sensitive identifiers masked
    Redact {
        /// Text to redact
        text: String,
    },
}
