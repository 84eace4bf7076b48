//! CLI entry point for Switchboard.

pub mod commands;

use clap::{Parser, Subcommand};

/// Switchboard CLI
#[derive(Parser, Debug)]
#[command(
    name = "switchboard",
    version,
    about = "Chat with a streaming model that drives UI tools"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level CLI commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Send one message and stream the reply
    Chat(ChatArgs),
    /// Manage the stored API key
    Key(KeyArgs),
    /// Print the tool catalogue as JSON
    Tools,
    /// Inspect saved form submissions
    Submissions(SubmissionsArgs),
}

/// Arguments for the `chat` subcommand.
#[derive(Parser, Debug)]
pub struct ChatArgs {
    /// Model id (overrides configuration)
    #[arg(short, long)]
    pub model: Option<String>,

    /// API key (overrides OPENROUTER_API_KEY and the stored key)
    #[arg(long)]
    pub api_key: Option<String>,

    /// User message
    pub prompt: String,
}

#[derive(Parser, Debug)]
pub struct KeyArgs {
    #[command(subcommand)]
    pub command: KeyCommands,
}

#[derive(Subcommand, Debug)]
pub enum KeyCommands {
    /// Store an API key
    Set { key: String },
    /// Show the stored key, masked
    Show,
    /// Remove the stored key
    Clear,
}

#[derive(Parser, Debug)]
pub struct SubmissionsArgs {
    #[command(subcommand)]
    pub command: SubmissionCommands,
}

#[derive(Subcommand, Debug)]
pub enum SubmissionCommands {
    /// List saved submissions as JSON
    List,
    /// Delete every saved submission
    Clear,
}
