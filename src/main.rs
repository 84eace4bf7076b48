//! Switchboard CLI binary entry point.

use clap::Parser;
use switchboard::cli::{commands, Cli, Commands};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("switchboard=info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let result = match cli.command {
        Commands::Chat(args) => commands::handle_chat(args).await,
        Commands::Key(args) => commands::handle_key(args.command),
        Commands::Tools => commands::handle_tools(),
        Commands::Submissions(args) => commands::handle_submissions(args.command),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e.user_message());
        std::process::exit(1);
    }
}
