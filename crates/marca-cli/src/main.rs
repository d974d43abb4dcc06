//! Marca terminal client entry point.
//!
//! Binary name: `marca`
//!
//! Parses CLI arguments, initializes tracing, storage and the backend client,
//! then dispatches to the command handler.

mod cli;
mod state;

use clap::Parser;
use clap_complete::generate;
use marca_observe::{TracingOptions, init_tracing, shutdown_tracing};

use cli::{Cli, Commands};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let options = TracingOptions::from_verbosity(cli.verbose, cli.quiet).with_otel(cli.otel);
    init_tracing(&options).map_err(|e| anyhow::anyhow!("failed to initialize tracing: {e}"))?;

    let result = run(cli).await;
    shutdown_tracing();
    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    // Shell completions don't need app state
    if let Commands::Completions { shell } = &cli.command {
        let mut cmd = <Cli as clap::CommandFactory>::command();
        generate(*shell, &mut cmd, "marca", &mut std::io::stdout());
        return Ok(());
    }

    let state = AppState::init().await?;

    match cli.command {
        Commands::New { title } => {
            cli::conversation::new_conversation(&state, title, cli.json).await?;
        }
        Commands::List => {
            cli::conversation::list_conversations(&state, cli.json).await?;
        }
        Commands::Delete { id, force } => {
            cli::conversation::delete_conversation(&state, &id, force, cli.json).await?;
        }
        Commands::History { id } => {
            cli::conversation::show_history(&state, &id, cli.json).await?;
        }
        Commands::Send { id, text, images } => {
            cli::conversation::send_turn(&state, &id, &text, &images, cli.json).await?;
        }
        Commands::Chat { id } => {
            cli::chat::loop_runner::run_chat_loop(&state, id.as_deref()).await?;
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }

    Ok(())
}
