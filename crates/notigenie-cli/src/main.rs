use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod bootstrap;
mod commands;

use bootstrap::AppBootstrap;

#[derive(Parser)]
#[command(name = "notigenie")]
#[command(about = "NotiGenie - natural-language requests against your Notion databases", long_about = None)]
struct Cli {
    /// Path to config.toml (defaults to ~/.config/notigenie/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Send one request and print the reply
    Ask {
        /// The request, e.g. "add milk to my shopping list"
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        /// Conversation session id
        #[arg(long, default_value = commands::DEFAULT_SESSION)]
        session: String,

        /// Current date override (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Interactive conversation
    Chat {
        /// Conversation session id
        #[arg(long, default_value = commands::DEFAULT_SESSION)]
        session: String,
    },
    /// List registered database schemas
    Schemas,
    /// Print open todos and recently finished ones as JSON
    Digest {
        /// Date to build the digest for (YYYY-MM-DD)
        #[arg(long)]
        date: Option<String>,
    },
    /// Check configuration, credentials and the record store connection
    Check,
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let app = AppBootstrap::load(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Ask {
            text,
            session,
            date,
        } => commands::ask::run(&app, &text.join(" "), &session, date.as_deref()).await?,
        Commands::Chat { session } => commands::chat::run(&app, &session).await?,
        Commands::Schemas => commands::schemas::run(&app),
        Commands::Digest { date } => commands::digest::run(&app, date.as_deref()).await?,
        Commands::Check => commands::check::run(&app).await?,
    }

    Ok(())
}
