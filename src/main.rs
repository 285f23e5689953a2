mod cli;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use nomic_client::config;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "nomic", version, about = "Embedding request builder and local GPT4All chat")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Chat with the local GPT4All model over stdin/stdout
    Chat {
        /// Weights to load (defaults to the configured chat model)
        #[arg(long)]
        model: Option<String>,
        /// Re-download the executable and weights even if present
        #[arg(long)]
        force_download: bool,
        /// Print responses only once complete instead of streaming them
        #[arg(long)]
        no_echo: bool,
    },
    /// Manage downloaded artifacts
    Model {
        #[command(subcommand)]
        action: ModelAction,
    },
    /// Tokenize texts and write one binary inference request per batch
    EmbedRequest {
        /// JSON array of strings (or nulls), or plain text with one entry per line
        input: PathBuf,
        /// Directory to write request bodies into
        #[arg(long)]
        out: PathBuf,
        /// Texts per request (defaults to the configured batch size)
        #[arg(long)]
        batch_size: Option<usize>,
    },
    /// List known embedding and chat models
    Models,
}

#[derive(Subcommand)]
enum ModelAction {
    /// Download the chat executable, chat weights, and tokenizer to ~/.nomic/
    Download {
        /// Re-download even if files already exist
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load config (for log level)
    let config = config::NomicConfig::load()?;

    // Log to stderr so stdout stays clean for chat output.
    let filter = EnvFilter::try_new(&config.logging.log_level)
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Command::Chat {
            model,
            force_download,
            no_echo,
        } => {
            cli::chat::chat(&config, model.as_deref(), force_download, !no_echo).await?;
        }
        Command::Model { action } => match action {
            ModelAction::Download { force } => {
                cli::model_download(&config, force).await?;
            }
        },
        Command::EmbedRequest {
            input,
            out,
            batch_size,
        } => {
            cli::embed_request::embed_request(&config, &input, &out, batch_size)?;
        }
        Command::Models => {
            cli::models::models();
        }
    }

    Ok(())
}
