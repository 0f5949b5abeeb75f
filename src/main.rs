use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use mini_rag::Result;
use mini_rag::commands::{ask_question, build_index, question_from_args, run_chat, show_status};
use mini_rag::config::{Config, resolve_config_dir, run_interactive_config, show_config};

#[derive(Parser)]
#[command(name = "mini-rag")]
#[command(about = "Ask questions about a folder of documents using a local Ollama model")]
#[command(version)]
struct Cli {
    /// Directory holding config.toml and the index store
    #[arg(long, global = true, env = "MINI_RAG_CONFIG_DIR")]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Configure Ollama connection and corpus settings
    Config {
        /// Show current configuration
        #[arg(long)]
        show: bool,
    },
    /// Build the index from the corpus, or load it if it already exists
    Index,
    /// Ask a single question
    Ask {
        /// The question to answer
        question: Vec<String>,
    },
    /// Start an interactive chat session
    Chat,
    /// Show the index store, Ollama availability and configuration paths
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config_dir = resolve_config_dir(cli.config_dir.as_deref())?;

    match cli.command {
        Commands::Config { show } => {
            if show {
                show_config(&config_dir)?;
            } else {
                run_interactive_config(&config_dir)?;
            }
        }
        Commands::Index => {
            build_index(&load_config(&config_dir)?).await?;
        }
        Commands::Ask { question } => {
            let question = question_from_args(&question)?;
            ask_question(&load_config(&config_dir)?, &question).await?;
        }
        Commands::Chat => {
            run_chat(&load_config(&config_dir)?).await?;
        }
        Commands::Status => {
            show_status(&load_config(&config_dir)?).await?;
        }
    }

    Ok(())
}

fn load_config(config_dir: &std::path::Path) -> Result<Config> {
    Ok(Config::load(config_dir).context("Failed to load configuration")?)
}
