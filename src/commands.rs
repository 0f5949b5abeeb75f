use std::collections::BTreeSet;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::Input;
use indicatif::{ProgressBar, ProgressStyle};
use itertools::Itertools;
use tracing::{info, warn};

use crate::config::Config;
use crate::conversation::ConversationId;
use crate::database::sqlite::Database;
use crate::embeddings::OllamaClient;
use crate::engine::RagEngine;
use crate::generator::Answer;
use crate::index::IndexOrigin;

const USAGE_HINT: &str =
    "Please provide a question. Example: mini-rag ask What is the risk policy?";

const CHAT_HELP: &str = "Commands:
/summarize - Summarize our conversation so far
/history - Show the conversation so far
/help - Show this message
/quit - Leave the chat

Anything else is sent as a question.";

/// Join the words of a question, rejecting an empty one
#[inline]
pub fn question_from_args(words: &[String]) -> Result<String> {
    let question = words.iter().map(|w| w.trim()).filter(|w| !w.is_empty()).join(" ");
    if question.is_empty() {
        return Err(anyhow::anyhow!(USAGE_HINT));
    }
    Ok(question)
}

fn spinner(message: &str) -> ProgressBar {
    if !console::user_attended_stderr() {
        return ProgressBar::hidden();
    }

    let style = ProgressStyle::with_template("{spinner} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner());
    let bar = ProgressBar::new_spinner().with_style(style);
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

async fn open_engine(config: &Config) -> Result<(RagEngine, IndexOrigin)> {
    let bar = spinner("Preparing index...");
    let result = RagEngine::open(config).await;
    bar.finish_and_clear();
    result
}

fn report_origin(origin: &IndexOrigin) {
    match origin {
        IndexOrigin::Loaded { rows } => {
            println!("📂 Loaded {} chunks from the index store", rows);
        }
        IndexOrigin::Built {
            documents,
            chunks,
            failures,
        } => {
            println!(
                "🧮 Indexed {} documents into {} chunks",
                documents, chunks
            );
            if *chunks == 0 {
                println!(
                    "   {}",
                    style("No documents found. Questions will be answered without context.")
                        .yellow()
                );
            }
            for failure in failures {
                println!(
                    "   ⚠️  Skipped {}: {}",
                    failure.path.display(),
                    failure.reason
                );
            }
        }
    }
}

fn format_sources(sources: &BTreeSet<String>) -> String {
    sources.iter().map(|s| format!("`{}`", s)).join(", ")
}

fn print_answer(answer: &Answer) {
    println!("{}", answer.text);
    if !answer.sources.is_empty() {
        println!();
        println!(
            "📚 {} {}",
            style("Sources:").bold(),
            format_sources(&answer.sources)
        );
    }
}

/// Load the index from the store, or build it from the corpus when the store is empty
#[inline]
pub async fn build_index(config: &Config) -> Result<()> {
    info!("Preparing index from {}", config.corpus.docs_dir.display());

    let (engine, origin) = open_engine(config).await?;
    report_origin(&origin);
    println!("Index ready with {} chunks", engine.index_len());

    Ok(())
}

/// Answer a single question and print it with its sources
#[inline]
pub async fn ask_question(config: &Config, question: &str) -> Result<()> {
    let (engine, origin) = open_engine(config).await?;
    if let IndexOrigin::Built { .. } = origin {
        report_origin(&origin);
        println!();
    }

    let bar = spinner("Thinking...");
    let answer = engine
        .ask(&ConversationId::new("cli"), question)
        .await;
    bar.finish_and_clear();

    print_answer(&answer?);
    Ok(())
}

/// Interactive question loop over a single conversation
#[inline]
pub async fn run_chat(config: &Config) -> Result<()> {
    let (engine, origin) = open_engine(config).await?;
    report_origin(&origin);

    println!();
    println!("{}", style("💬 Ask questions about your documents.").bold().cyan());
    println!("Type /help for commands.");
    println!();

    let conversation = ConversationId::new("chat");

    loop {
        let line = match Input::<String>::new()
            .with_prompt("You")
            .allow_empty(true)
            .interact_text()
        {
            Ok(line) => line,
            Err(e) => {
                warn!("Input closed: {}", e);
                break;
            }
        };

        match line.trim() {
            "" => {}
            "/quit" | "/exit" => break,
            "/help" => println!("{}", CHAT_HELP),
            "/history" => {
                let history = engine.history(&conversation).await;
                if history.is_empty() {
                    println!("No conversation history yet.");
                }
                for entry in history {
                    println!(
                        "{} {}",
                        style(entry.at.format("%H:%M:%S")).dim(),
                        entry
                    );
                }
            }
            "/summarize" => {
                let bar = spinner("Summarizing...");
                let summary = engine.summarize(&conversation).await;
                bar.finish_and_clear();
                println!("📝 {}", style("Summary:").bold());
                println!("{}", summary?);
            }
            question => {
                let bar = spinner("Thinking...");
                let answer = engine.ask(&conversation, question).await;
                bar.finish_and_clear();
                print_answer(&answer?);
            }
        }
        println!();
    }

    let stats = engine.cache_stats();
    info!(
        "Retrieval cache: {} hits, {} misses, {} evictions",
        stats.hits, stats.misses, stats.evictions
    );

    Ok(())
}

/// Open the store only if it is already on disk
async fn open_existing_database(path: &Path) -> Result<Option<Database>> {
    if !path.is_file() {
        return Ok(None);
    }
    Database::new(path).await.map(Some)
}

/// Show the stored index, model availability and configuration paths
#[inline]
pub async fn show_status(config: &Config) -> Result<()> {
    println!("📊 Mini RAG Status Report");
    println!("{}", "=".repeat(50));
    println!();

    println!("🗄️  Index Store:");
    match open_existing_database(&config.database_path()).await {
        Ok(None) => {
            println!("   💤 Index not built yet. Run 'mini-rag index' to build it.");
        }
        Ok(Some(database)) => {
            let count = database
                .count_chunks()
                .await
                .context("Failed to count chunks")?;
            let sources = database
                .source_summaries()
                .await
                .context("Failed to list sources")?;

            println!("   ✅ SQLite: {}", config.database_path().display());
            println!("   🔢 Chunks: {}", count);
            println!("   📄 Sources: {}", sources.len());
            for summary in &sources {
                println!("      {} ({} chunks)", summary.source, summary.chunk_count);
            }
            if count == 0 {
                println!("   💤 Index not built yet. Run 'mini-rag index' to build it.");
            }
        }
        Err(e) => {
            println!("   ❌ SQLite: Failed to open - {}", e);
        }
    }

    println!();
    println!("🤖 Ollama Status:");
    match OllamaClient::new(&config.ollama) {
        Ok(client) => match client.health_check() {
            Ok(()) => {
                println!(
                    "   ✅ Ollama: Connected ({}:{})",
                    config.ollama.host, config.ollama.port
                );
            }
            Err(e) => {
                println!("   ⚠️  Ollama: Unhealthy - {}", e);
            }
        },
        Err(e) => {
            println!("   ❌ Ollama: Failed to connect - {}", e);
        }
    }
    println!("   📋 Embedding Model: {}", config.ollama.embedding_model);
    println!("   📋 Chat Model: {}", config.ollama.chat_model);

    println!();
    println!("📁 Paths:");
    println!("   Config: {}", config.config_file_path().display());
    println!("   Corpus: {}", config.corpus.docs_dir.display());

    Ok(())
}
