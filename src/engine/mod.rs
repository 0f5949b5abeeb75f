//! Wires the index, retriever, generator and conversation store together


use std::num::NonZeroUsize;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::config::{Config, ConfigError};
use crate::conversation::{ConversationId, ConversationStore, HistoryEntry};
use crate::database::Database;
use crate::embeddings::{ChatModel, EmbeddingModel, OllamaClient};
use crate::generator::{Answer, AnswerGenerator, RetryPolicy};
use crate::index::{CorpusSource, EmbeddingIndex, IndexOrigin};
use crate::retriever::{CacheStats, Retriever};

/// Reply used by [`RagEngine::summarize`] for a conversation with no entries
pub const EMPTY_HISTORY_REPLY: &str = "No conversation history to summarize yet.";

pub struct RagEngine {
    generator: Arc<AnswerGenerator>,
    conversations: ConversationStore,
    history_exchanges: usize,
}

impl RagEngine {
    /// Connect to the chunk store and Ollama, then load or build the index once
    #[inline]
    pub async fn open(config: &Config) -> Result<(Self, IndexOrigin)> {
        let client = Arc::new(
            OllamaClient::new(&config.ollama).context("Failed to create Ollama client")?,
        );
        info!(
            "Using embedding model {} and chat model {}",
            client.embedding_model(),
            client.chat_model()
        );

        let database = Database::new(config.database_path())
            .await
            .context("Failed to initialize database")?;

        let corpus = CorpusSource::new(&config.corpus, config.chunking);
        let (index, origin) = EmbeddingIndex::load_or_build(&database, client.as_ref(), &corpus)
            .await
            .context("Failed to prepare the embedding index")?;

        let embedder = Arc::clone(&client) as Arc<dyn EmbeddingModel>;
        let engine = Self::from_parts(index, embedder, client, config)?;
        Ok((engine, origin))
    }

    /// Assemble an engine around an existing index and model handles
    #[inline]
    pub fn from_parts(
        index: EmbeddingIndex,
        embedder: Arc<dyn EmbeddingModel>,
        chat: Arc<dyn ChatModel>,
        config: &Config,
    ) -> Result<Self> {
        let capacity = NonZeroUsize::new(config.retrieval.cache_capacity).ok_or(
            ConfigError::InvalidCacheCapacity(config.retrieval.cache_capacity),
        )?;

        let retriever = Arc::new(Retriever::new(Arc::new(index), embedder, capacity));
        let generator = AnswerGenerator::new(
            retriever,
            chat,
            config.retrieval.top_k,
            RetryPolicy::from(&config.generation),
        );

        Ok(Self {
            generator: Arc::new(generator),
            conversations: ConversationStore::new(),
            history_exchanges: config.generation.history_exchanges,
        })
    }

    /// Answer `query` within a conversation and record the exchange.
    ///
    /// Calls on the same conversation run one after another; the history read
    /// for the prompt always includes every exchange recorded before it.
    #[inline]
    pub async fn ask(&self, id: &ConversationId, query: &str) -> Result<Answer> {
        let mut conversation = self.conversations.lock(id).await;
        let history = conversation.recent_text(self.history_exchanges);
        debug!(
            "Answering in conversation {} with {} prior entries",
            id,
            conversation.entries().len()
        );

        let generator = Arc::clone(&self.generator);
        let question = query.to_string();
        let answer =
            tokio::task::spawn_blocking(move || generator.generate_answer(&question, &history))
                .await
                .context("Answer generation task failed")?;

        conversation.record_exchange(query, &answer.text);
        Ok(answer)
    }

    /// Three-point summary of a conversation's full transcript
    #[inline]
    pub async fn summarize(&self, id: &ConversationId) -> Result<String> {
        let conversation = self.conversations.lock(id).await;
        if conversation.is_empty() {
            return Ok(EMPTY_HISTORY_REPLY.to_string());
        }

        let generator = Arc::clone(&self.generator);
        let transcript = conversation.transcript();
        tokio::task::spawn_blocking(move || generator.summarize(&transcript))
            .await
            .context("Summary task failed")
    }

    #[inline]
    pub async fn history(&self, id: &ConversationId) -> Vec<HistoryEntry> {
        self.conversations.entries(id).await
    }

    #[inline]
    pub fn index_len(&self) -> usize {
        self.generator.retriever().index().len()
    }

    #[inline]
    pub fn cache_stats(&self) -> CacheStats {
        self.generator.retriever().cache_stats()
    }
}
