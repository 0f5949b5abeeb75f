//! Answer generation
//!
//! One retrieval, one deterministic prompt, then the chat model behind a
//! bounded retry loop. Failures never escape as errors: they come back as an
//! [`Answer`] whose text explains what went wrong.

pub mod prompt;

#[cfg(test)]
mod tests;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::GenerationConfig;
use crate::embeddings::{ChatError, ChatMessage, ChatModel};
use crate::retriever::Retriever;

pub use prompt::{NO_CONTEXT_MARKER, build_prompt, build_summary_prompt};

/// How many times to call the chat model and how long to wait between calls
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub delay: Duration,
}

impl Default for RetryPolicy {
    #[inline]
    fn default() -> Self {
        Self {
            max_attempts: 3,
            delay: Duration::from_secs(2),
        }
    }
}

impl From<&GenerationConfig> for RetryPolicy {
    #[inline]
    fn from(config: &GenerationConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            delay: config.retry_delay(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerStatus {
    Answered { attempts: u32 },
    Failed { attempts: u32 },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Answer {
    pub text: String,
    /// Distinct source filenames of the retrieved chunks, empty on failure
    pub sources: BTreeSet<String>,
    pub status: AnswerStatus,
}

impl Answer {
    #[inline]
    pub fn is_answered(&self) -> bool {
        matches!(self.status, AnswerStatus::Answered { .. })
    }

    /// Model calls made while producing this answer
    #[inline]
    pub fn attempts(&self) -> u32 {
        match self.status {
            AnswerStatus::Answered { attempts } | AnswerStatus::Failed { attempts } => attempts,
        }
    }

    fn failed(text: String, attempts: u32) -> Self {
        Self {
            text,
            sources: BTreeSet::new(),
            status: AnswerStatus::Failed { attempts },
        }
    }
}

pub struct AnswerGenerator {
    retriever: Arc<Retriever>,
    chat: Arc<dyn ChatModel>,
    top_k: usize,
    policy: RetryPolicy,
}

impl AnswerGenerator {
    #[inline]
    pub fn new(
        retriever: Arc<Retriever>,
        chat: Arc<dyn ChatModel>,
        top_k: usize,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            retriever,
            chat,
            top_k,
            policy,
        }
    }

    #[inline]
    pub fn retriever(&self) -> &Retriever {
        &self.retriever
    }

    /// Answer `query` from retrieved context and the given history text.
    ///
    /// Blocks for the duration of the model calls and retry delays.
    #[inline]
    pub fn generate_answer(&self, query: &str, history: &str) -> Answer {
        debug!("Retrieving context for query");
        let chunks = match self.retriever.retrieve(query, self.top_k) {
            Ok(chunks) => chunks,
            Err(e) => {
                warn!("Retrieval failed: {:#}", e);
                return Answer::failed(format!("Error retrieving context: {e:#}"), 0);
            }
        };

        let sources: BTreeSet<String> = chunks.iter().map(|c| c.chunk.source.clone()).collect();
        let prompt = build_prompt(query, history, &chunks);
        debug!(
            "Built prompt with {} context chunks from {} sources",
            chunks.len(),
            sources.len()
        );

        match self.call_with_retry(&prompt) {
            (Ok(text), attempts) => Answer {
                text,
                sources,
                status: AnswerStatus::Answered { attempts },
            },
            (Err(e), attempts) => Answer::failed(format!("Error contacting LLM: {e}"), attempts),
        }
    }

    /// Ask the model for a three-point summary of `transcript`, without retrieval
    #[inline]
    pub fn summarize(&self, transcript: &str) -> String {
        match self.call_with_retry(&build_summary_prompt(transcript)) {
            (Ok(text), _) => text,
            (Err(e), _) => format!("Error contacting LLM: {e}"),
        }
    }

    /// Returns the final outcome together with the number of model calls made
    fn call_with_retry(&self, prompt: &str) -> (Result<String, ChatError>, u32) {
        let messages = [ChatMessage::user(prompt)];
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!("Calling chat model (attempt {}/{})", attempt, self.policy.max_attempts);

            match self.chat.chat(&messages) {
                Ok(text) => return (Ok(text), attempt),
                Err(e) if e.is_transient() && attempt < self.policy.max_attempts => {
                    warn!(
                        "Chat model busy, retrying in {:?} (attempt {}/{}): {}",
                        self.policy.delay, attempt, self.policy.max_attempts, e
                    );
                    std::thread::sleep(self.policy.delay);
                }
                Err(e) => {
                    warn!("Chat model call failed after {} attempt(s): {}", attempt, e);
                    return (Err(e), attempt);
                }
            }
        }
    }
}
