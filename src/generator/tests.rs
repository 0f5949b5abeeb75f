use std::num::NonZeroUsize;

use super::*;
use crate::corpus::Chunk;
use crate::index::EmbeddingIndex;
use crate::test_support::{FailingEmbedder, KeywordEmbedder, ScriptedChat};

fn chunk(source: &str, text: &str) -> Chunk {
    Chunk {
        source: source.to_string(),
        text: text.to_string(),
    }
}

fn no_delay() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        delay: Duration::ZERO,
    }
}

fn retriever(chunks: Vec<Chunk>) -> Arc<Retriever> {
    let embedder = Arc::new(KeywordEmbedder::finance());
    let index = EmbeddingIndex::build(chunks, embedder.as_ref()).expect("should build");
    Arc::new(Retriever::new(
        Arc::new(index),
        embedder,
        NonZeroUsize::new(16).expect("non-zero"),
    ))
}

fn allocation_retriever() -> Arc<Retriever> {
    retriever(vec![
        chunk("a.md", "Fixed income target is 40%."),
        chunk("b.md", "Equity target is 60%."),
    ])
}

fn generator(chat: &Arc<ScriptedChat>, top_k: usize) -> AnswerGenerator {
    AnswerGenerator::new(allocation_retriever(), chat.clone(), top_k, no_delay())
}

fn busy() -> ChatError {
    ChatError::Unavailable("503 Service Unavailable".to_string())
}

#[test]
fn answers_with_sources_of_retrieved_chunks() {
    let chat = Arc::new(ScriptedChat::always(Ok("60%".to_string())));
    let generator = generator(&chat, 1);

    let answer = generator.generate_answer("equity target", "");

    assert_eq!(answer.text, "60%");
    assert_eq!(answer.sources, BTreeSet::from(["b.md".to_string()]));
    assert_eq!(answer.status, AnswerStatus::Answered { attempts: 1 });

    let prompts = chat.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("Source: b.md\nEquity target is 60%."));
    assert!(!prompts[0].contains("a.md"));
}

#[test]
fn sources_are_distinct() {
    let chat = Arc::new(ScriptedChat::always(Ok("ok".to_string())));
    let generator = AnswerGenerator::new(
        retriever(vec![
            chunk("b.md", "Equity target"),
            chunk("b.md", "equity is 60"),
            chunk("a.md", "fixed income"),
        ]),
        chat.clone(),
        3,
        no_delay(),
    );

    let answer = generator.generate_answer("equity", "");

    assert_eq!(
        answer.sources,
        BTreeSet::from(["a.md".to_string(), "b.md".to_string()])
    );
}

#[test]
fn history_is_included_in_prompt() {
    let chat = Arc::new(ScriptedChat::always(Ok("ok".to_string())));
    let generator = generator(&chat, 1);

    generator.generate_answer("and equity?", "User: fixed income?\nBot: 40%");

    assert!(chat.prompts()[0].contains("Conversation History:\nUser: fixed income?\nBot: 40%\n"));
}

#[test]
fn transient_failures_exhaust_attempts() {
    let chat = Arc::new(ScriptedChat::always(Err(busy())));
    let generator = generator(&chat, 1);

    let answer = generator.generate_answer("equity target", "");

    assert_eq!(chat.attempts(), 3);
    assert_eq!(answer.status, AnswerStatus::Failed { attempts: 3 });
    assert!(answer.text.starts_with("Error contacting LLM: "));
    assert!(answer.sources.is_empty());
}

#[test]
fn permanent_failure_is_not_retried() {
    let chat = Arc::new(ScriptedChat::always(Err(ChatError::Failed(
        "model not found".to_string(),
    ))));
    let generator = generator(&chat, 1);

    let answer = generator.generate_answer("equity target", "");

    assert_eq!(chat.attempts(), 1);
    assert_eq!(answer.status, AnswerStatus::Failed { attempts: 1 });
    assert_eq!(answer.text, "Error contacting LLM: model not found");
}

#[test]
fn recovers_after_transient_failure() {
    let chat = Arc::new(ScriptedChat::scripted(
        vec![Err(busy())],
        Ok("60%".to_string()),
    ));
    let generator = generator(&chat, 1);

    let answer = generator.generate_answer("equity target", "");

    assert_eq!(answer.text, "60%");
    assert_eq!(answer.status, AnswerStatus::Answered { attempts: 2 });
    assert_eq!(answer.attempts(), 2);
    // Every attempt sends the same prompt
    let prompts = chat.prompts();
    assert_eq!(prompts[0], prompts[1]);
}

#[test]
fn single_attempt_policy_never_retries() {
    let chat = Arc::new(ScriptedChat::always(Err(busy())));
    let generator = AnswerGenerator::new(
        allocation_retriever(),
        chat.clone(),
        1,
        RetryPolicy {
            max_attempts: 1,
            delay: Duration::ZERO,
        },
    );

    let answer = generator.generate_answer("equity target", "");

    assert_eq!(chat.attempts(), 1);
    assert!(!answer.is_answered());
}

#[test]
fn empty_index_prompts_with_marker() {
    let chat = Arc::new(ScriptedChat::always(Ok(
        "I don't have information on that.".to_string()
    )));
    let generator = AnswerGenerator::new(retriever(Vec::new()), chat.clone(), 3, no_delay());

    let answer = generator.generate_answer("What is the equity target?", "");

    assert!(answer.is_answered());
    assert!(answer.sources.is_empty());
    assert!(chat.prompts()[0].contains("Context:\nNo relevant context found.\n"));
}

#[test]
fn retrieval_failure_skips_model() {
    let index = EmbeddingIndex::from_parts(vec![chunk("a.md", "x")], vec![vec![1.0]])
        .expect("valid parts");
    let retriever = Arc::new(Retriever::new(
        Arc::new(index),
        Arc::new(FailingEmbedder),
        NonZeroUsize::new(4).expect("non-zero"),
    ));
    let chat = Arc::new(ScriptedChat::always(Ok("unused".to_string())));
    let generator = AnswerGenerator::new(retriever, chat.clone(), 3, no_delay());

    let answer = generator.generate_answer("anything", "");

    assert_eq!(chat.attempts(), 0);
    assert_eq!(answer.status, AnswerStatus::Failed { attempts: 0 });
    assert!(answer.text.starts_with("Error retrieving context: "));
    assert!(answer.sources.is_empty());
}

#[test]
fn summarize_uses_summary_prompt() {
    let chat = Arc::new(ScriptedChat::always(Ok("- point".to_string())));
    let generator = generator(&chat, 1);

    let summary = generator.summarize("User: hi\nBot: hello");

    assert_eq!(summary, "- point");
    assert_eq!(
        chat.prompts(),
        vec!["Summarize the following conversation in 3 bullet points:\n\nUser: hi\nBot: hello"]
    );
}

#[test]
fn summarize_reports_failure_as_text() {
    let chat = Arc::new(ScriptedChat::always(Err(busy())));
    let generator = generator(&chat, 1);

    let summary = generator.summarize("User: hi\nBot: hello");

    assert!(summary.starts_with("Error contacting LLM: "));
    assert_eq!(chat.attempts(), 3);
}

#[test]
fn policy_from_config() {
    let config = GenerationConfig {
        max_attempts: 0,
        retry_delay_ms: 250,
        history_exchanges: 3,
    };

    let policy = RetryPolicy::from(&config);

    assert_eq!(policy.max_attempts, 1);
    assert_eq!(policy.delay, Duration::from_millis(250));
}
