#![expect(
    clippy::tests_outside_test_module,
    reason = "integration tests are only compiled in test mode"
)]

// Integration tests that require a local Ollama instance
// Run with: cargo test --test integration_ollama -- --ignored

use std::env;
use std::time::Duration;

use mini_rag::config::OllamaConfig;
use mini_rag::embeddings::{ChatMessage, ChatModel, EmbeddingModel, OllamaClient, dot, normalize};
use tracing::{debug, info};

const DEFAULT_OLLAMA_HOST: &str = "localhost";
const DEFAULT_OLLAMA_PORT: u16 = 11434;

fn create_integration_test_client() -> OllamaClient {
    let defaults = OllamaConfig::default();
    let host = env::var("OLLAMA_HOST").unwrap_or_else(|_| DEFAULT_OLLAMA_HOST.to_string());
    let port = env::var("OLLAMA_PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(DEFAULT_OLLAMA_PORT);
    let chat_model = env::var("OLLAMA_MODEL").unwrap_or_else(|_| defaults.chat_model.clone());

    let config = OllamaConfig {
        host,
        port,
        chat_model,
        batch_size: 2,
        ..defaults
    };

    OllamaClient::new(&config)
        .expect("Failed to create Ollama client")
        .with_timeout(Duration::from_secs(120))
        .with_retry_attempts(3)
}

fn init_test_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter("debug")
        .with_test_writer()
        .try_init()
        .ok();
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_health_check() {
    init_test_tracing();

    let client = create_integration_test_client();

    let result = client.health_check();

    assert!(
        result.is_ok(),
        "Health check should succeed with local Ollama: {:?}",
        result
    );
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_list_models() {
    init_test_tracing();

    let client = create_integration_test_client();

    let models = client.list_models().expect("model listing should succeed");
    assert!(
        !models.is_empty(),
        "Should have at least one model available"
    );

    for model in &models {
        debug!("Available model: {} (size: {:?})", model.name, model.size);
    }
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_batch_embeddings() {
    init_test_tracing();

    let client = create_integration_test_client();

    let texts = vec![
        "Fixed income target is 40%.".to_string(),
        "Equity target is 60%.".to_string(),
        "The risk committee meets quarterly.".to_string(),
    ];

    let embeddings = client
        .embed_batch(&texts)
        .expect("batch embedding should succeed");

    assert_eq!(embeddings.len(), texts.len());
    let dimension = embeddings[0].len();
    assert!(dimension > 0);
    assert!(embeddings.iter().all(|e| e.len() == dimension));

    info!("Generated {} embeddings with {} dimensions", embeddings.len(), dimension);
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_embeddings_are_deterministic() {
    init_test_tracing();

    let client = create_integration_test_client();

    let mut first = client.embed("Equity target is 60%.").expect("should embed");
    let mut second = client.embed("Equity target is 60%.").expect("should embed");
    normalize(&mut first);
    normalize(&mut second);

    assert!((dot(&first, &second) - 1.0).abs() < 1e-4);
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_chat() {
    init_test_tracing();

    let client = create_integration_test_client();

    let reply = client
        .chat(&[ChatMessage::user("Reply with the single word: ready")])
        .expect("chat should succeed");

    assert!(!reply.trim().is_empty());
    info!("Chat model replied: {}", reply);
}

#[test]
#[ignore = "requires a running Ollama instance"]
fn real_ollama_unknown_chat_model_fails() {
    init_test_tracing();

    let config = OllamaConfig {
        chat_model: "definitely-not-a-real-model:latest".to_string(),
        ..OllamaConfig::default()
    };
    let client = OllamaClient::new(&config).expect("Failed to create Ollama client");

    let error = client
        .chat(&[ChatMessage::user("hello")])
        .expect_err("unknown model should fail");

    assert!(!error.is_transient());
}
