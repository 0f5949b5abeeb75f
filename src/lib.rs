use thiserror::Error;

pub type Result<T> = std::result::Result<T, RagError>;

#[derive(Error, Debug)]
pub enum RagError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

pub mod commands;
pub mod config;
pub mod conversation;
pub mod corpus;
pub mod database;
pub mod embeddings;
pub mod engine;
pub mod generator;
pub mod index;
pub mod retriever;

#[cfg(test)]
pub(crate) mod test_support;
