// Configuration management module
// TOML settings plus the interactive setup flow

pub mod interactive;
pub mod settings;


pub use interactive::{run_interactive_config, show_config};
pub use settings::{
    CHAT_MODEL_ENV, ChunkingConfig, Config, ConfigError, CorpusConfig, GenerationConfig,
    OllamaConfig, RetrievalConfig,
};

/// Resolve the configuration directory, preferring an explicit override
#[inline]
pub fn resolve_config_dir(
    override_dir: Option<&std::path::Path>,
) -> Result<std::path::PathBuf, ConfigError> {
    override_dir.map_or_else(Config::config_dir, |dir| Ok(dir.to_path_buf()))
}
