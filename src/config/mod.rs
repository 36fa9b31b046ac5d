// Configuration management module
// This module handles TOML configuration loading, validation and defaults

pub mod settings;

pub use settings::{
    ChunkingConfig, Config, ConfigError, EventConfig, OllamaConfig, RetrievalConfig,
};

/// Get the default data directory for the application
#[inline]
pub fn get_data_dir() -> Result<std::path::PathBuf, ConfigError> {
    dirs::data_local_dir()
        .map(|dir| dir.join("eventrag"))
        .ok_or(ConfigError::DirectoryError)
}
