//! Configuration file loading for counsel-gateway
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `COUNSEL_*` environment variables
//! 2. `--config <path>` specified file
//! 3. Project root: `./counsel.toml` or `./.counsel.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/counsel-gateway/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    ConfigValidationError, FileAnthropicConfig, FileBatchConfig, FileConfig, FileMemoryConfig,
    FileOpenAiConfig, FileProvidersConfig, FileResponderConfig, FileServerConfig, MemoryBackend,
    ResponderKind,
};
pub use loader::ConfigLoader;
