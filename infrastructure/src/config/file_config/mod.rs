//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into domain and
//! application types by the binary.

mod batch;
mod memory;
mod providers;
mod responder;
mod server;

pub use batch::FileBatchConfig;
pub use memory::{FileMemoryConfig, MemoryBackend};
pub use providers::{FileAnthropicConfig, FileOpenAiConfig, FileProvidersConfig};
pub use responder::{FileResponderConfig, ResponderKind};
pub use server::FileServerConfig;

use counsel_domain::{DomainError, UserDirectory};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

/// Configuration validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigValidationError {
    #[error("batch.max_size cannot be 0")]
    ZeroBatchSize,

    #[error("batch.max_wait_ms cannot be 0")]
    ZeroBatchWait,

    #[error("batch.max_pending cannot be 0")]
    ZeroMaxPending,

    #[error("responder.timeout_seconds cannot be 0")]
    InvalidTimeout,

    #[error("user names and role labels cannot be empty")]
    EmptyUserEntry,

    #[error("[users] must register at least one user")]
    EmptyUserTable,

    #[error("server.host cannot be empty")]
    EmptyHost,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// HTTP listener
    pub server: FileServerConfig,
    /// Batch closing policy and admission cap
    pub batch: FileBatchConfig,
    /// Conversation memory backend
    pub memory: FileMemoryConfig,
    /// Responder selection and call limits
    pub responder: FileResponderConfig,
    /// Provider endpoints and credentials
    pub providers: FileProvidersConfig,
    /// Registered users and their role labels. When absent the built-in
    /// table (Linda, Miguel, Mike) is used.
    pub users: Option<BTreeMap<String, String>>,
}

impl FileConfig {
    /// Validate the entire configuration, returning every detected issue.
    pub fn validate(&self) -> Vec<ConfigValidationError> {
        let mut issues = Vec::new();

        if self.server.host.trim().is_empty() {
            issues.push(ConfigValidationError::EmptyHost);
        }
        if self.batch.max_size == 0 {
            issues.push(ConfigValidationError::ZeroBatchSize);
        }
        if self.batch.max_wait_ms == 0 {
            issues.push(ConfigValidationError::ZeroBatchWait);
        }
        if self.batch.max_pending == Some(0) {
            issues.push(ConfigValidationError::ZeroMaxPending);
        }
        if self.responder.timeout_seconds == Some(0) {
            issues.push(ConfigValidationError::InvalidTimeout);
        }

        if let Some(users) = &self.users {
            if users.is_empty() {
                issues.push(ConfigValidationError::EmptyUserTable);
            }
            if users
                .iter()
                .any(|(user, role)| user.trim().is_empty() || role.trim().is_empty())
            {
                issues.push(ConfigValidationError::EmptyUserEntry);
            }
        }

        issues
    }

    /// Build the user directory from `[users]`, or the built-in table.
    pub fn directory(&self) -> Result<UserDirectory, DomainError> {
        match &self.users {
            Some(users) => {
                UserDirectory::new(users.iter().map(|(u, r)| (u.as_str(), r.as_str())))
            }
            None => Ok(UserDirectory::default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_deserialize_full_config() {
        let toml_str = r#"
[server]
host = "127.0.0.1"
port = 9000

[batch]
max_size = 5
max_wait_ms = 500
max_pending = 64

[memory]
backend = "snapshot"
path = "/tmp/memory.json"

[responder]
kind = "openai"
model = "llama-3.2-1b"
history_limit = 3

[providers.openai]
base_url = "http://localhost:8081"
require_api_key = false

[users]
Ana = "Researcher"
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.server.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.batch.max_size, 5);
        assert_eq!(config.batch.max_pending, Some(64));
        assert_eq!(config.memory.backend, MemoryBackend::Snapshot);
        assert_eq!(
            config.memory.resolved_path(),
            PathBuf::from("/tmp/memory.json")
        );
        assert_eq!(config.responder.kind, ResponderKind::Openai);
        assert_eq!(config.responder.history_limit, Some(3));
        assert!(!config.providers.openai.require_api_key);
        assert_eq!(config.providers.openai.api_key_env, "OPENAI_API_KEY");

        let directory = config.directory().unwrap();
        assert_eq!(directory.len(), 1);
        assert!(directory.resolve("Ana").is_ok());
        assert!(directory.resolve("Linda").is_err());
    }

    #[test]
    fn test_deserialize_partial_config() {
        let toml_str = r#"
[batch]
max_size = 4
"#;

        let config: FileConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.batch.max_size, 4);
        // Defaults should apply
        assert_eq!(config.batch.max_wait_ms, 2000);
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.responder.timeout_seconds, Some(120));
        assert_eq!(config.memory.backend, MemoryBackend::Jsonl);
        assert!(config.users.is_none());
    }

    #[test]
    fn test_default_config_is_valid() {
        let config = FileConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.directory().unwrap().len(), 3);
    }

    #[test]
    fn test_validate_collects_every_issue() {
        let mut config = FileConfig::default();
        config.batch.max_size = 0;
        config.batch.max_wait_ms = 0;
        config.batch.max_pending = Some(0);
        config.responder.timeout_seconds = Some(0);

        let issues = config.validate();
        assert_eq!(
            issues,
            vec![
                ConfigValidationError::ZeroBatchSize,
                ConfigValidationError::ZeroBatchWait,
                ConfigValidationError::ZeroMaxPending,
                ConfigValidationError::InvalidTimeout,
            ]
        );
    }

    #[test]
    fn test_validate_user_table() {
        let mut config = FileConfig {
            users: Some(BTreeMap::new()),
            ..Default::default()
        };
        assert_eq!(config.validate(), vec![ConfigValidationError::EmptyUserTable]);

        config.users = Some(BTreeMap::from([("Ana".to_string(), " ".to_string())]));
        assert_eq!(config.validate(), vec![ConfigValidationError::EmptyUserEntry]);
    }
}
