//! Conversation memory configuration (`[memory]` section)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Storage backend for conversation memory
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemoryBackend {
    /// Append-only operation log (crash safe)
    #[default]
    Jsonl,
    /// Single JSON object rewritten atomically per mutation
    Snapshot,
    /// Not persisted
    Memory,
}

impl fmt::Display for MemoryBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemoryBackend::Jsonl => write!(f, "jsonl"),
            MemoryBackend::Snapshot => write!(f, "snapshot"),
            MemoryBackend::Memory => write!(f, "memory"),
        }
    }
}

impl std::str::FromStr for MemoryBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "jsonl" | "log" => Ok(MemoryBackend::Jsonl),
            "snapshot" | "json" => Ok(MemoryBackend::Snapshot),
            "memory" | "none" => Ok(MemoryBackend::Memory),
            other => Err(format!(
                "unknown memory backend '{}' (expected jsonl, snapshot or memory)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileMemoryConfig {
    pub backend: MemoryBackend,
    /// Storage file; defaults depend on the backend
    pub path: Option<PathBuf>,
}

impl FileMemoryConfig {
    pub fn resolved_path(&self) -> PathBuf {
        match &self.path {
            Some(path) => path.clone(),
            None => match self.backend {
                MemoryBackend::Snapshot => PathBuf::from("conversation_memory.json"),
                _ => PathBuf::from("conversation_memory.jsonl"),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_from_str() {
        assert_eq!("JSONL".parse::<MemoryBackend>().unwrap(), MemoryBackend::Jsonl);
        assert_eq!("json".parse::<MemoryBackend>().unwrap(), MemoryBackend::Snapshot);
        assert!("sqlite".parse::<MemoryBackend>().is_err());
    }

    #[test]
    fn test_default_paths_follow_backend() {
        let mut config = FileMemoryConfig::default();
        assert_eq!(config.resolved_path(), PathBuf::from("conversation_memory.jsonl"));

        config.backend = MemoryBackend::Snapshot;
        assert_eq!(config.resolved_path(), PathBuf::from("conversation_memory.json"));

        config.path = Some(PathBuf::from("/var/lib/counsel/memory.json"));
        assert_eq!(config.resolved_path(), PathBuf::from("/var/lib/counsel/memory.json"));
    }
}
