//! Batching configuration (`[batch]` section)

use counsel_application::CoordinatorOptions;
use counsel_domain::{BatchPolicy, DomainError};
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileBatchConfig {
    /// Requests per batch before it closes early (default: 3)
    pub max_size: usize,
    /// Milliseconds a batch may wait after its first arrival (default: 2000)
    pub max_wait_ms: u64,
    /// Cap on admitted but unanswered requests (default: unbounded)
    pub max_pending: Option<usize>,
}

impl Default for FileBatchConfig {
    fn default() -> Self {
        Self {
            max_size: 3,
            max_wait_ms: 2000,
            max_pending: None,
        }
    }
}

impl FileBatchConfig {
    pub fn to_policy(&self) -> Result<BatchPolicy, DomainError> {
        BatchPolicy::new(self.max_size, Duration::from_millis(self.max_wait_ms))
    }

    pub fn coordinator_options(&self) -> CoordinatorOptions {
        CoordinatorOptions::default().with_max_pending(self.max_pending)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_matches_policy_default() {
        let policy = FileBatchConfig::default().to_policy().unwrap();
        assert_eq!(policy, BatchPolicy::default());
    }

    #[test]
    fn test_zero_size_is_rejected_by_policy() {
        let config = FileBatchConfig {
            max_size: 0,
            ..Default::default()
        };
        assert!(config.to_policy().is_err());
    }
}
