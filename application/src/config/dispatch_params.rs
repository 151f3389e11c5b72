//! Dispatch parameters: per-item responder call control.
//!
//! [`DispatchParams`] groups the static parameters that control how
//! [`DispatchBatchUseCase`](crate::use_cases::dispatch_batch::DispatchBatchUseCase)
//! calls the responder. These are application-layer concerns, not domain policy.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Responder call control parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchParams {
    /// Upper bound on a single responder call. `None` waits indefinitely.
    pub responder_timeout: Option<Duration>,
    /// Keep only this many most recent history messages in the context.
    pub history_limit: Option<usize>,
}

impl Default for DispatchParams {
    fn default() -> Self {
        Self {
            responder_timeout: Some(Duration::from_secs(120)),
            history_limit: None,
        }
    }
}

impl DispatchParams {
    // ==================== Builder Methods ====================

    pub fn with_responder_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.responder_timeout = timeout;
        self
    }

    pub fn with_history_limit(mut self, limit: Option<usize>) -> Self {
        self.history_limit = limit;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let params = DispatchParams::default();
        assert_eq!(params.responder_timeout, Some(Duration::from_secs(120)));
        assert_eq!(params.history_limit, None);
    }

    #[test]
    fn test_builder_chain() {
        let params = DispatchParams::default()
            .with_responder_timeout(None)
            .with_history_limit(Some(3));
        assert_eq!(params.responder_timeout, None);
        assert_eq!(params.history_limit, Some(3));
    }
}
