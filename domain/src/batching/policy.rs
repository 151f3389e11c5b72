//! Batch closing policy (Value Object)

use crate::core::error::DomainError;
use std::fmt;
use std::num::NonZeroUsize;
use std::time::Duration;

/// When an in-progress batch is closed.
///
/// A batch closes as soon as it holds `max_size` requests, or once
/// `max_wait` has elapsed since its first request arrived, whichever
/// happens first.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPolicy {
    max_size: NonZeroUsize,
    max_wait: Duration,
}

impl BatchPolicy {
    pub fn new(max_size: usize, max_wait: Duration) -> Result<Self, DomainError> {
        let max_size = NonZeroUsize::new(max_size).ok_or_else(|| {
            DomainError::InvalidBatchPolicy("max_size must be at least 1".to_string())
        })?;
        if max_wait.is_zero() {
            return Err(DomainError::InvalidBatchPolicy(
                "max_wait must be greater than zero".to_string(),
            ));
        }
        Ok(Self { max_size, max_wait })
    }

    pub fn max_size(&self) -> usize {
        self.max_size.get()
    }

    pub fn max_wait(&self) -> Duration {
        self.max_wait
    }

    /// Whether a batch holding `len` requests must close immediately.
    pub fn is_full(&self, len: usize) -> bool {
        len >= self.max_size.get()
    }
}

impl Default for BatchPolicy {
    fn default() -> Self {
        Self {
            max_size: NonZeroUsize::MIN.saturating_add(2),
            max_wait: Duration::from_secs(2),
        }
    }
}

/// Why a batch was closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseReason {
    /// Reached `max_size`
    Size,
    /// `max_wait` elapsed since the first arrival
    Timeout,
    /// The coordinator is draining before shutdown
    Shutdown,
}

impl fmt::Display for CloseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CloseReason::Size => write!(f, "size"),
            CloseReason::Timeout => write!(f, "timeout"),
            CloseReason::Shutdown => write!(f, "shutdown"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = BatchPolicy::default();
        assert_eq!(policy.max_size(), 3);
        assert_eq!(policy.max_wait(), Duration::from_secs(2));
    }

    #[test]
    fn test_rejects_zero_size() {
        let err = BatchPolicy::new(0, Duration::from_secs(1)).unwrap_err();
        assert!(matches!(err, DomainError::InvalidBatchPolicy(_)));
    }

    #[test]
    fn test_rejects_zero_wait() {
        assert!(BatchPolicy::new(4, Duration::ZERO).is_err());
    }

    #[test]
    fn test_is_full() {
        let policy = BatchPolicy::new(2, Duration::from_millis(50)).unwrap();
        assert!(!policy.is_full(1));
        assert!(policy.is_full(2));
    }

    #[test]
    fn test_close_reason_display() {
        assert_eq!(CloseReason::Size.to_string(), "size");
        assert_eq!(CloseReason::Timeout.to_string(), "timeout");
        assert_eq!(CloseReason::Shutdown.to_string(), "shutdown");
    }
}
