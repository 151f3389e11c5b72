//! Responder selection (`[responder]` section)

use counsel_application::DispatchParams;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Which backend answers questions
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponderKind {
    #[default]
    Anthropic,
    /// Any OpenAI-compatible chat completions endpoint, hosted or local
    #[serde(alias = "openai_compatible", alias = "local")]
    Openai,
}

impl fmt::Display for ResponderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponderKind::Anthropic => write!(f, "anthropic"),
            ResponderKind::Openai => write!(f, "openai"),
        }
    }
}

impl std::str::FromStr for ResponderKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "anthropic" | "claude" => Ok(ResponderKind::Anthropic),
            "openai" | "openai_compatible" | "local" => Ok(ResponderKind::Openai),
            other => Err(format!(
                "unknown responder '{}' (expected anthropic or openai)",
                other
            )),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileResponderConfig {
    pub kind: ResponderKind,
    /// Model identifier passed to the backend; each provider has a default
    pub model: Option<String>,
    /// Per-call timeout in seconds (default: 120)
    pub timeout_seconds: Option<u64>,
    /// Keep only the most recent N messages as context (default: all)
    pub history_limit: Option<usize>,
}

impl Default for FileResponderConfig {
    fn default() -> Self {
        Self {
            kind: ResponderKind::default(),
            model: None,
            timeout_seconds: Some(120),
            history_limit: None,
        }
    }
}

impl FileResponderConfig {
    pub fn dispatch_params(&self) -> DispatchParams {
        DispatchParams::default()
            .with_responder_timeout(self.timeout_seconds.map(Duration::from_secs))
            .with_history_limit(self.history_limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dispatch_params_from_config() {
        let config = FileResponderConfig {
            timeout_seconds: Some(30),
            history_limit: Some(3),
            ..Default::default()
        };
        let params = config.dispatch_params();
        assert_eq!(params.responder_timeout, Some(Duration::from_secs(30)));
        assert_eq!(params.history_limit, Some(3));
    }

    #[test]
    fn test_kind_aliases() {
        assert_eq!("local".parse::<ResponderKind>().unwrap(), ResponderKind::Openai);
        assert_eq!("Claude".parse::<ResponderKind>().unwrap(), ResponderKind::Anthropic);
        let kind: ResponderKind = serde_json::from_str("\"openai_compatible\"").unwrap();
        assert_eq!(kind, ResponderKind::Openai);
    }
}
