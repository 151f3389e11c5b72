//! Responder adapters
//!
//! HTTP clients for text-generation backends. Each adapter turns the
//! (system instruction, history) pair into its provider's request shape
//! and returns the first text answer.

mod anthropic;
mod factory;
mod openai_compat;

pub use anthropic::AnthropicResponder;
pub use factory::ResponderFactory;
pub use openai_compat::OpenAiCompatibleResponder;

use counsel_application::ResponderError;

/// Resolve an API key: explicit value first, then the named env var.
fn resolve_api_key(explicit: Option<&str>, env_var: &str) -> Option<String> {
    explicit
        .map(str::to_string)
        .or_else(|| std::env::var(env_var).ok())
        .filter(|key| !key.trim().is_empty())
}

fn build_client() -> Result<reqwest::Client, ResponderError> {
    reqwest::Client::builder()
        .user_agent(concat!("counsel-gateway/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| ResponderError::NotConfigured(format!("HTTP client: {}", e)))
}

fn map_send_error(e: reqwest::Error) -> ResponderError {
    if e.is_timeout() {
        ResponderError::Timeout
    } else if e.is_connect() {
        ResponderError::ConnectionError(e.to_string())
    } else {
        ResponderError::RequestFailed(e.to_string())
    }
}

/// Turn a non-success response into an error carrying status and body.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ResponderError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ResponderError::RequestFailed(format!(
        "HTTP {} {}: {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Unknown"),
        body.trim()
    )))
}
