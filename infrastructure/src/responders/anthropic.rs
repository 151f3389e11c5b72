//! Anthropic Messages API responder

use super::{build_client, check_status, map_send_error, resolve_api_key};
use crate::config::FileAnthropicConfig;
use async_trait::async_trait;
use counsel_application::{Responder, ResponderError};
use counsel_domain::{ChatTurn, Role};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct AnthropicResponder {
    client: Client,
    base_url: String,
    api_key: String,
    api_version: String,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    system: &'a str,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: Option<String>,
}

impl AnthropicResponder {
    /// Build from `[providers.anthropic]`; `model` overrides the provider default.
    pub fn new(config: &FileAnthropicConfig, model: Option<&str>) -> Result<Self, ResponderError> {
        let api_key = resolve_api_key(config.api_key.as_deref(), &config.api_key_env)
            .ok_or_else(|| {
                ResponderError::NotConfigured(format!(
                    "Anthropic API key missing (set {})",
                    config.api_key_env
                ))
            })?;

        Ok(Self {
            client: build_client()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            api_version: config.api_version.clone(),
            model: model.unwrap_or(config.model.as_str()).to_string(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }

    fn request_body<'a>(
        &'a self,
        system_instruction: &'a str,
        history: &'a [ChatTurn],
    ) -> MessagesRequest<'a> {
        // The API requires the conversation to open with a user turn.
        let start = history
            .iter()
            .position(|turn| turn.role == Role::User)
            .unwrap_or(history.len());

        MessagesRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            system: system_instruction,
            messages: history[start..]
                .iter()
                .map(|turn| WireMessage {
                    role: turn.role.as_str(),
                    content: &turn.content,
                })
                .collect(),
        }
    }
}

fn first_text(response: MessagesResponse) -> Result<String, ResponderError> {
    response
        .content
        .into_iter()
        .find(|block| block.kind == "text")
        .and_then(|block| block.text)
        .filter(|text| !text.trim().is_empty())
        .ok_or(ResponderError::EmptyResponse)
}

#[async_trait]
impl Responder for AnthropicResponder {
    fn name(&self) -> &str {
        "anthropic"
    }

    async fn respond(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<String, ResponderError> {
        let body = self.request_body(system_instruction, history);
        debug!(model = %self.model, turns = body.messages.len(), "Calling Anthropic Messages API");

        let response = self
            .client
            .post(self.endpoint())
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", &self.api_version)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let parsed: MessagesResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ResponderError::Other(format!("invalid response body: {}", e)))?;

        first_text(parsed)
    }
}
