//! OpenAI-compatible chat completions responder
//!
//! Works against the hosted OpenAI API and against local inference servers
//! that expose `/v1/chat/completions`.

use super::{build_client, check_status, map_send_error, resolve_api_key};
use crate::config::FileOpenAiConfig;
use async_trait::async_trait;
use counsel_application::{Responder, ResponderError};
use counsel_domain::ChatTurn;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub struct OpenAiCompatibleResponder {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    model: String,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    messages: Vec<WireMessage<'a>>,
}

#[derive(Debug, Serialize)]
struct WireMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiCompatibleResponder {
    /// Build from `[providers.openai]`; `model` overrides the provider default.
    ///
    /// A missing key is only an error when `require_api_key` is set.
    pub fn new(config: &FileOpenAiConfig, model: Option<&str>) -> Result<Self, ResponderError> {
        let api_key = resolve_api_key(config.api_key.as_deref(), &config.api_key_env);
        if api_key.is_none() && config.require_api_key {
            return Err(ResponderError::NotConfigured(format!(
                "OpenAI API key missing (set {} or providers.openai.require_api_key = false)",
                config.api_key_env
            )));
        }

        Ok(Self {
            client: build_client()?,
            endpoint: completions_endpoint(&config.base_url),
            api_key,
            model: model.unwrap_or(config.model.as_str()).to_string(),
            max_tokens: config.max_tokens,
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body<'a>(
        &'a self,
        system_instruction: &'a str,
        history: &'a [ChatTurn],
    ) -> ChatRequest<'a> {
        let mut messages = Vec::with_capacity(history.len() + 1);
        messages.push(WireMessage {
            role: "system",
            content: system_instruction,
        });
        messages.extend(history.iter().map(|turn| WireMessage {
            role: turn.role.as_str(),
            content: &turn.content,
        }));

        ChatRequest {
            model: &self.model,
            max_tokens: self.max_tokens,
            messages,
        }
    }
}

fn completions_endpoint(base_url: &str) -> String {
    let base = base_url.trim_end_matches('/');
    if base.ends_with("/v1") {
        format!("{}/chat/completions", base)
    } else {
        format!("{}/v1/chat/completions", base)
    }
}

fn first_choice(response: ChatResponse) -> Result<String, ResponderError> {
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or(ResponderError::EmptyResponse)
}

#[async_trait]
impl Responder for OpenAiCompatibleResponder {
    fn name(&self) -> &str {
        "openai"
    }

    async fn respond(
        &self,
        system_instruction: &str,
        history: &[ChatTurn],
    ) -> Result<String, ResponderError> {
        let body = self.request_body(system_instruction, history);
        debug!(model = %self.model, turns = body.messages.len(), "Calling chat completions at {}", self.endpoint);

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(map_send_error)?;
        let parsed: ChatResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| ResponderError::Other(format!("invalid response body: {}", e)))?;

        first_choice(parsed)
    }
}
