//! Responder selection from configuration

use super::{AnthropicResponder, OpenAiCompatibleResponder};
use crate::config::{FileProvidersConfig, FileResponderConfig, ResponderKind};
use counsel_application::{Responder, ResponderError};
use std::sync::Arc;
use tracing::info;

pub struct ResponderFactory;

impl ResponderFactory {
    /// Build the responder named by `[responder].kind`.
    pub fn from_config(
        responder: &FileResponderConfig,
        providers: &FileProvidersConfig,
    ) -> Result<Arc<dyn Responder>, ResponderError> {
        let model = responder.model.as_deref();
        match responder.kind {
            ResponderKind::Anthropic => {
                let adapter = AnthropicResponder::new(&providers.anthropic, model)?;
                info!("Responder: Anthropic ({})", adapter.model());
                Ok(Arc::new(adapter))
            }
            ResponderKind::Openai => {
                let adapter = OpenAiCompatibleResponder::new(&providers.openai, model)?;
                info!(
                    "Responder: OpenAI-compatible ({}) at {}",
                    adapter.model(),
                    adapter.endpoint()
                );
                Ok(Arc::new(adapter))
            }
        }
    }
}
