use crate::config::settings::RelayConfig;
use crate::error::{ ConfigError, LlmError };
use crate::llm::chat::{ new_client as new_chat_client, ChatClient };
use crate::llm::CompletionOptions;
use crate::models::chat::ChatMessage;

use log::{ info, warn };
use std::sync::Arc;
use std::time::Instant;

/// Binds the immutable system prompt and generation options to a chat client.
/// Shared between requests; holds no mutable state.
#[derive(Clone)]
pub struct RelayAgent {
    chat_client: Arc<dyn ChatClient>,
    system_prompt: Arc<str>,
    options: CompletionOptions,
}

impl RelayAgent {
    pub fn new(
        chat_client: Arc<dyn ChatClient>,
        system_prompt: Arc<str>,
        options: CompletionOptions
    ) -> Self {
        Self { chat_client, system_prompt, options }
    }

    pub fn from_config(config: &RelayConfig) -> Result<Self, ConfigError> {
        let chat_client = new_chat_client(&config.llm)?;
        info!(
            "Chat client configured: Type={}, Model={}, BaseURL={}",
            config.llm.llm_type,
            config.options.model,
            chat_client.get_base_url()
        );
        Ok(Self::new(chat_client, config.system_prompt.clone(), config.options.clone()))
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    pub fn has_credential(&self) -> bool {
        self.chat_client.has_credential()
    }

    /// One upstream call for `messages` (user/assistant only, chronological).
    pub async fn process_conversation(&self, messages: &[ChatMessage]) -> Result<String, LlmError> {
        let started = Instant::now();
        let result = self.chat_client.complete(&self.system_prompt, messages, &self.options).await;
        match &result {
            Ok(reply) =>
                info!(
                    "Reply generated in {} ms ({} messages in, {} bytes out)",
                    started.elapsed().as_millis(),
                    messages.len(),
                    reply.len()
                ),
            Err(e) => warn!("Completion failed after {} ms: {}", started.elapsed().as_millis(), e),
        }
        result
    }
}
