pub mod openai;

use async_trait::async_trait;
use std::sync::Arc;
use super::{ CompletionOptions, LlmConfig, LlmType };
use self::openai::OpenAIChatClient;
use crate::error::{ ConfigError, LlmError };
use crate::models::chat::ChatMessage;

#[async_trait]
pub trait ChatClient: Send + Sync {
    /// Sends `system_prompt` followed by `messages` upstream and returns the trimmed reply.
    /// Exactly one request per call.
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions
    ) -> Result<String, LlmError>;

    fn get_base_url(&self) -> String;
    fn has_credential(&self) -> bool;
}

pub fn new_client(config: &LlmConfig) -> Result<Arc<dyn ChatClient>, ConfigError> {
    let client: Arc<dyn ChatClient> = match config.llm_type {
        // Both presets speak the same chat-completions protocol.
        LlmType::OpenRouter | LlmType::OpenAI => {
            let specific_client = OpenAIChatClient::from_config(config)?;
            Arc::new(specific_client)
        }
    };
    Ok(client)
}
