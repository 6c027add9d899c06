use async_trait::async_trait;
use log::{ debug, error };
use reqwest::{ Client as HttpClient, header::{ HeaderMap, HeaderName, HeaderValue, CONTENT_TYPE } };
use serde::{ Deserialize, Serialize };
use std::time::Duration;

use super::ChatClient;
use crate::error::{ ConfigError, LlmError };
use crate::llm::{ CompletionOptions, LlmConfig };
use crate::models::chat::{ ChatMessage, Role };

const CONNECT_TIMEOUT_SECS: u64 = 10;
const MAX_DIAGNOSTIC_CHARS: usize = 512;

/// Client for any endpoint implementing `POST {base}/chat/completions`.
pub struct OpenAIChatClient {
    http: HttpClient,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Serialize)]
struct OpenAIMessage<'a> {
    role: Role,
    content: &'a str,
}

#[derive(Serialize)]
struct OpenAIChatRequest<'a> {
    model: &'a str,
    messages: Vec<OpenAIMessage<'a>>,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Deserialize)]
struct OpenAIChoice {
    message: OpenAIResponseMessage,
}

#[derive(Deserialize)]
struct OpenAIResponseMessage {
    content: Option<String>,
}

impl OpenAIChatClient {
    pub fn new(
        api_key: Option<String>,
        base_url: String,
        http_referer: Option<String>,
        x_title: Option<String>
    ) -> Result<Self, ConfigError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        for (name, value) in [("http-referer", http_referer), ("x-title", x_title)] {
            let Some(value) = value.filter(|v| !v.trim().is_empty()) else {
                continue;
            };
            let header_value = HeaderValue::from_str(value.trim()).map_err(|_|
                ConfigError::InvalidHeader { name }
            )?;
            headers.insert(HeaderName::from_static(name), header_value);
        }

        let http = HttpClient::builder()
            .default_headers(headers)
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            http,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url,
        })
    }

    pub fn from_config(config: &LlmConfig) -> Result<Self, ConfigError> {
        Self::new(
            config.api_key.clone(),
            config.base_url.clone(),
            config.http_referer.clone(),
            config.x_title.clone()
        )
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.base_url.trim_end_matches('/'))
    }

    fn build_request<'a>(
        system_prompt: &'a str,
        messages: &'a [ChatMessage],
        options: &'a CompletionOptions
    ) -> OpenAIChatRequest<'a> {
        let mut wire = Vec::with_capacity(messages.len() + 1);
        wire.push(OpenAIMessage { role: Role::System, content: system_prompt });
        wire.extend(
            messages.iter().map(|m| OpenAIMessage { role: m.role, content: &m.content })
        );

        OpenAIChatRequest {
            model: &options.model,
            messages: wire,
            temperature: options.temperature,
            max_tokens: options.max_tokens,
        }
    }
}

fn truncate_for_diagnostics(raw: &str) -> String {
    if raw.chars().count() <= MAX_DIAGNOSTIC_CHARS {
        return raw.to_string();
    }
    let head: String = raw.chars().take(MAX_DIAGNOSTIC_CHARS).collect();
    format!("{}...", head)
}

/// Extracts `choices[0].message.content`, trimmed. A blank reply is an error.
fn parse_completion(raw: &str) -> Result<String, LlmError> {
    let parsed: OpenAIResponse = serde_json
        ::from_str(raw)
        .map_err(|e| LlmError::Parse(format!("{} in {}", e, truncate_for_diagnostics(raw))))?;

    let content = parsed.choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| {
            LlmError::Parse(
                format!("missing choices[0].message.content in {}", truncate_for_diagnostics(raw))
            )
        })?;

    let reply = content.trim();
    if reply.is_empty() {
        return Err(
            LlmError::Parse(
                format!("empty choices[0].message.content in {}", truncate_for_diagnostics(raw))
            )
        );
    }
    Ok(reply.to_string())
}

#[async_trait]
impl ChatClient for OpenAIChatClient {
    async fn complete(
        &self,
        system_prompt: &str,
        messages: &[ChatMessage],
        options: &CompletionOptions
    ) -> Result<String, LlmError> {
        let api_key = self.api_key.as_deref().ok_or(LlmError::MissingCredential)?;
        let url = self.completions_url();
        let req = Self::build_request(system_prompt, messages, options);

        debug!(
            "Sending completion request: url={}, model={}, messages={}",
            url,
            options.model,
            req.messages.len()
        );

        let resp = self.http
            .post(&url)
            .bearer_auth(api_key)
            .timeout(options.timeout)
            .json(&req)
            .send().await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::Unreachable(
                        format!("request timed out after {}s", options.timeout.as_secs_f32())
                    )
                } else {
                    LlmError::Unreachable(e.to_string())
                }
            })?;

        let status = resp.status();
        let raw = resp.text().await.map_err(|e| LlmError::Unreachable(e.to_string()))?;

        if !status.is_success() {
            error!("Upstream returned {}: {}", status, truncate_for_diagnostics(&raw));
            return Err(LlmError::Http { status: status.as_u16(), body: raw });
        }

        parse_completion(&raw)
    }

    fn get_base_url(&self) -> String {
        self.base_url.clone()
    }

    fn has_credential(&self) -> bool {
        self.api_key.is_some()
    }
}
