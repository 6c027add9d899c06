use crate::agent::RelayAgent;
use crate::error::SessionError;
use crate::models::chat::{ ChatMessage, Role };
use chrono::Utc;
use log::{ info, warn };
use std::sync::Arc;
use tokio::sync::Mutex;
use uuid::Uuid;

const FAILED_REPLY_PREFIX: &str = "応答の生成中にエラーが発生しました: ";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TranscriptEntry {
    pub message: ChatMessage,
    pub timestamp: i64,
    /// Inline error text shown in place of a reply. Never sent upstream.
    pub failed: bool,
}

/// Append-only, chronological record of one chat session.
#[derive(Clone, Debug, Default)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, message: ChatMessage, failed: bool) -> &TranscriptEntry {
        self.entries.push(TranscriptEntry {
            message,
            timestamp: Utc::now().timestamp(),
            failed,
        });
        &self.entries[self.entries.len() - 1]
    }

    pub fn push_user(&mut self, content: impl Into<String>) -> &TranscriptEntry {
        self.push(ChatMessage::user(content), false)
    }

    pub fn push_reply(&mut self, content: impl Into<String>) -> &TranscriptEntry {
        self.push(ChatMessage::assistant(content), false)
    }

    pub fn push_failure(&mut self, error_text: impl std::fmt::Display) -> &TranscriptEntry {
        self.push(ChatMessage::assistant(format!("{}{}", FAILED_REPLY_PREFIX, error_text)), true)
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Messages to send upstream: everything except inline failures.
    pub fn upstream_history(&self) -> Vec<ChatMessage> {
        self.entries
            .iter()
            .filter(|entry| !entry.failed)
            .map(|entry| entry.message.clone())
            .collect()
    }
}

pub fn format_transcript(transcript: &Transcript) -> String {
    let mut result = String::new();
    for entry in transcript.entries() {
        let role_display = match entry.message.role {
            Role::User => "User",
            Role::Assistant => "Assistant",
            Role::System => "System",
        };
        result.push_str(&format!("{}: {}\n", role_display, entry.message.content));
    }
    result
}

/// One interactive conversation. At most one reply is generated at a time.
pub struct ChatSession {
    id: String,
    agent: Arc<RelayAgent>,
    transcript: Mutex<Transcript>,
}

impl ChatSession {
    pub fn new(agent: Arc<RelayAgent>) -> Self {
        let id = Uuid::new_v4().to_string();
        info!("Started chat session {}", id);
        Self { id, agent, transcript: Mutex::new(Transcript::new()) }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn is_busy(&self) -> bool {
        self.transcript.try_lock().is_err()
    }

    /// Appends `input`, asks the agent for a reply and appends that (or an inline
    /// error). Returns the appended reply entry.
    pub async fn submit(&self, input: &str) -> Result<TranscriptEntry, SessionError> {
        if input.trim().is_empty() {
            return Err(SessionError::EmptyInput);
        }
        let mut transcript = self.transcript.try_lock().map_err(|_| SessionError::Busy)?;

        transcript.push_user(input);
        let history = transcript.upstream_history();

        let entry = match self.agent.process_conversation(&history).await {
            Ok(reply) => transcript.push_reply(reply).clone(),
            Err(e) => {
                warn!("Session {}: reply failed: {}", self.id, e);
                transcript.push_failure(e).clone()
            }
        };
        Ok(entry)
    }

    pub async fn transcript(&self) -> Transcript {
        self.transcript.lock().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::testing::ScriptedClient;
    use crate::error::LlmError;
    use crate::llm::chat::ChatClient;
    use crate::llm::CompletionOptions;
    use async_trait::async_trait;
    use tokio::sync::Notify;

    fn session_with(client: Arc<dyn ChatClient>) -> ChatSession {
        let agent = RelayAgent::new(client, Arc::from("PROMPT"), CompletionOptions::default());
        ChatSession::new(Arc::new(agent))
    }

    #[tokio::test]
    async fn test_turns_are_appended_in_order() {
        let client = Arc::new(
            ScriptedClient::new(vec![Ok("Friday".to_string()), Ok("Room 002".to_string())])
        );
        let session = session_with(client.clone());

        assert_eq!(session.submit("When?").await.unwrap().message, ChatMessage::assistant("Friday"));
        session.submit("Where?").await.unwrap();

        let transcript = session.transcript().await;
        let roles: Vec<Role> = transcript.entries().iter().map(|e| e.message.role).collect();
        assert_eq!(roles, vec![Role::User, Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(
            format_transcript(&transcript),
            "User: When?\nAssistant: Friday\nUser: Where?\nAssistant: Room 002\n"
        );

        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[1].1, vec![
            ChatMessage::user("When?"),
            ChatMessage::assistant("Friday"),
            ChatMessage::user("Where?"),
        ]);
    }

    #[tokio::test]
    async fn test_failed_reply_is_inline_and_not_sent_upstream() {
        let client = Arc::new(
            ScriptedClient::new(
                vec![
                    Err(LlmError::Http { status: 500, body: "oops".to_string() }),
                    Ok("fine now".to_string())
                ]
            )
        );
        let session = session_with(client.clone());

        let failed = session.submit("first").await.unwrap();
        assert!(failed.failed);
        assert_eq!(failed.message.role, Role::Assistant);
        assert!(failed.message.content.starts_with(FAILED_REPLY_PREFIX));
        assert!(failed.message.content.contains("oops"));

        session.submit("second").await.unwrap();
        let calls = client.calls.lock().unwrap();
        assert_eq!(calls[1].1, vec![ChatMessage::user("first"), ChatMessage::user("second")]);
        assert_eq!(session.transcript().await.len(), 4);
    }

    #[tokio::test]
    async fn test_empty_input_leaves_transcript_untouched() {
        let session = session_with(Arc::new(ScriptedClient::new(vec![])));
        assert_eq!(session.submit("   \n").await, Err(SessionError::EmptyInput));
        assert!(session.transcript().await.is_empty());
    }

    struct GatedClient {
        gate: Notify,
    }

    #[async_trait]
    impl ChatClient for GatedClient {
        async fn complete(
            &self,
            _system_prompt: &str,
            _messages: &[ChatMessage],
            _options: &CompletionOptions
        ) -> Result<String, LlmError> {
            self.gate.notified().await;
            Ok("done".to_string())
        }

        fn get_base_url(&self) -> String {
            "gated://".to_string()
        }

        fn has_credential(&self) -> bool {
            true
        }
    }

    #[tokio::test]
    async fn test_second_submit_while_busy_is_rejected() {
        let client = Arc::new(GatedClient { gate: Notify::new() });
        let session = Arc::new(session_with(client.clone()));

        let in_flight = {
            let session = session.clone();
            tokio::spawn(async move { session.submit("first").await })
        };
        while !session.is_busy() {
            tokio::task::yield_now().await;
        }

        assert_eq!(session.submit("second").await, Err(SessionError::Busy));

        client.gate.notify_one();
        let entry = in_flight.await.unwrap().unwrap();
        assert_eq!(entry.message.content, "done");
        assert_eq!(session.transcript().await.len(), 2);
    }
}
