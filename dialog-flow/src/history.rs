use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Default number of messages kept per session.
pub const DEFAULT_MAX_MESSAGES: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

/// One chat line as shown to the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
            timestamp: Utc::now(),
        }
    }

    pub fn is_user(&self) -> bool {
        self.role == MessageRole::User
    }
}

/// Per-session chat transcripts, trimmed to the most recent `max_messages`.
#[derive(Clone, Debug)]
pub struct ChatHistory {
    sessions: Arc<DashMap<String, Vec<ChatMessage>>>,
    max_messages: usize,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::with_max_messages(DEFAULT_MAX_MESSAGES)
    }

    pub fn with_max_messages(max_messages: usize) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            max_messages: max_messages.max(1),
        }
    }

    pub async fn add_user_message(&self, session_id: &str, content: impl Into<String>) {
        self.push(session_id, ChatMessage::user(content));
    }

    pub async fn add_assistant_message(&self, session_id: &str, content: impl Into<String>) {
        self.push(session_id, ChatMessage::assistant(content));
    }

    pub async fn get_all_messages(&self, session_id: &str) -> Vec<ChatMessage> {
        self.sessions
            .get(session_id)
            .map(|entry| entry.clone())
            .unwrap_or_default()
    }

    pub async fn get_last_messages(&self, session_id: &str, n: usize) -> Vec<ChatMessage> {
        self.sessions
            .get(session_id)
            .map(|entry| entry[entry.len().saturating_sub(n)..].to_vec())
            .unwrap_or_default()
    }

    pub async fn clear(&self, session_id: &str) {
        self.sessions.remove(session_id);
    }

    pub fn max_messages(&self) -> usize {
        self.max_messages
    }

    fn push(&self, session_id: &str, message: ChatMessage) {
        let mut messages = self.sessions.entry(session_id.to_string()).or_default();
        messages.push(message);
        if messages.len() > self.max_messages {
            let excess = messages.len() - self.max_messages;
            messages.drain(..excess);
        }
    }
}

impl Default for ChatHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_history_is_capped() {
        let history = ChatHistory::with_max_messages(3);
        for i in 0..5 {
            history.add_user_message("s1", format!("message {i}")).await;
        }

        let messages = history.get_all_messages("s1").await;
        assert_eq!(messages.len(), 3);
        assert_eq!(messages[0].content, "message 2");
        assert_eq!(messages[2].content, "message 4");
    }

    #[tokio::test]
    async fn test_last_messages_and_roles() {
        let history = ChatHistory::new();
        history.add_user_message("s1", "Привет").await;
        history.add_assistant_message("s1", "Здравствуйте!").await;

        let last = history.get_last_messages("s1", 1).await;
        assert_eq!(last.len(), 1);
        assert!(!last[0].is_user());
        assert!(history.get_all_messages("other").await.is_empty());

        history.clear("s1").await;
        assert!(history.get_all_messages("s1").await.is_empty());
    }
}
