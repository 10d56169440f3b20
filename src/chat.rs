//! Chat client for the book's question-answering endpoint
//!
//! Requests go through [`SessionManager::fetch_with_auth`], so the chat never
//! handles tokens itself.

use crate::auth::{FetchOptions, SessionManager};
use crate::error::{Error, Result};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Storage key holding the conversation id shared by every tab
pub const CHAT_SESSION_KEY: &str = "chat_session_id";

pub const GREETING: &str = "Hi! I can answer questions about the Agentic AI Book. Ask me anything!";
pub const SIGN_IN_MESSAGE: &str = "Please sign in to use the chatbot.";
pub const RATE_LIMIT_MESSAGE: &str =
    "Rate limit exceeded. Please wait a moment before sending another message.";
pub const FAILURE_MESSAGE: &str = "Sorry, I encountered an error. Please try again later.";

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    session_id: &'a str,
}

/// Answer from the chat backend
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub sources: Vec<String>,
}

/// Result of sending one message, ready to be shown to the user
#[derive(Debug, Clone, PartialEq)]
pub enum ChatOutcome {
    Reply(ChatReply),
    SignInRequired,
    RateLimited,
    Failed,
}

impl ChatOutcome {
    /// Text to display in the conversation
    pub fn message(&self) -> String {
        match self {
            ChatOutcome::Reply(reply) if reply.sources.is_empty() => reply.response.clone(),
            ChatOutcome::Reply(reply) => {
                format!("{}\n\nSources: {}", reply.response, reply.sources.join(", "))
            }
            ChatOutcome::SignInRequired => SIGN_IN_MESSAGE.to_string(),
            ChatOutcome::RateLimited => RATE_LIMIT_MESSAGE.to_string(),
            ChatOutcome::Failed => FAILURE_MESSAGE.to_string(),
        }
    }
}

impl fmt::Display for ChatOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message())
    }
}

pub struct ChatClient {
    session: SessionManager,
    endpoint: String,
    session_id: String,
}

impl ChatClient {
    /// Create a client, reusing the stored conversation id or creating one
    pub fn new(session: SessionManager) -> Result<Self> {
        let session_id = load_or_create_session_id(&session)?;
        let endpoint = session.config().chat_url();
        Ok(Self {
            session,
            endpoint,
            session_id,
        })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Send one message
    ///
    /// Only blank input is an error; every backend outcome, including
    /// failures, comes back as a [`ChatOutcome`].
    pub async fn send(&self, message: &str) -> Result<ChatOutcome> {
        let message = message.trim();
        if message.is_empty() {
            return Err(Error::Validation("Message is empty".to_string()));
        }

        let body = serde_json::to_value(ChatRequest {
            message,
            session_id: &self.session_id,
        })?;
        let Some(response) = self
            .session
            .fetch_with_auth(&self.endpoint, FetchOptions::post_json(body))
            .await
        else {
            debug!("Chat request without a session");
            return Ok(ChatOutcome::SignInRequired);
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            warn!("Chat rate limited");
            return Ok(ChatOutcome::RateLimited);
        }
        if status == StatusCode::UNAUTHORIZED {
            return Ok(ChatOutcome::SignInRequired);
        }
        if !status.is_success() {
            warn!(%status, "Chat request failed");
            return Ok(ChatOutcome::Failed);
        }

        match response.json::<ChatReply>().await {
            Ok(reply) => Ok(ChatOutcome::Reply(reply)),
            Err(e) => {
                warn!("Unreadable chat response: {}", e);
                Ok(ChatOutcome::Failed)
            }
        }
    }
}

fn load_or_create_session_id(session: &SessionManager) -> Result<String> {
    let storage = session.storage();
    if let Some(existing) = storage.get_item(CHAT_SESSION_KEY)? {
        if !existing.trim().is_empty() {
            return Ok(existing);
        }
    }
    let created = uuid::Uuid::new_v4().to_string();
    storage.set_item(CHAT_SESSION_KEY, &created)?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::storage::{MemoryStorage, SharedStorage};
    use std::sync::Arc;

    fn session_with(storage: &MemoryStorage) -> SessionManager {
        SessionManager::new(
            Config::with_base_url("http://127.0.0.1:9"),
            Arc::new(storage.clone()),
        )
        .unwrap()
    }

    #[test]
    fn test_session_id_is_created_once() {
        let storage = MemoryStorage::new();
        let first = ChatClient::new(session_with(&storage)).unwrap();
        let second = ChatClient::new(session_with(&storage)).unwrap();

        assert_eq!(first.session_id(), second.session_id());
        assert_eq!(
            storage.get_item(CHAT_SESSION_KEY).unwrap().as_deref(),
            Some(first.session_id())
        );
    }

    #[test]
    fn test_blank_stored_id_is_replaced() {
        let storage = MemoryStorage::new();
        storage.set_item(CHAT_SESSION_KEY, "  ").unwrap();
        let client = ChatClient::new(session_with(&storage)).unwrap();
        assert!(uuid::Uuid::parse_str(client.session_id()).is_ok());
    }

    #[tokio::test]
    async fn test_blank_message_is_rejected() {
        let client = ChatClient::new(session_with(&MemoryStorage::new())).unwrap();
        assert!(matches!(client.send("   ").await, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_signed_out_user_gets_sign_in_prompt() {
        let client = ChatClient::new(session_with(&MemoryStorage::new())).unwrap();
        let outcome = client.send("What is an agent?").await.unwrap();
        assert_eq!(outcome, ChatOutcome::SignInRequired);
        assert_eq!(outcome.message(), SIGN_IN_MESSAGE);
    }

    #[test]
    fn test_reply_message_lists_sources() {
        let outcome = ChatOutcome::Reply(ChatReply {
            response: "Agents act.".to_string(),
            sources: vec!["intro.md".to_string(), "tools.md".to_string()],
        });
        assert_eq!(outcome.message(), "Agents act.\n\nSources: intro.md, tools.md");

        let bare = ChatOutcome::Reply(ChatReply {
            response: "Agents act.".to_string(),
            sources: vec![],
        });
        assert_eq!(bare.to_string(), "Agents act.");
    }
}
