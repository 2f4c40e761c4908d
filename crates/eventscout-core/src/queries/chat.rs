use tracing::warn;

use crate::api::{ApiError, Backend, GenerateRequest};
use crate::models::{ChatRole, ChatTurn};

/// Reply used when the model returns no text
pub const CHAT_FALLBACK_REPLY: &str = "I'm not sure how to respond to that.";

/// Reply used when the request fails
pub const CHAT_ERROR_REPLY: &str = "Sorry, I encountered an error. Please try again.";

/// History in the order given, followed by the new user turn.
pub fn chat_request(model: &str, history: &[ChatTurn], message: &str) -> GenerateRequest {
    let mut turns = Vec::with_capacity(history.len() + 1);
    turns.extend_from_slice(history);
    turns.push(ChatTurn::user(message));
    GenerateRequest::conversation(model, turns)
}

/// Model reply text, verbatim. An empty reply becomes `CHAT_FALLBACK_REPLY`.
pub async fn fetch_reply<B: Backend + ?Sized>(
    backend: &B,
    model: &str,
    history: &[ChatTurn],
    message: &str,
) -> Result<String, ApiError> {
    let response = backend
        .generate(&chat_request(model, history, message))
        .await?;
    Ok(response.text().unwrap_or(CHAT_FALLBACK_REPLY).to_string())
}

/// Like `fetch_reply`, with failures turned into `CHAT_ERROR_REPLY`.
pub async fn send_chat<B: Backend + ?Sized>(
    backend: &B,
    model: &str,
    history: &[ChatTurn],
    message: &str,
) -> String {
    reply_or_error(fetch_reply(backend, model, history, message).await)
}

pub(crate) fn reply_or_error(result: Result<String, ApiError>) -> String {
    result.unwrap_or_else(|e| {
        warn!(error = %e, "Chat request failed");
        CHAT_ERROR_REPLY.to_string()
    })
}

/// Running transcript. Every turn, including error replies, is kept and
/// sent back as history on the next message.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conversation {
    turns: Vec<ChatTurn>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            turns: vec![ChatTurn::model(greeting)],
        }
    }

    pub fn turns(&self) -> &[ChatTurn] {
        &self.turns
    }

    pub fn push(&mut self, role: ChatRole, text: impl Into<String>) {
        self.turns.push(ChatTurn::new(role, text));
    }

    pub fn last_reply(&self) -> Option<String> {
        self.turns
            .iter()
            .rev()
            .find(|t| t.role == ChatRole::Model)
            .map(ChatTurn::text)
    }

    /// Send `message` with the current history, then record both turns.
    pub async fn send<B: Backend + ?Sized>(
        &mut self,
        backend: &B,
        model: &str,
        message: &str,
    ) -> String {
        let reply = send_chat(backend, model, &self.turns, message).await;
        self.push(ChatRole::User, message);
        self.push(ChatRole::Model, reply.clone());
        reply
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{Contents, GenerateResponse};
    use crate::testing::ScriptedBackend;

    const MODEL: &str = "gemini-2.0-flash";

    fn sent_turns(backend: &ScriptedBackend, index: usize) -> Vec<ChatTurn> {
        match &backend.requests()[index].contents {
            Contents::Turns(turns) => turns.clone(),
            other => panic!("expected turns, got {:?}", other),
        }
    }

    #[test]
    fn test_request_preserves_history_order_and_appends_message() {
        let history = vec![
            ChatTurn::model("Hello!"),
            ChatTurn::user("Any hackathons?"),
            ChatTurn::model("HackDelhi on Saturday."),
        ];
        let request = chat_request(MODEL, &history, "Is it free?");

        match request.contents {
            Contents::Turns(turns) => {
                assert_eq!(&turns[..3], &history[..]);
                assert_eq!(turns[3], ChatTurn::user("Is it free?"));
            }
            other => panic!("expected turns, got {:?}", other),
        }
        assert!(request.config.is_none());
    }

    #[tokio::test]
    async fn test_reply_is_used_verbatim() {
        let reply = "  **Yes** - entry is free.\n\nBring a laptop.  ";
        let backend = ScriptedBackend::new().reply_text(reply);
        assert_eq!(send_chat(&backend, MODEL, &[], "Is it free?").await, reply);
    }

    #[tokio::test]
    async fn test_fallback_replies() {
        let backend = ScriptedBackend::new()
            .reply(GenerateResponse::default())
            .fail(ApiError::ServerError("down".to_string()));
        assert_eq!(send_chat(&backend, MODEL, &[], "hi").await, CHAT_FALLBACK_REPLY);
        assert_eq!(send_chat(&backend, MODEL, &[], "hi").await, CHAT_ERROR_REPLY);
    }

    #[tokio::test]
    async fn test_conversation_accumulates_turns_in_order() {
        let backend = ScriptedBackend::new().reply_text("Try HackDelhi.").reply_text("Yes, it is free.");
        let mut conversation = Conversation::with_greeting("Hello!");

        conversation.send(&backend, MODEL, "Any hackathons?").await;
        conversation.send(&backend, MODEL, "Is it free?").await;

        let texts: Vec<_> = conversation.turns().iter().map(|t| (t.role, t.text())).collect();
        assert_eq!(
            texts,
            vec![
                (ChatRole::Model, "Hello!".to_string()),
                (ChatRole::User, "Any hackathons?".to_string()),
                (ChatRole::Model, "Try HackDelhi.".to_string()),
                (ChatRole::User, "Is it free?".to_string()),
                (ChatRole::Model, "Yes, it is free.".to_string()),
            ]
        );

        // Second request carried the first exchange plus the new message
        let second = sent_turns(&backend, 1);
        assert_eq!(second.len(), 4);
        assert_eq!(second[3], ChatTurn::user("Is it free?"));
        assert_eq!(conversation.last_reply().as_deref(), Some("Yes, it is free."));
    }
}
