//! The stylist conversation: wardrobe lookups, context and one model reply.

use crate::config::ChatSettings;
use crate::models::{ChatMessage, ChatRequest};
use crate::services::backend::BackendClient;
use crate::services::context::build_wardrobe_context;
use metrics::counter;
use service_core::error::AppError;
use service_core::providers::{
    ChatProvider, GenerationParams, Message, ProviderError, ResponseFormat,
};
use std::sync::Arc;
use thiserror::Error;

pub const PERSONA: &str = "You are Julie, a professional personal style assistant and wardrobe consultant. \
You have access to the user's complete wardrobe inventory and personal style profile.

Your expertise includes:
- Personal styling and outfit coordination
- Color theory and seasonal color analysis
- Fashion trends and style advice
- Wardrobe organization and planning
- Shopping recommendations
- Occasion-appropriate dressing

Guidelines:
- Be friendly, helpful, and enthusiastic about fashion
- Reference specific items from their wardrobe when giving advice
- Consider their personal color palette and season when making suggestions
- Provide practical, actionable advice
- Ask clarifying questions when needed
- Suggest outfit combinations using their existing pieces
- Recommend additions to fill wardrobe gaps
- Be encouraging and positive about their style journey
- IMPORTANT: Keep responses to 1-2 lines maximum. Be concise but helpful.
- When suggesting outfits, mention specific items from their wardrobe by brand and type \
(e.g., \"your blue Zara dress\", \"that black Nike top\")

If the user has no wardrobe items, encourage them to start building their digital wardrobe \
and offer general style advice.";

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("model request failed: {0}")]
    Provider(#[from] ProviderError),

    #[error("model returned no reply")]
    EmptyReply,
}

impl From<ChatError> for AppError {
    fn from(err: ChatError) -> Self {
        tracing::error!(error = %err, "Chat request failed");
        AppError::ServiceError("Chat service error".to_string())
    }
}

/// Persona, wardrobe context, the most recent `limit` turns, then the new message.
pub fn build_conversation(
    context: String,
    history: &[ChatMessage],
    message: &str,
    limit: usize,
) -> Vec<Message> {
    let recent = &history[history.len().saturating_sub(limit)..];

    let mut messages = Vec::with_capacity(recent.len() + 3);
    messages.push(Message::system(PERSONA));
    messages.push(Message::system(context));
    messages.extend(recent.iter().map(|turn| {
        if turn.is_bot {
            Message::assistant(turn.text.as_str())
        } else {
            Message::user(turn.text.as_str())
        }
    }));
    messages.push(Message::user(message));

    messages
}

pub struct StylistChat {
    provider: Arc<dyn ChatProvider>,
    backend: BackendClient,
    settings: ChatSettings,
}

impl StylistChat {
    pub fn new(
        provider: Arc<dyn ChatProvider>,
        backend: BackendClient,
        settings: ChatSettings,
    ) -> Self {
        Self {
            provider,
            backend,
            settings,
        }
    }

    pub async fn reply(&self, request: &ChatRequest) -> Result<String, ChatError> {
        let items = self.backend.wardrobe_items(request.user_id).await;
        let profile = self.backend.profile(request.user_id).await;
        let context = build_wardrobe_context(&items, &profile);

        let messages = build_conversation(
            context,
            &request.chat_history,
            &request.message,
            self.settings.history_limit,
        );

        tracing::debug!(
            user_id = request.user_id,
            history_len = request.chat_history.len(),
            message_count = messages.len(),
            "Requesting stylist reply"
        );

        let params = GenerationParams {
            model: self.settings.model.clone(),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(self.settings.max_tokens),
            response_format: ResponseFormat::Text,
        };

        let result = self
            .provider
            .complete(&messages, &params)
            .await
            .map_err(ChatError::from)
            .and_then(|response| {
                response
                    .text
                    .filter(|text| !text.trim().is_empty())
                    .ok_or(ChatError::EmptyReply)
            });

        let outcome = if result.is_ok() { "success" } else { "error" };
        counter!("chat_replies_total", "outcome" => outcome).increment(1);

        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BackendSettings;
    use service_core::providers::mock::MockChatProvider;
    use service_core::providers::Role;
    use std::time::Duration;

    fn turn(text: &str, is_bot: bool) -> ChatMessage {
        ChatMessage {
            text: text.to_string(),
            is_bot,
            timestamp: "2024-05-01T10:00:00Z".to_string(),
        }
    }

    fn unreachable_backend() -> BackendClient {
        BackendClient::new(&BackendSettings {
            url: "http://127.0.0.1:9".to_string(),
            timeout: Duration::from_secs(1),
        })
        .unwrap()
    }

    fn request(message: &str) -> ChatRequest {
        ChatRequest {
            message: message.to_string(),
            user_id: 7,
            chat_history: Vec::new(),
        }
    }

    #[test]
    fn conversation_keeps_only_the_latest_turns_in_order() {
        let history: Vec<ChatMessage> = (0..15)
            .map(|i| turn(&format!("turn {}", i), i % 2 == 1))
            .collect();

        let messages = build_conversation("ctx".to_string(), &history, "now", 10);

        assert_eq!(messages.len(), 13);
        assert_eq!(messages[0].text(), Some(PERSONA));
        assert_eq!(messages[1].text(), Some("ctx"));
        let replayed: Vec<_> = messages[2..12].iter().filter_map(|m| m.text()).collect();
        let expected: Vec<String> = (5..15).map(|i| format!("turn {}", i)).collect();
        assert_eq!(replayed, expected);
        assert_eq!(messages[12].role, Role::User);
        assert_eq!(messages[12].text(), Some("now"));
    }

    #[test]
    fn bot_turns_become_assistant_messages() {
        let history = vec![turn("hi", false), turn("Hello! How can I help?", true)];

        let messages = build_conversation(String::new(), &history, "shoes?", 10);

        assert_eq!(messages[2].role, Role::User);
        assert_eq!(messages[3].role, Role::Assistant);
    }

    #[test]
    fn short_history_is_sent_whole() {
        let history = vec![turn("a", false), turn("b", true), turn("c", false)];
        let messages = build_conversation(String::new(), &history, "d", 10);
        assert_eq!(messages.len(), 6);
    }

    #[tokio::test]
    async fn reply_uses_text_mode_and_chat_settings() {
        let provider = Arc::new(MockChatProvider::with_replies([Some("Wear the navy blazer.")]));
        let chat = StylistChat::new(
            provider.clone(),
            unreachable_backend(),
            ChatSettings::default(),
        );

        let reply = chat.reply(&request("What should I wear?")).await.unwrap();

        assert_eq!(reply, "Wear the navy blazer.");
        let calls = provider.calls().await;
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].params.model, "gpt-4o-mini");
        assert_eq!(calls[0].params.max_tokens, Some(100));
        assert_eq!(calls[0].params.temperature, Some(0.7));
        assert_eq!(calls[0].params.response_format, ResponseFormat::Text);
    }

    #[tokio::test]
    async fn missing_reply_is_an_error() {
        let provider = Arc::new(MockChatProvider::with_replies([None::<String>]));
        let chat = StylistChat::new(provider, unreachable_backend(), ChatSettings::default());

        let result = chat.reply(&request("hi")).await;

        assert!(matches!(result, Err(ChatError::EmptyReply)));
    }

    #[tokio::test]
    async fn provider_failure_maps_to_service_error() {
        let provider = Arc::new(MockChatProvider::new());
        let chat = StylistChat::new(provider, unreachable_backend(), ChatSettings::default());

        let err = chat.reply(&request("hi")).await.unwrap_err();
        assert!(matches!(err, ChatError::Provider(_)));

        match AppError::from(err) {
            AppError::ServiceError(message) => assert_eq!(message, "Chat service error"),
            other => panic!("expected ServiceError, got {:?}", other),
        }
    }
}
