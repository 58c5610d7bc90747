//! Scripted provider for tests.

use super::{ChatProvider, GenerationParams, Message, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::collections::VecDeque;
use tokio::sync::Mutex;

/// One call observed by [`MockChatProvider`].
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub params: GenerationParams,
}

/// Provider that replays queued responses in order and records every call.
///
/// Once the queue is exhausted, further calls fail with `NotConfigured`.
#[derive(Default)]
pub struct MockChatProvider {
    responses: Mutex<VecDeque<Result<ProviderResponse, ProviderError>>>,
    calls: Mutex<Vec<RecordedCall>>,
}

impl MockChatProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue text responses; `None` stands for a reply without content.
    pub fn with_replies<I, S>(replies: I) -> Self
    where
        I: IntoIterator<Item = Option<S>>,
        S: Into<String>,
    {
        let queue = replies
            .into_iter()
            .map(|reply| {
                Ok(match reply {
                    Some(text) => ProviderResponse::from_text(text),
                    None => ProviderResponse::empty(),
                })
            })
            .collect();

        Self {
            responses: Mutex::new(queue),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub async fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().await.clone()
    }

    pub async fn call_count(&self) -> usize {
        self.calls.lock().await.len()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        messages: &[Message],
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.lock().await.push(RecordedCall {
            messages: messages.to_vec(),
            params: params.clone(),
        });

        self.responses.lock().await.pop_front().unwrap_or_else(|| {
            Err(ProviderError::NotConfigured(
                "Mock provider has no scripted response left".to_string(),
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replays_in_order_then_fails() {
        let provider = MockChatProvider::with_replies([Some("first"), None]);
        let params = GenerationParams::default();

        let first = provider.complete(&[Message::user("a")], &params).await.unwrap();
        assert_eq!(first.text.as_deref(), Some("first"));

        let second = provider.complete(&[Message::user("b")], &params).await.unwrap();
        assert_eq!(second.text, None);

        assert!(provider.complete(&[], &params).await.is_err());
        assert_eq!(provider.call_count().await, 3);
        assert_eq!(provider.calls().await[1].messages[0].text(), Some("b"));
    }
}
