#![allow(dead_code)]

use secrecy::Secret;
use serde_json::Value;
use service_core::config::{split_list, Config as CoreConfig};
use service_core::providers::mock::MockChatProvider;
use service_core::providers::openai::{OpenAiConfig, OPENAI_API_BASE};
use std::sync::Arc;
use std::time::Duration;
use wardrobe_chat_service::config::{
    BackendSettings, ChatConfig, ChatSettings, DEFAULT_CORS_ORIGINS,
};
use wardrobe_chat_service::startup::Application;
use wiremock::MockServer;

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockChatProvider>,
    pub client: reqwest::Client,
}

pub fn test_config(backend_url: String) -> ChatConfig {
    ChatConfig {
        common: CoreConfig {
            port: 0, // Random port for testing
            log_level: "debug".to_string(),
            otlp_endpoint: None,
        },
        openai: OpenAiConfig {
            api_key: Secret::new("sk-test".to_string()),
            base_url: OPENAI_API_BASE.to_string(),
            timeout: Duration::from_secs(5),
        },
        chat: ChatSettings::default(),
        backend: BackendSettings {
            url: backend_url,
            timeout: Duration::from_secs(2),
        },
        cors_allowed_origins: split_list(DEFAULT_CORS_ORIGINS),
    }
}

impl TestApp {
    /// Spawn the service against a mock backend.
    pub async fn spawn(provider: MockChatProvider, backend: &MockServer) -> Self {
        Self::spawn_with_backend_url(provider, backend.uri()).await
    }

    pub async fn spawn_with_backend_url(provider: MockChatProvider, backend_url: String) -> Self {
        let provider = Arc::new(provider);
        let app = Application::build_with_provider(test_config(backend_url), provider.clone())
            .await
            .expect("Failed to build test application");

        let address = format!("http://127.0.0.1:{}", app.port());

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }

        TestApp {
            address,
            provider,
            client,
        }
    }

    pub async fn post_chat(&self, body: &Value) -> reqwest::Response {
        self.client
            .post(format!("{}/chat", self.address))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }
}
