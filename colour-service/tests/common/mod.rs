#![allow(dead_code)]

use colour_service::config::{AnalysisSettings, ColourConfig, DEFAULT_CORS_ORIGINS};
use colour_service::startup::Application;
use secrecy::Secret;
use service_core::config::{split_list, Config as CoreConfig};
use service_core::providers::mock::MockChatProvider;
use service_core::providers::openai::{OpenAiConfig, OPENAI_API_BASE};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

pub struct TestApp {
    pub address: String,
    pub provider: Arc<MockChatProvider>,
    pub client: reqwest::Client,
}

pub fn test_config() -> ColourConfig {
    ColourConfig {
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
        analysis: AnalysisSettings::default(),
        max_upload_bytes: 1024 * 1024,
        cors_allowed_origins: split_list(DEFAULT_CORS_ORIGINS),
    }
}

impl TestApp {
    /// Spawn the service with a scripted model provider.
    pub async fn spawn(provider: MockChatProvider) -> Self {
        Self::spawn_with_config(provider, test_config()).await
    }

    pub async fn spawn_with_config(provider: MockChatProvider, config: ColourConfig) -> Self {
        let provider = Arc::new(provider);
        let app = Application::build_with_provider(config, provider.clone())
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

    pub async fn post_analyze(&self, form: reqwest::multipart::Form) -> reqwest::Response {
        self.client
            .post(format!("{}/analyze", self.address))
            .multipart(form)
            .send()
            .await
            .expect("Failed to execute request")
    }
}

/// A small PNG, decodable by the service.
pub fn png_photo() -> Vec<u8> {
    let img = image::RgbImage::from_pixel(16, 16, image::Rgb([180, 140, 110]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("Failed to encode test PNG");
    out.into_inner()
}

pub fn analyze_form(profile: &str, photo: Vec<u8>) -> reqwest::multipart::Form {
    reqwest::multipart::Form::new()
        .text("profile", profile.to_string())
        .part(
            "photo",
            reqwest::multipart::Part::bytes(photo)
                .file_name("me.png")
                .mime_str("image/png")
                .expect("valid mime"),
        )
}
