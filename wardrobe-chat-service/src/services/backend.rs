//! Best-effort reads from the wardrobe backend.

use crate::config::BackendSettings;
use crate::models::{UserProfile, WardrobeItem};
use metrics::counter;
use reqwest::Client;
use serde::de::DeserializeOwned;
use service_core::error::AppError;
use service_core::observability::TracedClientExt;

/// Outcome of a backend read. Failures are carried, never raised.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    Unavailable(String),
}

impl<T> Lookup<T> {
    pub fn found(&self) -> Option<&T> {
        match self {
            Lookup::Found(value) => Some(value),
            Lookup::Unavailable(_) => None,
        }
    }
}

#[derive(Clone)]
pub struct BackendClient {
    client: Client,
    base_url: String,
}

impl BackendClient {
    pub fn new(settings: &BackendSettings) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(|e| {
                AppError::ConfigError(anyhow::anyhow!("Failed to create backend client: {}", e))
            })?;

        Ok(Self {
            client,
            base_url: settings.url.trim_end_matches('/').to_string(),
        })
    }

    pub async fn wardrobe_items(&self, user_id: i64) -> Lookup<Vec<WardrobeItem>> {
        self.lookup("wardrobe_items", user_id).await
    }

    pub async fn profile(&self, user_id: i64) -> Lookup<UserProfile> {
        self.lookup("profile", user_id).await
    }

    async fn lookup<T>(&self, resource: &'static str, user_id: i64) -> Lookup<T>
    where
        T: DeserializeOwned,
    {
        let result = self.fetch(resource, user_id).await;

        let outcome = match &result {
            Lookup::Found(_) => "found",
            Lookup::Unavailable(reason) => {
                tracing::warn!(resource, user_id, reason = %reason, "Backend lookup failed");
                "unavailable"
            }
        };
        counter!("chat_backend_lookups_total", "resource" => resource, "outcome" => outcome)
            .increment(1);

        result
    }

    async fn fetch<T: DeserializeOwned>(&self, resource: &str, user_id: i64) -> Lookup<T> {
        let url = format!("{}/{}", self.base_url, resource);

        let response = match self
            .client
            .traced_get(&url)
            .query(&[("userId", user_id)])
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return Lookup::Unavailable(format!("request failed: {}", e)),
        };

        let status = response.status();
        if !status.is_success() {
            return Lookup::Unavailable(format!("backend returned {}", status));
        }

        match response.json::<T>().await {
            Ok(body) => Lookup::Found(body),
            Err(e) => Lookup::Unavailable(format!("undecodable body: {}", e)),
        }
    }
}
