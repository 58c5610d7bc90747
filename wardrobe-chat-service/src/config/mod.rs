use service_core::config::{self as core_config, get_env, get_env_parsed, split_list};
use service_core::error::AppError;
use service_core::providers::openai::OpenAiConfig;
use std::time::Duration;

const DEFAULT_MODEL: &str = "gpt-4o-mini";
const DEFAULT_MAX_TOKENS: u32 = 100;
const DEFAULT_TEMPERATURE: f32 = 0.7;
const DEFAULT_HISTORY_LIMIT: usize = 10;
const DEFAULT_BACKEND_URL: &str = "http://localhost:5001";
const DEFAULT_BACKEND_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:5174,http://localhost:5175";

#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub common: core_config::Config,
    pub openai: OpenAiConfig,
    pub chat: ChatSettings,
    pub backend: BackendSettings,
    pub cors_allowed_origins: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ChatSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: f32,
    /// Most recent history turns forwarded to the model.
    pub history_limit: usize,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
            history_limit: DEFAULT_HISTORY_LIMIT,
        }
    }
}

/// The REST backend that owns wardrobe items and profiles.
#[derive(Debug, Clone, PartialEq)]
pub struct BackendSettings {
    pub url: String,
    pub timeout: Duration,
}

impl ChatConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        Ok(ChatConfig {
            common,
            openai: OpenAiConfig::from_env(is_prod)?,
            chat: ChatSettings {
                model: get_env("CHAT_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                max_tokens: get_env_parsed("CHAT_MAX_TOKENS", DEFAULT_MAX_TOKENS, is_prod)?,
                temperature: get_env_parsed("CHAT_TEMPERATURE", DEFAULT_TEMPERATURE, is_prod)?,
                history_limit: get_env_parsed(
                    "CHAT_HISTORY_LIMIT",
                    DEFAULT_HISTORY_LIMIT,
                    is_prod,
                )?,
            },
            backend: BackendSettings {
                url: get_env("BACKEND_URL", Some(DEFAULT_BACKEND_URL), is_prod)?,
                timeout: Duration::from_secs(get_env_parsed(
                    "BACKEND_TIMEOUT_SECS",
                    DEFAULT_BACKEND_TIMEOUT_SECS,
                    is_prod,
                )?),
            },
            cors_allowed_origins: split_list(&get_env(
                "CORS_ALLOWED_ORIGINS",
                Some(DEFAULT_CORS_ORIGINS),
                is_prod,
            )?),
        })
    }
}
