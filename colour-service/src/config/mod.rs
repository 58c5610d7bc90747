use service_core::config::{self as core_config, get_env, get_env_parsed, split_list};
use service_core::error::AppError;
use service_core::providers::openai::OpenAiConfig;

const DEFAULT_MODEL: &str = "gpt-4o";
const DEFAULT_MAX_TOKENS: u32 = 700;
const DEFAULT_REPAIR_MAX_TOKENS: u32 = 150;
const DEFAULT_TEMPERATURE: f32 = 0.2;
/// 10 MiB
const DEFAULT_MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;
pub const DEFAULT_CORS_ORIGINS: &str =
    "http://localhost:5173,http://localhost:5174,http://localhost:5175";

#[derive(Debug, Clone)]
pub struct ColourConfig {
    pub common: core_config::Config,
    pub openai: OpenAiConfig,
    pub analysis: AnalysisSettings,
    pub max_upload_bytes: usize,
    pub cors_allowed_origins: Vec<String>,
}

/// Model parameters for the first attempt and the JSON repair attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    pub model: String,
    pub max_tokens: u32,
    pub repair_max_tokens: u32,
    pub temperature: f32,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            repair_max_tokens: DEFAULT_REPAIR_MAX_TOKENS,
            temperature: DEFAULT_TEMPERATURE,
        }
    }
}

impl ColourConfig {
    pub fn load() -> Result<Self, AppError> {
        let common = core_config::Config::load()?;
        let is_prod = core_config::is_prod();

        Ok(ColourConfig {
            common,
            openai: OpenAiConfig::from_env(is_prod)?,
            analysis: AnalysisSettings {
                model: get_env("COLOUR_MODEL", Some(DEFAULT_MODEL), is_prod)?,
                max_tokens: get_env_parsed("COLOUR_MAX_TOKENS", DEFAULT_MAX_TOKENS, is_prod)?,
                repair_max_tokens: get_env_parsed(
                    "COLOUR_REPAIR_MAX_TOKENS",
                    DEFAULT_REPAIR_MAX_TOKENS,
                    is_prod,
                )?,
                temperature: get_env_parsed("COLOUR_TEMPERATURE", DEFAULT_TEMPERATURE, is_prod)?,
            },
            max_upload_bytes: get_env_parsed(
                "COLOUR_MAX_UPLOAD_BYTES",
                DEFAULT_MAX_UPLOAD_BYTES,
                is_prod,
            )?,
            cors_allowed_origins: split_list(&get_env(
                "CORS_ALLOWED_ORIGINS",
                Some(DEFAULT_CORS_ORIGINS),
                is_prod,
            )?),
        })
    }
}
