//! Colour analysis against the model, with one JSON repair attempt.
//!
//! The exchange is a two-state machine driven by [`transition`]:
//!
//! | state           | model output           | next                      |
//! |-----------------|------------------------|---------------------------|
//! | `FirstAttempt`  | empty                  | fail with `UpstreamEmpty` |
//! | `FirstAttempt`  | valid JSON             | done                      |
//! | `FirstAttempt`  | non-empty, not JSON    | `RepairAttempt`           |
//! | `RepairAttempt` | valid JSON             | done                      |
//! | `RepairAttempt` | anything else          | fail with `UpstreamInvalid` |

use crate::config::AnalysisSettings;
use crate::services::image::EncodedPhoto;
use metrics::counter;
use serde::Deserialize;
use serde_json::Value;
use service_core::error::AppError;
use service_core::providers::{
    ChatProvider, ContentPart, GenerationParams, Message, ProviderError, ResponseFormat,
};
use std::sync::Arc;
use thiserror::Error;

pub const SYSTEM_PROMPT: &str = concat!(
    "You are a professional colour analyst. ",
    r##"Return JSON: {"season":"...", "undertone":"...", "palette":["#RRGGBB", ...]}"##
);

pub const REPAIR_INSTRUCTION: &str = "Return ONLY valid JSON.";

/// Longest slice of a malformed reply written to the logs.
const LOGGED_OUTPUT_LIMIT: usize = 2_000;

#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("profile must be valid JSON")]
    InvalidProfile,

    #[error("Invalid image")]
    InvalidImage,

    #[error("model returned empty content")]
    UpstreamEmpty,

    #[error("Colour analysis failed: invalid JSON from model")]
    UpstreamInvalid,

    #[error("Colour analysis failed: model request error")]
    Provider(#[from] ProviderError),
}

impl From<AnalysisError> for AppError {
    fn from(err: AnalysisError) -> Self {
        match err {
            AnalysisError::InvalidProfile | AnalysisError::InvalidImage => {
                AppError::BadRequest(anyhow::anyhow!(err.to_string()))
            }
            AnalysisError::UpstreamEmpty => AppError::BadGateway(err.to_string()),
            AnalysisError::UpstreamInvalid | AnalysisError::Provider(_) => {
                AppError::ServiceError(err.to_string())
            }
        }
    }
}

/// Shape the model is asked to return. Only checked, never enforced.
#[derive(Debug, Deserialize)]
pub struct AnalysisResult {
    pub season: String,
    pub undertone: String,
    pub palette: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttemptState {
    FirstAttempt,
    /// Carries the malformed output to feed back to the model.
    RepairAttempt { malformed: String },
}

impl AttemptState {
    fn label(&self) -> &'static str {
        match self {
            AttemptState::FirstAttempt => "first",
            AttemptState::RepairAttempt { .. } => "repair",
        }
    }
}

#[derive(Debug)]
pub enum Transition {
    Done(Value),
    Next(AttemptState),
    Fail(AnalysisError),
}

/// Apply one model output to the current state.
pub fn transition(state: &AttemptState, output: Option<&str>) -> Transition {
    match state {
        AttemptState::FirstAttempt => match output.filter(|raw| !raw.is_empty()) {
            None => Transition::Fail(AnalysisError::UpstreamEmpty),
            Some(raw) => match serde_json::from_str::<Value>(raw) {
                Ok(value) => Transition::Done(value),
                Err(_) => Transition::Next(AttemptState::RepairAttempt {
                    malformed: raw.to_string(),
                }),
            },
        },
        AttemptState::RepairAttempt { .. } => {
            match output.and_then(|raw| serde_json::from_str::<Value>(raw).ok()) {
                Some(value) => Transition::Done(value),
                None => Transition::Fail(AnalysisError::UpstreamInvalid),
            }
        }
    }
}

/// Runs colour analyses against an injected model provider.
pub struct ColourAnalyzer {
    provider: Arc<dyn ChatProvider>,
    settings: AnalysisSettings,
}

impl ColourAnalyzer {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: AnalysisSettings) -> Self {
        Self { provider, settings }
    }

    /// Ask the model for a palette judgement and return its JSON verbatim.
    pub async fn analyze(
        &self,
        profile: &Value,
        photo: &EncodedPhoto,
    ) -> Result<Value, AnalysisError> {
        let mut state = AttemptState::FirstAttempt;

        // At most two iterations: `RepairAttempt` never yields `Next`.
        loop {
            let (messages, params) = self.request_for(&state, profile, photo);
            counter!("colour_analysis_attempts_total", "attempt" => state.label()).increment(1);

            let response = self.provider.complete(&messages, &params).await.map_err(|e| {
                tracing::error!(attempt = state.label(), error = %e, "Model request failed");
                counter!("colour_analysis_outcomes_total", "outcome" => "provider_error")
                    .increment(1);
                AnalysisError::from(e)
            })?;

            match transition(&state, response.text.as_deref()) {
                Transition::Done(value) => {
                    check_shape(&value);
                    tracing::info!(attempt = state.label(), "Colour analysis completed");
                    counter!("colour_analysis_outcomes_total", "outcome" => "success")
                        .increment(1);
                    return Ok(value);
                }
                Transition::Next(next) => {
                    if let AttemptState::RepairAttempt { malformed } = &next {
                        tracing::warn!(
                            output_len = malformed.len(),
                            "Model returned invalid JSON, issuing repair request"
                        );
                        tracing::debug!(raw = %truncate(malformed), "Malformed model output");
                    }
                    state = next;
                }
                Transition::Fail(err) => {
                    tracing::error!(attempt = state.label(), error = %err, "Colour analysis failed");
                    let outcome = match err {
                        AnalysisError::UpstreamEmpty => "empty",
                        _ => "invalid",
                    };
                    counter!("colour_analysis_outcomes_total", "outcome" => outcome).increment(1);
                    return Err(err);
                }
            }
        }
    }

    fn request_for(
        &self,
        state: &AttemptState,
        profile: &Value,
        photo: &EncodedPhoto,
    ) -> (Vec<Message>, GenerationParams) {
        match state {
            AttemptState::FirstAttempt => (
                vec![
                    Message::system(SYSTEM_PROMPT),
                    Message::user_parts(vec![
                        ContentPart::text(format!("Client profile:\n{}", profile)),
                        ContentPart::image_url(photo.data_url()),
                    ]),
                ],
                self.params(self.settings.max_tokens),
            ),
            AttemptState::RepairAttempt { malformed } => (
                vec![
                    Message::system(SYSTEM_PROMPT),
                    Message::user(REPAIR_INSTRUCTION),
                    Message::assistant(malformed.clone()),
                ],
                self.params(self.settings.repair_max_tokens),
            ),
        }
    }

    fn params(&self, max_tokens: u32) -> GenerationParams {
        GenerationParams {
            model: self.settings.model.clone(),
            temperature: Some(self.settings.temperature),
            max_tokens: Some(max_tokens),
            response_format: ResponseFormat::JsonObject,
        }
    }
}

fn check_shape(value: &Value) {
    if let Err(e) = serde_json::from_value::<AnalysisResult>(value.clone()) {
        tracing::warn!(error = %e, "Model JSON does not match the analysis result shape");
        counter!("colour_analysis_shape_mismatch_total").increment(1);
    }
}

fn truncate(raw: &str) -> &str {
    match raw.char_indices().nth(LOGGED_OUTPUT_LIMIT) {
        Some((idx, _)) => &raw[..idx],
        None => raw,
    }
}
