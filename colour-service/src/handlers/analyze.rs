use crate::services::{normalize_photo, AnalysisError};
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{multipart::MultipartError, Multipart, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;
use service_core::error::AppError;

pub const PROFILE_FIELD: &str = "profile";
pub const PHOTO_FIELD: &str = "photo";

/// `POST /analyze`: multipart `profile` (JSON text) and `photo` (image file).
pub async fn analyze_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<Value>, AppError> {
    let mut profile: Option<String> = None;
    let mut photo: Option<Bytes> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read multipart field", e))?
    {
        let name = field.name().unwrap_or_default().to_string();
        match name.as_str() {
            PROFILE_FIELD => {
                profile = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| multipart_error("Failed to read profile", e))?,
                );
            }
            PHOTO_FIELD => {
                photo = Some(
                    field
                        .bytes()
                        .await
                        .map_err(|e| multipart_error("Failed to read photo", e))?,
                );
            }
            other => tracing::debug!(field = %other, "Ignoring unexpected multipart field"),
        }
    }

    let profile = profile
        .ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("profile field is required")))?;
    let profile: Value = serde_json::from_str(&profile).map_err(|e| {
        tracing::warn!(error = %e, "Rejecting profile that is not valid JSON");
        AnalysisError::InvalidProfile
    })?;

    let photo =
        photo.ok_or_else(|| AppError::BadRequest(anyhow::anyhow!("photo field is required")))?;

    let photo_len = photo.len();
    let encoded = tokio::task::spawn_blocking(move || normalize_photo(&photo))
        .await
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Image task failed: {}", e)))?
        .map_err(|e| {
            tracing::warn!(error = %e, bytes = photo_len, "Rejecting undecodable photo");
            AnalysisError::InvalidImage
        })?;

    tracing::info!(
        photo_bytes = photo_len,
        encoded_len = encoded.base64.len(),
        "Photo normalised, requesting colour analysis"
    );

    let result = state.analyzer.analyze(&profile, &encoded).await?;

    Ok(Json(result))
}

/// Multipart read failures are 400, except uploads over the body limit (413).
fn multipart_error(context: &str, err: MultipartError) -> AppError {
    if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
        tracing::warn!(error = %err, "Rejecting upload over the body limit");
        AppError::PayloadTooLarge(format!("{}: upload exceeds the size limit", context))
    } else {
        AppError::BadRequest(anyhow::anyhow!("{}: {}", context, err))
    }
}
