//! Audio post-processing API handlers: merge and treatments.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Multipart},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use vox_audio::{merge_clips, read_wav, treat, write_wav_i16, AudioError, Treatment};

/// Handler for `POST /api/merge`.
///
/// Concatenates the uploaded clips in request order with one second of
/// silence between consecutive clips, and streams the result back.
pub async fn merge_handler(mut multipart: Multipart) -> Result<Response, ApiError> {
    let mut uploads = Vec::new();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        if field.name() == Some("files") {
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(format!("failed to read upload: {}", e)))?;
            uploads.push(data);
        }
    }

    if uploads.is_empty() {
        return Err(ApiError::BadRequest("No files provided".to_string()));
    }

    let merged = tokio::task::spawn_blocking(move || -> Result<Vec<u8>, AudioError> {
        let clips = uploads
            .iter()
            .map(|bytes| read_wav(bytes))
            .collect::<Result<Vec<_>, _>>()?;
        let combined = merge_clips(&clips)?;
        write_wav_i16(&combined.samples, combined.sample_rate)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))?
    .map_err(|e| ApiError::InternalServerError(format!("Failed to merge audio: {}", e)))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=merged_audio.wav"),
    );
    Ok((headers, merged).into_response())
}

/// Handler for `POST /api/treat`.
///
/// Runs the uploaded audio through one of the named ffmpeg filter presets.
pub async fn treat_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Response, ApiError> {
    let mut audio = None;
    let mut treatment_type = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        match field.name() {
            Some("audio_file") => {
                audio = Some(field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read upload: {}", e))
                })?);
            }
            Some("treatment_type") => {
                treatment_type = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read treatment_type: {}", e))
                })?);
            }
            _ => {}
        }
    }

    let audio =
        audio.ok_or_else(|| ApiError::BadRequest("No audio file provided.".to_string()))?;
    let treatment: Treatment = treatment_type
        .as_deref()
        .unwrap_or("")
        .parse()
        .map_err(|_| {
            ApiError::BadRequest(
                "Invalid treatment type. Must be one of: podcast, warmth, clear".to_string(),
            )
        })?;

    let processed = treat(&audio, treatment, &state.ffmpeg)
        .await
        .map_err(|e| ApiError::InternalServerError(format!("Failed to treat audio: {}", e)))?;

    let disposition = format!("attachment; filename={}_treated.wav", treatment);
    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_str(&disposition)
            .map_err(|e| ApiError::InternalServerError(format!("invalid header: {}", e)))?,
    );
    Ok((headers, processed).into_response())
}
