//! Speech generation API handler.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{multipart::Field, Extension, Multipart},
    http::{header, HeaderMap, HeaderValue},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use vox_engine::{dispatch, CloneReference, GenerationMode, GenerationRequest};
use vox_types::{ModelSize, ModelSpec, ModelType, SamplingParams};

/// Raw form fields accepted by `POST /api/generate`.
#[derive(Default)]
struct GenerateForm {
    text: Option<String>,
    language: Option<String>,
    model_size: Option<String>,
    model_type: Option<String>,
    speaker: Option<String>,
    voice_design_prompt: Option<String>,
    ref_text: Option<String>,
    ref_audio: Option<axum::body::Bytes>,
    profile_id: Option<String>,
}

async fn text_field(field: Field<'_>) -> Result<String, ApiError> {
    let name = field.name().unwrap_or("field").to_string();
    field
        .text()
        .await
        .map_err(|e| ApiError::BadRequest(format!("failed to read {}: {}", name, e)))
}

async fn read_form(mut multipart: Multipart) -> Result<GenerateForm, ApiError> {
    let mut form = GenerateForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        match field.name() {
            Some("text") => form.text = Some(text_field(field).await?),
            Some("language") => form.language = Some(text_field(field).await?),
            Some("model_size") => form.model_size = Some(text_field(field).await?),
            Some("model_type") => form.model_type = Some(text_field(field).await?),
            Some("speaker") => form.speaker = Some(text_field(field).await?),
            Some("voice_design_prompt") => {
                form.voice_design_prompt = Some(text_field(field).await?)
            }
            Some("ref_text") => form.ref_text = Some(text_field(field).await?),
            Some("ref_audio") => {
                form.ref_audio = Some(field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read upload: {}", e))
                })?);
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Handler for `POST /api/generate`.
///
/// Synthesizes speech and streams it back as a WAV attachment. The model
/// named by `model_size`/`model_type` is loaded on demand; enum fields are
/// rejected before any model work begins.
pub async fn generate_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Response, ApiError> {
    let form = read_form(multipart).await?;

    let size: ModelSize = form
        .model_size
        .as_deref()
        .unwrap_or("1.7B")
        .parse()
        .map_err(|_| {
            ApiError::BadRequest("Invalid model_size. Must be one of: 0.6B, 1.7B".to_string())
        })?;
    let model_type: ModelType = form
        .model_type
        .as_deref()
        .unwrap_or("CustomVoice")
        .parse()
        .map_err(|_| {
            ApiError::BadRequest(
                "Invalid model_type. Must be one of: Base, CustomVoice, VoiceDesign".to_string(),
            )
        })?;

    let text = form
        .text
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::BadRequest("text is required".to_string()))?;
    let language = form.language.unwrap_or_else(|| "English".to_string());

    // Holds an ad-hoc reference recording on disk until generation finishes;
    // dropping it removes the file, on the error paths too.
    let mut scratch = None;

    let mode = match model_type {
        ModelType::CustomVoice => GenerationMode::CustomVoice {
            speaker: form.speaker.unwrap_or_else(|| "Vivian".to_string()),
        },
        ModelType::VoiceDesign => {
            let instruction = form
                .voice_design_prompt
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    ApiError::BadRequest(
                        "voice_design_prompt is required for VoiceDesign models.".to_string(),
                    )
                })?;
            GenerationMode::VoiceDesign { instruction }
        }
        ModelType::Base => {
            if let Some(profile_id) = form.profile_id.filter(|id| !id.is_empty()) {
                let store = state.profiles.clone();
                let profile = tokio::task::spawn_blocking(move || store.resolve(&profile_id))
                    .await
                    .map_err(|e| {
                        ApiError::InternalServerError(format!("task join error: {}", e))
                    })??;
                GenerationMode::VoiceClone(CloneReference {
                    audio_path: profile.audio_path,
                    ref_text: profile.ref_text,
                })
            } else {
                let pair = form
                    .ref_text
                    .filter(|t| !t.is_empty())
                    .zip(form.ref_audio);
                let (ref_text, data) = pair.ok_or_else(|| {
                    ApiError::BadRequest(
                        "ref_text and ref_audio (or profile_id) are required for Voice Cloning \
                         in Base models."
                            .to_string(),
                    )
                })?;

                let file = tempfile::Builder::new()
                    .prefix("vox_ref_")
                    .suffix(".wav")
                    .tempfile()
                    .map_err(|e| {
                        ApiError::InternalServerError(format!(
                            "failed to stage reference audio: {}",
                            e
                        ))
                    })?;
                tokio::fs::write(file.path(), &data).await.map_err(|e| {
                    ApiError::InternalServerError(format!("failed to stage reference audio: {}", e))
                })?;

                let reference = CloneReference {
                    audio_path: file.path().to_path_buf(),
                    ref_text,
                };
                scratch = Some(file);
                GenerationMode::VoiceClone(reference)
            }
        }
    };

    let spec = ModelSpec { size, model_type };
    let model = state.manager.acquire(spec).await?;

    let request = GenerationRequest {
        text,
        language,
        sampling: SamplingParams::default(),
    };
    let waveform = tokio::task::spawn_blocking(move || dispatch(model.as_ref(), &request, &mode))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;
    drop(scratch);

    tracing::info!(
        model = %spec,
        samples = waveform.samples.len(),
        sample_rate = waveform.sample_rate,
        "generated speech"
    );

    let wav = vox_audio::write_wav_i16(&waveform.samples, waveform.sample_rate)?;

    let mut headers = HeaderMap::new();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("audio/wav"));
    headers.insert(
        header::CONTENT_DISPOSITION,
        HeaderValue::from_static("attachment; filename=generated.wav"),
    );
    Ok((headers, wav).into_response())
}
