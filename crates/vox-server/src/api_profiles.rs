//! Voice profile API handlers.

use crate::{api::ApiError, AppState};
use axum::{
    extract::{Extension, Multipart, Path},
    Json,
};
use serde_json::{json, Value};
use std::sync::Arc;
use vox_types::VoiceProfile;

/// Handler for `GET /api/profiles`.
///
/// Lists all saved voice profiles, built-in first.
pub async fn list_profiles_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Json<Vec<VoiceProfile>>, ApiError> {
    let profiles = tokio::task::spawn_blocking(move || state.profiles.list())
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(profiles))
}

/// Handler for `POST /api/profiles`.
///
/// Saves a new voice profile from multipart fields `name`, `ref_text` and
/// the `ref_audio` recording.
pub async fn create_profile_handler(
    Extension(state): Extension<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<Value>, ApiError> {
    let mut name = None;
    let mut ref_text = None;
    let mut audio = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("multipart error: {}", e)))?
    {
        match field.name() {
            Some("name") => {
                name = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read name: {}", e))
                })?);
            }
            Some("ref_text") => {
                ref_text = Some(field.text().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read ref_text: {}", e))
                })?);
            }
            Some("ref_audio") => {
                let filename = field.file_name().unwrap_or("audio.wav").to_string();
                let data = field.bytes().await.map_err(|e| {
                    ApiError::BadRequest(format!("failed to read upload: {}", e))
                })?;
                audio = Some((filename, data));
            }
            _ => {}
        }
    }

    let name = name.ok_or_else(|| ApiError::BadRequest("name is required".to_string()))?;
    let ref_text =
        ref_text.ok_or_else(|| ApiError::BadRequest("ref_text is required".to_string()))?;
    let (filename, data) =
        audio.ok_or_else(|| ApiError::BadRequest("ref_audio is required".to_string()))?;

    let profile = tokio::task::spawn_blocking(move || {
        state.profiles.create(&name, &ref_text, &filename, &data)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "message": "Profile created successfully",
        "id": profile.id
    })))
}

/// Handler for `DELETE /api/profiles/{id}`.
pub async fn delete_profile_handler(
    Extension(state): Extension<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    tokio::task::spawn_blocking(move || state.profiles.delete(&id))
        .await
        .map_err(|e| ApiError::InternalServerError(format!("task join error: {}", e)))??;

    Ok(Json(json!({
        "message": "Profile deleted successfully"
    })))
}
