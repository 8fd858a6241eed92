//! Self-update API handlers.

use crate::{api::ApiError, update, AppState};
use axum::{
    extract::{Extension, Form},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// Handler for `GET /api/check_update`.
///
/// Reports whether a newer release is published. Failures never surface;
/// the client just sees no update available.
pub async fn check_update_handler(Extension(state): Extension<Arc<AppState>>) -> Json<Value> {
    match update::check_for_update(&state.http, &state.update_repo, env!("CARGO_PKG_VERSION"))
        .await
    {
        Some(info) => Json(json!({
            "update_available": true,
            "latest_version": info.latest_version,
            "download_url": info.download_url,
        })),
        None => Json(json!({ "update_available": false })),
    }
}

/// Form body for `POST /api/do_update`.
#[derive(Debug, Deserialize)]
pub struct DoUpdateRequest {
    pub download_url: String,
}

/// Handler for `POST /api/do_update`.
///
/// Downloads the release archive, stages the new .app bundle and hands off
/// to a detached script that swaps it in. The process exits shortly after
/// responding so the swap can proceed.
pub async fn do_update_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(request): Form<DoUpdateRequest>,
) -> Result<Json<Value>, ApiError> {
    let bundle = update::installed_bundle().ok_or_else(|| {
        ApiError::BadRequest(
            "Current executable is not inside a standard macOS .app bundle structure.".to_string(),
        )
    })?;

    update::apply_update(&state.http, &request.download_url, &bundle)
        .await
        .map_err(|e| ApiError::InternalServerError(e.to_string()))?;

    tracing::info!("update staged, restarting");
    tokio::spawn(async {
        tokio::time::sleep(Duration::from_secs(2)).await;
        std::process::exit(0);
    });

    Ok(Json(json!({
        "status": "success",
        "message": "Update initiated. Restarting..."
    })))
}
