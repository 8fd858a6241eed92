//! Vox server library logic.

pub mod api;
pub mod api_audio;
pub mod api_generate;
pub mod api_profiles;
pub mod api_progress;
pub mod api_update;
pub mod config;
pub mod update;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::{ServeDir, ServeFile};
use vox_engine::ModelManager;
use vox_profiles::ProfileStore;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Model lifecycle manager holding the resident model.
    pub manager: Arc<ModelManager>,
    /// Voice profile store.
    pub profiles: Arc<ProfileStore>,
    /// ffmpeg binary for audio treatments.
    pub ffmpeg: PathBuf,
    /// Directory holding the UI shell and bundled assets.
    pub static_dir: PathBuf,
    /// GitHub repository slug checked for new releases.
    pub update_repo: String,
    /// Shared HTTP client for release lookups and downloads.
    pub http: reqwest::Client,
}

/// Maximum request body size (2 MiB). Protects against OOM from oversized payloads.
const MAX_REQUEST_BODY_BYTES: usize = 2 * 1024 * 1024;

/// Body size ceiling for routes that accept uploaded audio (50 MiB).
const MAX_UPLOAD_BODY_BYTES: usize = 50 * 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    // Audio routes accept uploaded WAV payloads and need a larger body
    // limit than the rest of the API.
    let upload_routes = Router::new()
        .route(
            "/api/profiles",
            post(api_profiles::create_profile_handler).get(api_profiles::list_profiles_handler),
        )
        .route("/api/generate", post(api_generate::generate_handler))
        .route("/api/merge", post(api_audio::merge_handler))
        .route("/api/treat", post(api_audio::treat_handler))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BODY_BYTES));

    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/api/profiles/{id}",
            delete(api_profiles::delete_profile_handler),
        )
        .route(
            "/api/progress",
            get(api_progress::get_progress_stream_handler),
        )
        .route("/api/check_update", get(api_update::check_update_handler))
        .route("/api/do_update", post(api_update::do_update_handler))
        .merge(upload_routes);

    // UI shell: index at the root, bundled assets under /static.
    let index = state.static_dir.join("index.html");
    let router = router
        .route_service("/", ServeFile::new(index))
        .nest_service("/static", ServeDir::new(&state.static_dir));

    router
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(Extension(Arc::new(state)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;
    use vox_engine::{
        CloneReference, Device, EngineError, GenerationRequest, ModelBackend, Precision,
        ProgressFn, SpeechModel, Waveform,
    };
    use vox_types::ModelSpec;

    struct StubModel;

    impl SpeechModel for StubModel {
        fn custom_voice(
            &self,
            _req: &GenerationRequest,
            _speaker: &str,
        ) -> Result<Waveform, EngineError> {
            Ok(Waveform {
                samples: vec![0.0; 240],
                sample_rate: 24_000,
            })
        }

        fn voice_design(
            &self,
            req: &GenerationRequest,
            _instruction: &str,
        ) -> Result<Waveform, EngineError> {
            self.custom_voice(req, "")
        }

        fn voice_clone(
            &self,
            req: &GenerationRequest,
            _reference: &CloneReference,
        ) -> Result<Waveform, EngineError> {
            self.custom_voice(req, "")
        }
    }

    struct StubBackend;

    impl ModelBackend for StubBackend {
        fn availability(&self) -> Result<(), EngineError> {
            Ok(())
        }

        fn probe_devices(&self) -> Vec<Device> {
            vec![Device::Cpu]
        }

        fn load(
            &self,
            _spec: ModelSpec,
            _device: Device,
            _precision: Precision,
            _on_progress: ProgressFn<'_>,
        ) -> Result<Box<dyn SpeechModel>, EngineError> {
            Ok(Box::new(StubModel))
        }
    }

    #[tokio::test]
    async fn test_health_check_returns_ok() {
        let dir = tempfile::tempdir().unwrap();
        let profiles = ProfileStore::open(dir.path(), &dir.path().join("static")).unwrap();
        let state = AppState {
            manager: Arc::new(ModelManager::new(Arc::new(StubBackend))),
            profiles: Arc::new(profiles),
            ffmpeg: PathBuf::from("ffmpeg"),
            static_dir: dir.path().join("static"),
            update_repo: "example/none".to_string(),
            http: reqwest::Client::new(),
        };

        let response = app(state)
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);

        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["status"], "ok");
        assert_eq!(json["version"], env!("CARGO_PKG_VERSION"));
    }
}
