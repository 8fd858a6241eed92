//! Single-slot model lifecycle.
//!
//! The studio keeps at most one loaded model in memory. Requests for the
//! resident spec share its handle for free; a request for anything else
//! evicts the old model and loads the new one while every other loader
//! waits. Load progress is published through a watch channel so the SSE
//! endpoint can stream it without touching the manager's locks.

use crate::backend::{ModelBackend, SpeechModel};
use crate::device::{select_device, Device};
use crate::error::EngineError;
use std::sync::{Arc, RwLock};
use tokio::sync::{watch, Mutex};
use vox_types::{ModelSpec, ProgressState};

struct LoadedModel {
    spec: ModelSpec,
    model: Arc<dyn SpeechModel>,
    device: Device,
}

/// Owns the resident model slot and the load progress channel.
pub struct ModelManager {
    backend: Arc<dyn ModelBackend>,
    slot: Arc<RwLock<Option<LoadedModel>>>,
    load_lock: Mutex<()>,
    progress: Arc<watch::Sender<ProgressState>>,
}

impl ModelManager {
    pub fn new(backend: Arc<dyn ModelBackend>) -> Self {
        let (progress, _) = watch::channel(ProgressState::default());
        Self {
            backend,
            slot: Arc::new(RwLock::new(None)),
            load_lock: Mutex::new(()),
            progress: Arc::new(progress),
        }
    }

    /// Current load progress snapshot.
    pub fn progress(&self) -> ProgressState {
        self.progress.borrow().clone()
    }

    /// Subscribes to progress changes. The receiver always observes the
    /// latest value; intermediate writes may be skipped.
    pub fn subscribe(&self) -> watch::Receiver<ProgressState> {
        self.progress.subscribe()
    }

    /// Spec of the resident model, if one is loaded.
    pub fn loaded_spec(&self) -> Option<ModelSpec> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .map(|loaded| loaded.spec)
    }

    fn cached(&self, spec: ModelSpec) -> Option<Arc<dyn SpeechModel>> {
        self.slot
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .as_ref()
            .filter(|loaded| loaded.spec == spec)
            .map(|loaded| Arc::clone(&loaded.model))
    }

    /// Returns a handle to the model for `spec`, loading it first if needed.
    ///
    /// The fast path is a read lock and an `Arc` clone. The slow path takes
    /// the load lock, re-checks the slot (a load that finished while we
    /// waited may already be the right one), verifies the backend is usable
    /// before evicting anything, then drops the old model and loads the new
    /// one on the blocking pool. On failure the slot stays empty so the next
    /// request retries from scratch.
    pub async fn acquire(&self, spec: ModelSpec) -> Result<Arc<dyn SpeechModel>, EngineError> {
        if let Some(model) = self.cached(spec) {
            return Ok(model);
        }

        let _guard = self.load_lock.lock().await;
        if let Some(model) = self.cached(spec) {
            return Ok(model);
        }

        let backend = Arc::clone(&self.backend);
        let slot = Arc::clone(&self.slot);
        let progress = Arc::clone(&self.progress);
        let result = tokio::task::spawn_blocking(move || {
            backend.availability()?;

            // Only one model fits in device memory; release the old one
            // before the new download starts.
            if let Some(previous) = slot.write().unwrap_or_else(|e| e.into_inner()).take() {
                tracing::info!(model = %previous.spec.repo_id(), "releasing resident model");
                let device = previous.device;
                drop(previous);
                backend.clear_device_cache(device);
            }

            let (device, precision) = select_device(&backend.probe_devices());
            tracing::info!(model = %spec.repo_id(), %device, %precision, "loading model");
            progress.send_replace(ProgressState::downloading(format!(
                "Preparing {}",
                spec.repo_id()
            )));

            let on_progress = |state: ProgressState| {
                progress.send_replace(state);
            };
            let model = backend.load(spec, device, precision, &on_progress)?;
            let model: Arc<dyn SpeechModel> = Arc::from(model);

            *slot.write().unwrap_or_else(|e| e.into_inner()) = Some(LoadedModel {
                spec,
                model: Arc::clone(&model),
                device,
            });
            Ok(model)
        })
        .await;

        let result = match result {
            Ok(result) => result,
            Err(e) => Err(EngineError::Load(format!("load task join error: {}", e))),
        };

        match result {
            Ok(model) => {
                self.progress
                    .send_replace(ProgressState::ready("Model loaded successfully."));
                Ok(model)
            }
            Err(e) => {
                let stalled_at = self.progress.borrow().progress;
                self.progress
                    .send_replace(ProgressState::error(stalled_at, e.to_string()));
                Err(e)
            }
        }
    }

    /// Drops the resident model and clears its device cache. Called on
    /// graceful shutdown.
    pub fn release(&self) {
        if let Some(previous) = self
            .slot
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .take()
        {
            tracing::info!(model = %previous.spec.repo_id(), "releasing resident model");
            let device = previous.device;
            drop(previous);
            self.backend.clear_device_cache(device);
        }
    }
}
