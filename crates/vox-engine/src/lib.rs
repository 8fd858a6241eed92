//! Model lifecycle and generation dispatch for Vox Studio.
//!
//! The studio keeps at most one speech model resident in process memory,
//! keyed by a [`ModelSpec`] (size × type). [`ModelManager`] owns that slot:
//! it loads models on demand through a [`ModelBackend`], swaps them when a
//! request names a different spec, and publishes load progress through a
//! watch channel that the server's SSE endpoint reads.
//!
//! The actual synthesis is delegated to an external model runner consumed
//! through the narrow [`SpeechModel`] trait; [`RunnerBackend`] is the
//! production implementation, holding the runner executable as a hot child
//! process for as long as the model stays resident.

pub mod backend;
pub mod device;
pub mod error;
pub mod manager;
pub mod worker;

pub use backend::{
    dispatch, CloneReference, GenerationMode, GenerationRequest, ModelBackend, ProgressFn,
    SpeechModel, Waveform,
};
pub use device::{select_device, Device, Precision};
pub use error::EngineError;
pub use manager::ModelManager;
pub use worker::RunnerBackend;
