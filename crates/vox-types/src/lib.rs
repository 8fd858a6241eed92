//! Shared types for the Vox Studio workspace.
//!
//! This crate provides the plain data types used across all Vox crates:
//! model identifiers, voice profiles, progress snapshots, and sampling
//! parameters. No crate in the workspace depends on anything *except*
//! `vox-types` for cross-cutting type definitions, which keeps the
//! dependency graph clean and prevents circular dependencies.

pub mod model;
pub mod profile;
pub mod progress;

pub use model::{ModelSize, ModelSpec, ModelType};
pub use profile::{VoiceProfile, BUILTIN_PROFILE_ID};
pub use progress::{ProgressPhase, ProgressState};

use serde::{Deserialize, Serialize};

/// Sampling parameters forwarded to the model on every generation call.
///
/// The defaults reproduce the settings the studio UI always sends; they are
/// not currently exposed through the HTTP form.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Softmax temperature for the main talker.
    pub temperature: f64,
    /// Repetition penalty applied during decoding.
    pub repetition_penalty: f64,
    /// Nucleus sampling threshold.
    pub top_p: f64,
    /// Temperature for the sub-talker codec head.
    pub subtalker_temperature: f64,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.3,
            repetition_penalty: 1.1,
            top_p: 0.8,
            subtalker_temperature: 0.3,
        }
    }
}
