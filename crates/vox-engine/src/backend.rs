//! Backend traits and the generation request model.
//!
//! [`SpeechModel`] is the narrow surface of the external inference library:
//! one blocking call per generation mode, each returning a waveform plus its
//! sample rate. [`ModelBackend`] produces loaded models. Both traits are
//! object-safe; calls are blocking by contract and are always driven from a
//! `spawn_blocking` worker so the server's event loop stays responsive.

use crate::device::{Device, Precision};
use crate::error::EngineError;
use std::path::PathBuf;
use vox_types::{ModelSpec, ModelType, ProgressState, SamplingParams};

/// Mono audio produced by a model.
#[derive(Debug, Clone, PartialEq)]
pub struct Waveform {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl Waveform {
    /// Playback length in seconds.
    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / self.sample_rate as f64
    }
}

/// Reference material for voice cloning: a recording and its transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct CloneReference {
    pub audio_path: PathBuf,
    pub ref_text: String,
}

/// Fields shared by every generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub text: String,
    pub language: String,
    pub sampling: SamplingParams,
}

/// Mode-specific inputs, selected strictly by the requested model type.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationMode {
    /// Named preset speaker (CustomVoice models).
    CustomVoice { speaker: String },
    /// Free-form voice description (VoiceDesign models).
    VoiceDesign { instruction: String },
    /// Clone a reference voice (Base models).
    VoiceClone(CloneReference),
}

impl GenerationMode {
    /// The model family this mode runs on.
    pub fn model_type(&self) -> ModelType {
        match self {
            Self::CustomVoice { .. } => ModelType::CustomVoice,
            Self::VoiceDesign { .. } => ModelType::VoiceDesign,
            Self::VoiceClone(_) => ModelType::Base,
        }
    }
}

/// A loaded inference model. Calls block until synthesis completes.
///
/// Implementations must tolerate concurrent calls; the manager hands the
/// same model to any number of in-flight requests without synchronization.
pub trait SpeechModel: Send + Sync {
    /// Synthesize with a named preset speaker.
    fn custom_voice(&self, req: &GenerationRequest, speaker: &str)
        -> Result<Waveform, EngineError>;

    /// Synthesize a voice described by a free-form instruction prompt.
    fn voice_design(
        &self,
        req: &GenerationRequest,
        instruction: &str,
    ) -> Result<Waveform, EngineError>;

    /// Synthesize in a voice cloned from reference audio and transcript.
    fn voice_clone(
        &self,
        req: &GenerationRequest,
        reference: &CloneReference,
    ) -> Result<Waveform, EngineError>;
}

/// Routes a request to the model operation matching its mode.
pub fn dispatch(
    model: &dyn SpeechModel,
    req: &GenerationRequest,
    mode: &GenerationMode,
) -> Result<Waveform, EngineError> {
    match mode {
        GenerationMode::CustomVoice { speaker } => model.custom_voice(req, speaker),
        GenerationMode::VoiceDesign { instruction } => model.voice_design(req, instruction),
        GenerationMode::VoiceClone(reference) => model.voice_clone(req, reference),
    }
}

/// Progress callback threaded through a load. Receives whole snapshots so a
/// backend can report phase changes as well as percentages.
pub type ProgressFn<'a> = &'a (dyn Fn(ProgressState) + Send + Sync);

/// Produces loaded models. Implementations block; the manager drives them
/// from a background worker.
pub trait ModelBackend: Send + Sync {
    /// Fails when the backend cannot load models at all (runner missing).
    /// Checked inside the load critical section before anything is evicted.
    fn availability(&self) -> Result<(), EngineError>;

    /// Compute devices this backend can place a model on. Order is not
    /// significant; selection applies the fixed preference order.
    fn probe_devices(&self) -> Vec<Device>;

    /// Loads `spec` onto `device`, reporting progress through `on_progress`.
    fn load(
        &self,
        spec: ModelSpec,
        device: Device,
        precision: Precision,
        on_progress: ProgressFn<'_>,
    ) -> Result<Box<dyn SpeechModel>, EngineError>;

    /// Releases device-side allocator caches after a model was dropped.
    fn clear_device_cache(&self, _device: Device) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_maps_to_model_type() {
        let clone = GenerationMode::VoiceClone(CloneReference {
            audio_path: PathBuf::from("ref.wav"),
            ref_text: "hi".into(),
        });
        assert_eq!(clone.model_type(), ModelType::Base);
        assert_eq!(
            GenerationMode::CustomVoice {
                speaker: "Vivian".into()
            }
            .model_type(),
            ModelType::CustomVoice
        );
        assert_eq!(
            GenerationMode::VoiceDesign {
                instruction: "an old pirate".into()
            }
            .model_type(),
            ModelType::VoiceDesign
        );
    }

    #[test]
    fn waveform_duration() {
        let wave = Waveform {
            samples: vec![0.0; 24_000],
            sample_rate: 24_000,
        };
        assert!((wave.duration_secs() - 1.0).abs() < 1e-9);
        let empty = Waveform {
            samples: vec![],
            sample_rate: 0,
        };
        assert_eq!(empty.duration_secs(), 0.0);
    }
}
