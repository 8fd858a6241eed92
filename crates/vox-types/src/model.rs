//! Model identifier types.
//!
//! A loadable model variant is selected by a [`ModelSpec`]: the parameter
//! count paired with the generation mode family. The spec maps onto the
//! upstream repository naming scheme (`Qwen/Qwen3-TTS-12Hz-{size}-{type}`),
//! so the canonical identifier doubles as the download key.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported model parameter counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelSize {
    /// 0.6 billion parameters, faster and lower fidelity.
    #[serde(rename = "0.6B")]
    Small,
    /// 1.7 billion parameters, the default.
    #[serde(rename = "1.7B")]
    Large,
}

impl ModelSize {
    /// The label used in the upstream repository name and the HTTP form.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Small => "0.6B",
            Self::Large => "1.7B",
        }
    }
}

impl FromStr for ModelSize {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "0.6B" => Ok(Self::Small),
            "1.7B" => Ok(Self::Large),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ModelSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Supported model families, one per generation mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModelType {
    /// Voice cloning from a reference recording and transcript.
    Base,
    /// Named preset speakers.
    CustomVoice,
    /// Free-form voice description prompts.
    VoiceDesign,
}

impl ModelType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Base => "Base",
            Self::CustomVoice => "CustomVoice",
            Self::VoiceDesign => "VoiceDesign",
        }
    }
}

impl FromStr for ModelType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Base" => Ok(Self::Base),
            "CustomVoice" => Ok(Self::CustomVoice),
            "VoiceDesign" => Ok(Self::VoiceDesign),
            _ => Err(()),
        }
    }
}

impl fmt::Display for ModelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Composite key selecting which model variant to load.
///
/// At most one spec is resident in memory at a time; requesting a different
/// one evicts the current model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub size: ModelSize,
    pub model_type: ModelType,
}

impl ModelSpec {
    pub fn new(size: ModelSize, model_type: ModelType) -> Self {
        Self { size, model_type }
    }

    /// Canonical upstream repository identifier for this variant.
    pub fn repo_id(&self) -> String {
        format!("Qwen/Qwen3-TTS-12Hz-{}-{}", self.size, self.model_type)
    }
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self {
            size: ModelSize::Large,
            model_type: ModelType::CustomVoice,
        }
    }
}

impl fmt::Display for ModelSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.repo_id())
    }
}
