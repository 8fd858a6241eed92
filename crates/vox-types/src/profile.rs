//! Voice profile records.
//!
//! A profile is a named reference voice: an audio clip plus its transcript,
//! usable by the cloning model. Non-builtin profiles are persisted as a JSON
//! array by `vox-profiles`; the built-in profile is a compile-time constant
//! that is always prepended to listings and never written to disk.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Fixed identifier of the built-in profile. Never deletable.
pub const BUILTIN_PROFILE_ID: &str = "__builtin_default__";

const BUILTIN_NAME: &str = "Jennifer";
const BUILTIN_REF_TEXT: &str = "Settle in. Take a deep breath. Turn off notifications on \
     your phone if you can. Ask God to give you a new perspective and to help";

/// A named, persisted reference voice.
///
/// Immutable once created except via delete. The serialized field names match
/// the on-disk JSON layout consumed by the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VoiceProfile {
    /// Opaque identifier (a UUID for user profiles).
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// Transcript of the reference audio.
    pub ref_text: String,
    /// Location of the reference audio file.
    pub audio_path: PathBuf,
    /// True only for the built-in profile.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub builtin: bool,
}

impl VoiceProfile {
    /// The built-in profile, with its audio resolved under `static_dir`.
    pub fn builtin(static_dir: &Path) -> Self {
        Self {
            id: BUILTIN_PROFILE_ID.to_string(),
            name: BUILTIN_NAME.to_string(),
            ref_text: BUILTIN_REF_TEXT.to_string(),
            audio_path: static_dir.join("builtin").join("default_voice.wav"),
            builtin: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_flag_is_omitted_for_user_profiles() {
        let profile = VoiceProfile {
            id: "abc".into(),
            name: "Test".into(),
            ref_text: "hello".into(),
            audio_path: PathBuf::from("/tmp/abc.wav"),
            builtin: false,
        };
        let json = serde_json::to_string(&profile).unwrap();
        assert!(!json.contains("builtin"));

        // Records written before the flag existed deserialize as non-builtin.
        let parsed: VoiceProfile = serde_json::from_str(
            r#"{"id":"abc","name":"Test","ref_text":"hello","audio_path":"/tmp/abc.wav"}"#,
        )
        .unwrap();
        assert!(!parsed.builtin);
    }

    #[test]
    fn builtin_profile_has_fixed_identity() {
        let profile = VoiceProfile::builtin(Path::new("/srv/static"));
        assert_eq!(profile.id, BUILTIN_PROFILE_ID);
        assert!(profile.builtin);
        assert_eq!(
            profile.audio_path,
            PathBuf::from("/srv/static/builtin/default_voice.wav")
        );
    }
}
