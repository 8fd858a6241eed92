//! JSON-file-backed profile store.

use crate::error::ProfileError;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use vox_types::{VoiceProfile, BUILTIN_PROFILE_ID};

/// Store rooted at `<data_dir>/profiles/`: one `profiles.json` array plus
/// the uploaded reference recordings beside it.
///
/// Every method does blocking file I/O; handlers drive them from
/// `spawn_blocking`. The JSON file is re-read per call rather than cached.
#[derive(Debug, Clone)]
pub struct ProfileStore {
    profiles_dir: PathBuf,
    profiles_file: PathBuf,
    builtin: VoiceProfile,
}

impl ProfileStore {
    /// Opens the store under `data_dir`, creating the directory and an
    /// empty `profiles.json` on first run. The built-in profile's audio is
    /// resolved against `static_dir`.
    pub fn open(data_dir: &Path, static_dir: &Path) -> Result<Self, ProfileError> {
        let profiles_dir = data_dir.join("profiles");
        fs::create_dir_all(&profiles_dir)?;
        let profiles_file = profiles_dir.join("profiles.json");
        if !profiles_file.exists() {
            fs::write(&profiles_file, "[]")?;
        }
        Ok(Self {
            profiles_dir,
            profiles_file,
            builtin: VoiceProfile::builtin(static_dir),
        })
    }

    /// Directory holding the JSON file and the recordings.
    pub fn dir(&self) -> &Path {
        &self.profiles_dir
    }

    /// All profiles, built-in first.
    pub fn list(&self) -> Result<Vec<VoiceProfile>, ProfileError> {
        let mut profiles = vec![self.builtin.clone()];
        profiles.extend(self.read_user_profiles()?);
        Ok(profiles)
    }

    /// Looks up one profile by id, the built-in included.
    pub fn resolve(&self, id: &str) -> Result<VoiceProfile, ProfileError> {
        if id == BUILTIN_PROFILE_ID {
            return Ok(self.builtin.clone());
        }
        self.read_user_profiles()?
            .into_iter()
            .find(|profile| profile.id == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))
    }

    /// Persists a new profile. The recording lands beside the JSON file as
    /// `<id>_<basename>`, so client-supplied path components cannot steer
    /// the write anywhere else.
    pub fn create(
        &self,
        name: &str,
        ref_text: &str,
        filename: &str,
        audio: &[u8],
    ) -> Result<VoiceProfile, ProfileError> {
        let id = Uuid::new_v4().to_string();
        let safe_filename = Path::new(filename)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "audio.wav".to_string());
        let audio_path = self.profiles_dir.join(format!("{}_{}", id, safe_filename));
        fs::write(&audio_path, audio)?;

        let profile = VoiceProfile {
            id,
            name: name.to_string(),
            ref_text: ref_text.to_string(),
            audio_path,
            builtin: false,
        };
        let mut profiles = self.read_user_profiles()?;
        profiles.push(profile.clone());
        self.write_user_profiles(&profiles)?;

        tracing::info!(id = %profile.id, name = %profile.name, "profile created");
        Ok(profile)
    }

    /// Deletes a profile and its recording.
    ///
    /// The recording is only removed when its canonical path resolves inside
    /// the store directory; a record pointing anywhere else loses the record
    /// but keeps the file.
    pub fn delete(&self, id: &str) -> Result<(), ProfileError> {
        if id == BUILTIN_PROFILE_ID {
            return Err(ProfileError::Builtin);
        }
        let profiles = self.read_user_profiles()?;
        let profile = profiles
            .iter()
            .find(|profile| profile.id == id)
            .ok_or_else(|| ProfileError::NotFound(id.to_string()))?;

        match (
            profile.audio_path.canonicalize(),
            self.profiles_dir.canonicalize(),
        ) {
            (Ok(audio), Ok(dir)) if audio.starts_with(&dir) => {
                fs::remove_file(&audio)?;
            }
            _ => {
                tracing::warn!(
                    id,
                    path = %profile.audio_path.display(),
                    "not removing a recording outside the store"
                );
            }
        }

        let remaining: Vec<VoiceProfile> =
            profiles.into_iter().filter(|profile| profile.id != id).collect();
        self.write_user_profiles(&remaining)?;

        tracing::info!(id, "profile deleted");
        Ok(())
    }

    fn read_user_profiles(&self) -> Result<Vec<VoiceProfile>, ProfileError> {
        let raw = fs::read_to_string(&self.profiles_file)?;
        Ok(serde_json::from_str(&raw)?)
    }

    fn write_user_profiles(&self, profiles: &[VoiceProfile]) -> Result<(), ProfileError> {
        // The built-in profile is synthesized on read and never written.
        let keep: Vec<&VoiceProfile> = profiles
            .iter()
            .filter(|profile| profile.id != BUILTIN_PROFILE_ID)
            .collect();
        fs::write(&self.profiles_file, serde_json::to_string_pretty(&keep)?)?;
        Ok(())
    }
}
