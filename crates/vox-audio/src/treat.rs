//! ffmpeg treatment presets.

use crate::error::AudioError;
use std::fmt;
use std::path::Path;
use std::process::Stdio;
use std::str::FromStr;
use std::time::Duration;
use tokio::process::Command;

/// Timeout for one ffmpeg pass over a clip.
const FFMPEG_TIMEOUT: Duration = Duration::from_secs(60);

/// Post-processing presets, each a fixed ffmpeg filter graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Treatment {
    /// Loudness normalization only, standardized level with no coloration.
    Podcast,
    /// Low shelf (+6dB at 200Hz) plus loudness normalization.
    Warmth,
    /// High shelf (+7dB at 2kHz) plus loudness normalization.
    Clear,
}

impl Treatment {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Podcast => "podcast",
            Self::Warmth => "warmth",
            Self::Clear => "clear",
        }
    }

    /// The `-af` filter graph handed to ffmpeg.
    pub fn filter_chain(self) -> &'static str {
        match self {
            Self::Podcast => "loudnorm=I=-16:TP=-1.5:LRA=11",
            Self::Warmth => "bass=g=6:f=200,loudnorm=I=-16:TP=-1.5:LRA=11",
            Self::Clear => "treble=g=7:f=2000,loudnorm=I=-16:TP=-1.5:LRA=11",
        }
    }
}

impl FromStr for Treatment {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "podcast" => Ok(Self::Podcast),
            "warmth" => Ok(Self::Warmth),
            "clear" => Ok(Self::Clear),
            _ => Err(()),
        }
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Runs `audio` through the preset's filter chain and returns the processed
/// WAV bytes.
///
/// The input is staged in a temp directory, ffmpeg writes a sibling output
/// file, and the whole directory is removed when this returns, on the error
/// paths too.
pub async fn treat(
    audio: &[u8],
    treatment: Treatment,
    ffmpeg: impl AsRef<Path>,
) -> Result<Vec<u8>, AudioError> {
    let dir = tempfile::tempdir()?;
    let input_path = dir.path().join("input.wav");
    let output_path = dir.path().join("treated.wav");
    tokio::fs::write(&input_path, audio).await?;

    let child = Command::new(ffmpeg.as_ref())
        .arg("-nostdin")
        .arg("-y")
        .arg("-i")
        .arg(&input_path)
        .arg("-af")
        .arg(treatment.filter_chain())
        .arg(&output_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|e| AudioError::Filter(format!("failed to spawn ffmpeg: {}", e)))?;

    let output = tokio::time::timeout(FFMPEG_TIMEOUT, child.wait_with_output())
        .await
        .map_err(|_| {
            AudioError::Filter(format!(
                "ffmpeg timed out after {} seconds",
                FFMPEG_TIMEOUT.as_secs()
            ))
        })?
        .map_err(|e| AudioError::Filter(format!("failed to wait for ffmpeg: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(%treatment, "ffmpeg failed: {}", stderr.trim());
        return Err(AudioError::Filter(format!(
            "ffmpeg failed: {}",
            stderr.trim()
        )));
    }

    let treated = tokio::fs::read(&output_path).await?;
    Ok(treated)
}
