//! Model load progress snapshots.
//!
//! One process-wide [`ProgressState`] value exists, owned by the model
//! lifecycle manager and overwritten in place as a load advances. No history
//! is kept (last write wins) and the progress SSE endpoint simply serializes
//! the current snapshot on a fixed cadence.

use serde::{Deserialize, Serialize};

/// Lifecycle phase of the most recent model load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressPhase {
    /// No load has started yet.
    #[default]
    Idle,
    /// Fetching model weights.
    Downloading,
    /// Unpacking / materializing weights on the target device.
    Extracting,
    /// A model is resident and serving.
    Ready,
    /// The last load failed.
    Error,
}

impl ProgressPhase {
    /// Terminal phases end the progress stream.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Ready | Self::Error)
    }
}

/// Point-in-time view of the loader.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ProgressState {
    /// Current phase.
    pub status: ProgressPhase,
    /// Completion percentage in `0.0..=100.0`.
    pub progress: f64,
    /// Human-readable description of the current step.
    pub description: String,
}

impl ProgressState {
    pub fn new(status: ProgressPhase, progress: f64, description: impl Into<String>) -> Self {
        Self {
            status,
            progress,
            description: description.into(),
        }
    }

    /// Snapshot for a load that just started.
    pub fn downloading(description: impl Into<String>) -> Self {
        Self::new(ProgressPhase::Downloading, 0.0, description)
    }

    /// Snapshot for a completed load.
    pub fn ready(description: impl Into<String>) -> Self {
        Self::new(ProgressPhase::Ready, 100.0, description)
    }

    /// Snapshot for a failed load; `progress` is left wherever it was.
    pub fn error(progress: f64, description: impl Into<String>) -> Self {
        Self::new(ProgressPhase::Error, progress, description)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_phases() {
        assert!(ProgressPhase::Ready.is_terminal());
        assert!(ProgressPhase::Error.is_terminal());
        assert!(!ProgressPhase::Idle.is_terminal());
        assert!(!ProgressPhase::Downloading.is_terminal());
        assert!(!ProgressPhase::Extracting.is_terminal());
    }

    #[test]
    fn phases_serialize_lowercase() {
        let state = ProgressState::ready("Model loaded successfully.");
        let json = serde_json::to_string(&state).unwrap();
        assert!(json.contains("\"status\":\"ready\""));
        assert!(json.contains("\"progress\":100.0"));
    }
}
