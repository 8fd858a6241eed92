use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// The model runner is not installed or not executable. Raised before
    /// any load work begins.
    #[error("model backend unavailable: {0}")]
    Unavailable(String),

    /// Instantiating the model failed (download, device placement, runner
    /// handshake). The manager reverts to the unloaded state so the next
    /// request can retry from a clean slate.
    #[error("failed to load model: {0}")]
    Load(String),

    /// A generation call on a loaded model failed.
    #[error("generation failed: {0}")]
    Generate(String),
}
