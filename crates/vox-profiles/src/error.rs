use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProfileError {
    /// The built-in profile is fixed and cannot be deleted.
    #[error("cannot delete the built-in voice profile")]
    Builtin,

    #[error("profile not found: {0}")]
    NotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The profiles file does not parse as a profile array.
    #[error("profile store is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}
