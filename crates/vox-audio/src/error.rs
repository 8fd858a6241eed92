use thiserror::Error;

#[derive(Error, Debug)]
pub enum AudioError {
    /// WAV parse or encode failure.
    #[error("wav: {0}")]
    Wav(#[from] hound::Error),

    /// Sample-rate conversion failure.
    #[error("resample: {0}")]
    Resample(String),

    /// ffmpeg could not be run or reported a failure.
    #[error("filter: {0}")]
    Filter(String),

    /// Input the pipeline cannot work with (no clips, empty audio).
    #[error("{0}")]
    BadInput(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
