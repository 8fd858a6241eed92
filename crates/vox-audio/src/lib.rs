//! Audio post-processing for Vox Studio.
//!
//! Three concerns live here: WAV encode/decode for everything the HTTP
//! layer ships ([`wav`]), order-preserving clip concatenation with silence
//! gaps ([`merge`]), and the ffmpeg treatment presets ([`treat`]). WAV work
//! and merging are pure in-memory transforms; treatments shell out to
//! ffmpeg with scratch files that never outlive the call.

pub mod error;
pub mod merge;
pub mod treat;
pub mod wav;

pub use error::AudioError;
pub use merge::{merge_clips, resample};
pub use treat::{treat, Treatment};
pub use wav::{read_wav, write_wav_i16, Clip};
