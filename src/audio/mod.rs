//! Audio Processing Module
//!
//! PCM clip handling for the pipeline: WAV I/O, decoding of synthesized
//! speech, format conversion for recognition, and duration alignment.

pub mod wav;
pub mod converter;
pub mod decoder;
pub mod align;

pub use wav::{WavAudio, AudioFormat, AudioHeader, AudioData};
pub use converter::AudioConverter;
pub use align::{align_to_reference, adjust_audio_length, Adjustment};
