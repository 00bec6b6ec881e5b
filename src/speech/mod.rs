//! Speech collaborators: recognition of the original track and synthesis of
//! the replacement voice.

pub mod language;
pub mod whisper;
pub mod tts;

pub use language::Language;
pub use whisper::{Transcriber, WhisperTranscriber};
pub use tts::{GoogleTts, Synthesizer};
