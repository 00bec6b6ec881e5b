//! Dubber - AI Voice-Over for Videos
//!
//! Extracts a video's speech, transcribes it, re-voices the transcript with
//! text-to-speech, fits the new voice to the original duration and swaps it
//! into the video.

pub mod audio;
pub mod config;
pub mod error;
pub mod media;
pub mod pipeline;
pub mod server;
pub mod speech;

pub use config::{Args, Command, Config};
pub use error::{DubbingError, Result};
pub use pipeline::{DubbingOutput, DubbingPipeline, SourceVideo, Stage, StageError};
pub use speech::Language;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const NAME: &str = env!("CARGO_PKG_NAME");
pub const DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

/// `RUST_LOG` wins when set; otherwise `info`, or `debug` when verbose.
pub fn init_logging(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .try_init()
        .ok();
}

pub fn get_library_info() -> LibraryInfo {
    LibraryInfo {
        name: NAME.to_string(),
        version: VERSION.to_string(),
        description: DESCRIPTION.to_string(),
        whisper_runtime: cfg!(feature = "whisper-runtime"),
    }
}

#[derive(Debug, Clone)]
pub struct LibraryInfo {
    pub name: String,
    pub version: String,
    pub description: String,
    pub whisper_runtime: bool,
}

impl std::fmt::Display for LibraryInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} v{} - {}", self.name, self.version, self.description)?;
        if !self.whisper_runtime {
            write!(f, " (speech recognition not compiled in)")?;
        }
        Ok(())
    }
}
