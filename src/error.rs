//! Error Types

use thiserror::Error;

/// Main error type
#[derive(Debug, Clone, Error)]
pub enum DubbingError {
    #[error("{tool} not found. Make sure it is installed and added to your system PATH.")]
    ToolMissing { tool: String },

    #[error("{tool} exited with {status}{}", stderr_suffix(.stderr))]
    ToolFailed { tool: String, status: String, stderr: String },

    #[error("Transcription error: {message}")]
    Transcription { message: String },

    #[error("Transcription produced no text")]
    EmptyTranscript,

    #[error("Synthesis error: {message}")]
    Synthesis { message: String },

    #[error("Audio error: {message}")]
    Audio { message: String },

    #[error("Config error: {message}")]
    Config { message: String },

    #[error("Input error: {message}")]
    Input { message: String },

    #[error("IO error: {message}")]
    Io { message: String },
}

impl DubbingError {
    pub fn tool_missing<S: Into<String>>(tool: S) -> Self { Self::ToolMissing { tool: tool.into() } }
    pub fn transcription<S: Into<String>>(msg: S) -> Self { Self::Transcription { message: msg.into() } }
    pub fn synthesis<S: Into<String>>(msg: S) -> Self { Self::Synthesis { message: msg.into() } }
    pub fn audio<S: Into<String>>(msg: S) -> Self { Self::Audio { message: msg.into() } }
    pub fn config<S: Into<String>>(msg: S) -> Self { Self::Config { message: msg.into() } }
    pub fn input<S: Into<String>>(msg: S) -> Self { Self::Input { message: msg.into() } }
    pub fn io<S: Into<String>>(msg: S) -> Self { Self::Io { message: msg.into() } }

    pub fn tool_failed(tool: impl Into<String>, status: impl std::fmt::Display, stderr: impl Into<String>) -> Self {
        Self::ToolFailed {
            tool: tool.into(),
            status: status.to_string(),
            stderr: stderr.into(),
        }
    }

    /// The cause without its category prefix, for messages shown to users.
    pub fn detail(&self) -> String {
        match self {
            Self::Transcription { message }
            | Self::Synthesis { message }
            | Self::Audio { message }
            | Self::Config { message }
            | Self::Input { message }
            | Self::Io { message } => message.clone(),
            Self::ToolMissing { .. } | Self::ToolFailed { .. } | Self::EmptyTranscript => self.to_string(),
        }
    }

    /// True for failures caused by the caller's input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Input { .. } | Self::EmptyTranscript)
    }
}

pub type Result<T> = std::result::Result<T, DubbingError>;

fn stderr_suffix(stderr: &str) -> String {
    if stderr.is_empty() { String::new() } else { format!(": {}", stderr) }
}

impl From<std::io::Error> for DubbingError {
    fn from(err: std::io::Error) -> Self { Self::io(err.to_string()) }
}

impl From<hound::Error> for DubbingError {
    fn from(err: hound::Error) -> Self { Self::audio(format!("WAV: {}", err)) }
}

impl From<symphonia::core::errors::Error> for DubbingError {
    fn from(err: symphonia::core::errors::Error) -> Self { Self::audio(format!("decode: {}", err)) }
}

impl From<reqwest::Error> for DubbingError {
    fn from(err: reqwest::Error) -> Self { Self::synthesis(format!("request: {}", err)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let e = DubbingError::audio("test");
        assert!(e.to_string().contains("Audio"));
    }

    #[test]
    fn test_tool_errors() {
        let missing = DubbingError::tool_missing("ffmpeg");
        assert!(missing.to_string().starts_with("ffmpeg not found"));

        let failed = DubbingError::tool_failed("ffmpeg", "exit status: 1", "no such file");
        assert!(failed.to_string().contains("no such file"));
        assert!(!failed.is_client_error());

        let silent = DubbingError::tool_failed("ffmpeg", "exit status: 1", "");
        assert_eq!(silent.to_string(), "ffmpeg exited with exit status: 1");
    }

    #[test]
    fn test_detail_drops_category_prefix() {
        assert_eq!(DubbingError::audio("no audio track found").detail(), "no audio track found");
        assert_eq!(DubbingError::synthesis("provider returned 503").detail(), "provider returned 503");
        assert_eq!(DubbingError::EmptyTranscript.detail(), "Transcription produced no text");
    }

    #[test]
    fn test_client_errors() {
        assert!(DubbingError::EmptyTranscript.is_client_error());
        assert!(DubbingError::input("bad extension").is_client_error());
        assert!(!DubbingError::synthesis("timeout").is_client_error());
    }
}
