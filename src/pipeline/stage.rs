//! Stage tags and stage-scoped failures

use std::fmt;

use crate::error::DubbingError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Upload,
    Extraction,
    Transcription,
    Synthesis,
    Alignment,
    Remux,
    Delivery,
}

impl Stage {
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Upload => "upload",
            Stage::Extraction => "extraction",
            Stage::Transcription => "transcription",
            Stage::Synthesis => "synthesis",
            Stage::Alignment => "alignment",
            Stage::Remux => "remux",
            Stage::Delivery => "delivery",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A fatal pipeline failure, tagged with the stage that produced it.
#[derive(Debug, Clone, thiserror::Error)]
#[error("{stage} stage failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: DubbingError,
}

impl StageError {
    pub fn new(stage: Stage, source: DubbingError) -> Self {
        Self { stage, source }
    }

    /// Short message shown to the user, worded per stage.
    pub fn user_message(&self) -> String {
        let detail = self.source.detail();
        match (self.stage, &self.source) {
            (Stage::Upload, _) => format!("Could not accept the uploaded video: {}", detail),
            (Stage::Extraction, DubbingError::ToolMissing { .. }) => {
                "FFmpeg not found. Make sure it is installed and added to your system PATH.".to_string()
            }
            (Stage::Extraction, DubbingError::ToolFailed { stderr, .. }) => format!("FFmpeg failed: {}", stderr),
            (Stage::Extraction, _) => format!("Error extracting audio: {}", detail),
            (Stage::Transcription, DubbingError::EmptyTranscript) => {
                "Transcription failed: no speech was recognized in the video.".to_string()
            }
            (Stage::Transcription, _) => format!("Transcription failed: {}", detail),
            (Stage::Synthesis, _) => format!("Error generating AI voice: {}", detail),
            (Stage::Alignment, _) => format!("Error adjusting audio: {}", detail),
            (Stage::Remux, _) => format!("Error replacing audio: {}", detail),
            (Stage::Delivery, _) => format!("Could not store the processed video: {}", detail),
        }
    }

    pub fn is_client_error(&self) -> bool {
        self.source.is_client_error()
    }
}

/// Tags a stage result's error with its stage.
pub trait StageResultExt<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError>;
}

impl<T> StageResultExt<T> for crate::error::Result<T> {
    fn stage(self, stage: Stage) -> Result<T, StageError> {
        self.map_err(|source| StageError::new(stage, source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_are_distinct_per_stage() {
        let cause = || DubbingError::io("disk full");
        let stages = [
            Stage::Upload, Stage::Extraction, Stage::Transcription, Stage::Synthesis,
            Stage::Alignment, Stage::Remux, Stage::Delivery,
        ];

        let messages: Vec<String> = stages.iter()
            .map(|&stage| StageError::new(stage, cause()).user_message())
            .collect();

        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a.split(':').next(), b.split(':').next());
            }
        }
    }

    #[test]
    fn test_extraction_messages() {
        let missing = StageError::new(Stage::Extraction, DubbingError::tool_missing("ffmpeg"));
        assert!(missing.user_message().starts_with("FFmpeg not found"));

        let failed = StageError::new(Stage::Extraction, DubbingError::tool_failed("ffmpeg", "exit status: 1", "moov atom not found"));
        assert_eq!(failed.user_message(), "FFmpeg failed: moov atom not found");
    }

    #[test]
    fn test_message_shows_cause_without_category() {
        let err = StageError::new(Stage::Alignment, DubbingError::audio("unrecognized audio format"));
        assert_eq!(err.user_message(), "Error adjusting audio: unrecognized audio format");
    }

    #[test]
    fn test_stage_ext_tags_error() {
        let result: crate::error::Result<()> = Err(DubbingError::synthesis("503"));
        let err = result.stage(Stage::Synthesis).unwrap_err();
        assert_eq!(err.stage, Stage::Synthesis);
        assert!(err.to_string().starts_with("synthesis stage failed"));
    }
}
