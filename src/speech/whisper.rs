//! Speech recognition with whisper.cpp

use std::path::{Path, PathBuf};

use async_trait::async_trait;
#[cfg(feature = "whisper-runtime")]
use whisper_rs::{FullParams, SamplingStrategy, WhisperContext, WhisperContextParameters};

use crate::audio::{AudioConverter, WavAudio};
use crate::error::{DubbingError, Result};
use crate::speech::Language;

#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Recognized text with surrounding whitespace trimmed. May be empty.
    async fn transcribe(&self, audio: &Path, language: Language) -> Result<String>;
}

#[derive(Debug, Clone)]
pub struct WhisperTranscriber {
    model_path: PathBuf,
    #[cfg_attr(not(feature = "whisper-runtime"), allow(dead_code))]
    threads: usize,
}

impl WhisperTranscriber {
    pub fn new(model_path: PathBuf, threads: usize) -> Self {
        Self { model_path, threads: threads.max(1) }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    fn transcribe_blocking(&self, audio: &Path, language: Language) -> Result<String> {
        if !self.model_path.exists() {
            log::warn!("Recognition model missing: {}", self.model_path.display());
            return Err(DubbingError::transcription(format!(
                "model file not found ({})", crate::config::WHISPER_MODEL_FILE
            )));
        }

        let clip = WavAudio::from_file(audio)
            .map_err(|e| DubbingError::transcription(format!("unsupported audio: {}", e)))?;
        let samples = AudioConverter::prepare_for_recognition(&clip)
            .map_err(|e| DubbingError::transcription(format!("unsupported audio: {}", e)))?;

        log::debug!("Running recognition on {:.2}s of audio, language={}",
                    clip.duration(), language.code());

        self.infer(&samples, language)
    }

    #[cfg(feature = "whisper-runtime")]
    fn infer(&self, samples: &[f32], language: Language) -> Result<String> {
        let model_path = self.model_path.to_str()
            .ok_or_else(|| DubbingError::transcription("model path is not valid UTF-8"))?;

        let context = WhisperContext::new_with_params(model_path, WhisperContextParameters::default())
            .map_err(|err| DubbingError::transcription(format!("failed to load model: {err}")))?;
        let mut state = context
            .create_state()
            .map_err(|err| DubbingError::transcription(format!("failed to create state: {err}")))?;

        let mut params = FullParams::new(SamplingStrategy::Greedy { best_of: 1 });
        params.set_n_threads(self.threads as i32);
        params.set_language(Some(language.code()));
        params.set_translate(false);
        params.set_print_realtime(false);
        params.set_print_progress(false);
        params.set_print_timestamps(false);
        params.set_print_special(false);

        state
            .full(params, samples)
            .map_err(|err| DubbingError::transcription(format!("full decode failed: {err}")))?;

        let mut text = String::new();
        for idx in 0..state.full_n_segments() {
            let Some(segment) = state.get_segment(idx) else {
                continue;
            };
            if let Ok(piece) = segment.to_str_lossy() {
                text.push_str(&piece);
            }
        }

        Ok(text.trim().to_string())
    }

    #[cfg(not(feature = "whisper-runtime"))]
    fn infer(&self, _samples: &[f32], _language: Language) -> Result<String> {
        Err(DubbingError::transcription(
            "speech recognition runtime not compiled in; rebuild with --features whisper-runtime",
        ))
    }
}

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(&self, audio: &Path, language: Language) -> Result<String> {
        let this = self.clone();
        let audio = audio.to_path_buf();

        tokio::task::spawn_blocking(move || this.transcribe_blocking(&audio, language))
            .await
            .map_err(|e| DubbingError::transcription(format!("recognition task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_missing_model_is_transcription_error() {
        let dir = TempDir::new().unwrap();
        let transcriber = WhisperTranscriber::new(dir.path().join("ggml-small.bin"), 2);

        let err = transcriber.transcribe(&dir.path().join("audio.wav"), Language::English).await.unwrap_err();

        assert!(matches!(err, DubbingError::Transcription { .. }));
        assert!(err.to_string().contains("model file not found"));
        assert!(!err.to_string().contains(&dir.path().display().to_string()));
    }

    #[test]
    fn test_thread_count_is_at_least_one() {
        let transcriber = WhisperTranscriber::new(PathBuf::from("models/ggml-small.bin"), 0);
        assert_eq!(transcriber.threads, 1);
        assert_eq!(transcriber.model_path(), Path::new("models/ggml-small.bin"));
    }

    #[tokio::test]
    async fn test_unreadable_audio_is_transcription_error() {
        let dir = TempDir::new().unwrap();
        let model = dir.path().join("ggml-small.bin");
        std::fs::write(&model, b"stub").unwrap();
        let audio = dir.path().join("audio.wav");
        std::fs::write(&audio, b"not a wav file").unwrap();

        let transcriber = WhisperTranscriber::new(model, 1);
        let err = transcriber.transcribe(&audio, Language::Spanish).await.unwrap_err();

        assert!(err.to_string().contains("unsupported audio"));
    }
}
