//! Dubbing pipeline
//!
//! Five stages run strictly in order for each request: audio extraction,
//! transcription, voice synthesis, duration alignment and audio replacement.
//! The first failure aborts the run. The run workspace is removed on every
//! exit path; only a delivered output video outlives the run.

pub mod context;
pub mod stage;
pub mod store;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use tempfile::TempPath;

use crate::audio::align;
use crate::config::Config;
use crate::error::{DubbingError, Result};
use crate::media::{Ffmpeg, Transcoder};
use crate::speech::{GoogleTts, Language, Synthesizer, Transcriber, WhisperTranscriber};

pub use context::RunContext;
pub use stage::{Stage, StageError, StageResultExt};
pub use store::{OutputStore, DOWNLOAD_FILE_NAME};

/// Accepted upload containers.
pub const VIDEO_EXTENSIONS: [&str; 3] = ["mp4", "avi", "mov"];

/// Lower-cased extension of an accepted video file name.
pub fn video_extension(file_name: &str) -> Result<String> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(DubbingError::input(format!(
            "Unsupported video type '{}'. Upload an mp4, avi or mov file.", file_name
        )))
    }
}

/// The video a run starts from.
#[derive(Debug)]
pub enum SourceVideo {
    /// Uploaded bytes with the client's file name.
    Upload { file_name: String, data: Vec<u8> },
    /// An upload already streamed to disk by `DubbingPipeline::staging_file`.
    /// The run moves it into its workspace; otherwise it is deleted on drop.
    Staged { file_name: String, file: TempPath },
    /// A file on local disk; copied into the workspace, never modified.
    File(PathBuf),
}

impl SourceVideo {
    fn file_name(&self) -> String {
        match self {
            SourceVideo::Upload { file_name, .. } | SourceVideo::Staged { file_name, .. } => file_name.clone(),
            SourceVideo::File(path) => path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DubbingOutput {
    pub run_id: String,
    pub language: Language,
    pub transcript: String,
    pub video: PathBuf,
}

#[derive(Clone)]
pub struct DubbingPipeline {
    transcoder: Arc<dyn Transcoder>,
    transcriber: Arc<dyn Transcriber>,
    synthesizer: Arc<dyn Synthesizer>,
    work_root: PathBuf,
    outputs: OutputStore,
}

impl DubbingPipeline {
    pub fn new(
        transcoder: Arc<dyn Transcoder>,
        transcriber: Arc<dyn Transcriber>,
        synthesizer: Arc<dyn Synthesizer>,
        work_root: PathBuf,
        outputs: OutputStore,
    ) -> Self {
        Self { transcoder, transcriber, synthesizer, work_root, outputs }
    }

    /// Pipeline wired to ffmpeg, whisper.cpp and Google TTS.
    pub fn from_config(config: &Config) -> Result<Self> {
        Ok(Self::new(
            Arc::new(Ffmpeg::new(config.ffmpeg.binary.clone())),
            Arc::new(WhisperTranscriber::new(config.model_path(), config.whisper.threads)),
            Arc::new(GoogleTts::new(&config.tts)?),
            config.paths.work_dir.clone(),
            OutputStore::new(config.paths.output_dir.clone()),
        ))
    }

    pub fn outputs(&self) -> &OutputStore {
        &self.outputs
    }

    pub fn work_root(&self) -> &Path {
        &self.work_root
    }

    /// Empty file under the work root for an upload to be streamed into.
    pub async fn staging_file(&self) -> Result<TempPath> {
        let work_root = self.work_root.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::create_dir_all(&work_root)
                .and_then(|_| tempfile::Builder::new().prefix("upload-").tempfile_in(&work_root))
                .map(|file| file.into_temp_path())
                .map_err(|e| {
                    log::warn!("Cannot stage upload under {}: {}", work_root.display(), e);
                    DubbingError::io(format!("cannot stage the upload: {}", e.kind()))
                })
        })
        .await
        .map_err(|e| DubbingError::io(format!("staging task failed: {}", e)))?
    }

    pub async fn run(&self, source: SourceVideo, language: Language) -> std::result::Result<DubbingOutput, StageError> {
        let start = Instant::now();
        let context = RunContext::acquire(&self.work_root, language).await.stage(Stage::Upload)?;
        log::info!("Run {} started: {} -> {}", context.run_id(), source.file_name(), language);

        let result = self.run_stages(&context, source).await;
        match &result {
            Ok(output) => log::info!("Run {} complete in {:.1}s: {}",
                                     context.run_id(), start.elapsed().as_secs_f64(), output.video.display()),
            Err(e) => log::warn!("Run {} aborted: {}", context.run_id(), e),
        }

        context.close();
        result
    }

    async fn run_stages(&self, context: &RunContext, source: SourceVideo) -> std::result::Result<DubbingOutput, StageError> {
        let language = context.language();

        let video = save_source(context, source).await.stage(Stage::Upload)?;

        log::info!("Run {}: extracting audio", context.run_id());
        let audio = self.transcoder
            .extract_audio(&video, &context.artifact("audio.wav"))
            .await
            .stage(Stage::Extraction)?;

        log::info!("Run {}: transcribing ({})", context.run_id(), language.code());
        let transcript = self.transcriber
            .transcribe(&audio, language)
            .await
            .stage(Stage::Transcription)?;
        if transcript.trim().is_empty() {
            return Err(StageError::new(Stage::Transcription, DubbingError::EmptyTranscript));
        }
        log::debug!("Run {} transcript: {}", context.run_id(), transcript);

        log::info!("Run {}: synthesizing voice", context.run_id());
        let voice = self.synthesizer
            .synthesize(&transcript, language, &context.artifact("ai_voice.mp3"))
            .await
            .stage(Stage::Synthesis)?;

        log::info!("Run {}: aligning voice to original duration", context.run_id());
        let adjusted = {
            let (audio, voice, target) = (audio.clone(), voice.clone(), context.artifact("adjusted.wav"));
            tokio::task::spawn_blocking(move || align::adjust_audio_length(&audio, &voice, &target))
                .await
                .map_err(|e| DubbingError::audio(format!("alignment task failed: {}", e)))
                .and_then(|result| result)
                .stage(Stage::Alignment)?
        };

        log::info!("Run {}: replacing audio track", context.run_id());
        let remuxed = self.transcoder
            .replace_audio(&video, &adjusted, &context.artifact("output.mp4"))
            .await
            .stage(Stage::Remux)?;

        let delivered = self.outputs
            .deliver(context.run_id(), &remuxed)
            .await
            .stage(Stage::Delivery)?;

        Ok(DubbingOutput {
            run_id: context.run_id().to_string(),
            language,
            transcript: transcript.trim().to_string(),
            video: delivered,
        })
    }
}

async fn save_source(context: &RunContext, source: SourceVideo) -> Result<PathBuf> {
    let extension = video_extension(&source.file_name())?;
    let target = context.artifact(&format!("video.{}", extension));

    match source {
        SourceVideo::Upload { data, .. } => {
            if data.is_empty() {
                return Err(DubbingError::input("The uploaded video is empty"));
            }
            tokio::fs::write(&target, &data).await?;
        }
        SourceVideo::Staged { file, .. } => {
            let size = tokio::fs::metadata(&file).await?.len();
            if size == 0 {
                return Err(DubbingError::input("The uploaded video is empty"));
            }
            // Staging files live under the work root, so this stays on one filesystem.
            tokio::fs::rename(&file, &target).await?;
        }
        SourceVideo::File(path) => {
            tokio::fs::copy(&path, &target).await
                .map_err(|e| DubbingError::input(format!("Cannot read {}: {}", path.display(), e)))?;
        }
    }

    Ok(target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_video_extension() {
        assert_eq!(video_extension("clip.MP4").unwrap(), "mp4");
        assert_eq!(video_extension("holiday.final.mov").unwrap(), "mov");
        assert_eq!(video_extension("a.avi").unwrap(), "avi");
        assert!(video_extension("song.mp3").is_err());
        assert!(video_extension("noextension").is_err());
    }
}
