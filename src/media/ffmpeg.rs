//! ffmpeg invocations: audio extraction and audio replacement.

use std::ffi::OsString;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;

use crate::error::{DubbingError, Result};

/// External transcoder used at both ends of the pipeline.
#[async_trait]
pub trait Transcoder: Send + Sync {
    /// Writes the video's audio track as 44.1 kHz stereo 16-bit PCM WAV.
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<PathBuf>;

    /// Writes `video` with its audio replaced by `audio`, clipped to the shorter stream.
    async fn replace_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<PathBuf>;
}

/// `<tool> -i <input> -vn -acodec pcm_s16le -ar 44100 -ac 2 <output>`
pub fn extract_audio_args(input: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), input.into(), "-vn".into()];
    args.extend(["-acodec", "pcm_s16le", "-ar", "44100", "-ac", "2"].map(OsString::from));
    args.push(output.into());
    args
}

/// `<tool> -i <video> -i <audio> -c:v copy -map 0:v:0 -map 1:a:0 -shortest -y <output>`
pub fn replace_audio_args(video: &Path, audio: &Path, output: &Path) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec!["-i".into(), video.into(), "-i".into(), audio.into()];
    args.extend(["-c:v", "copy", "-map", "0:v:0", "-map", "1:a:0", "-shortest", "-y"].map(OsString::from));
    args.push(output.into());
    args
}

#[derive(Debug, Clone)]
pub struct Ffmpeg {
    binary: PathBuf,
}

impl Ffmpeg {
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    fn tool_name(&self) -> String {
        self.binary.display().to_string()
    }

    fn command(&self, args: &[OsString]) -> Command {
        log::debug!("Running {} {}", self.tool_name(),
                    args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" "));
        let mut command = Command::new(&self.binary);
        command.args(args).stdin(Stdio::null()).kill_on_drop(true);
        command
    }

    fn launch_error(&self, err: std::io::Error) -> DubbingError {
        if err.kind() == ErrorKind::NotFound {
            DubbingError::tool_missing(self.tool_name())
        } else {
            DubbingError::io(format!("cannot run {}: {}", self.tool_name(), err))
        }
    }

    /// True when `<tool> -version` runs and exits successfully.
    pub async fn is_available(&self) -> bool {
        self.command(&[OsString::from("-version")])
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }
}

#[async_trait]
impl Transcoder for Ffmpeg {
    async fn extract_audio(&self, video: &Path, output: &Path) -> Result<PathBuf> {
        let result = self.command(&extract_audio_args(video, output))
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| self.launch_error(e))?;

        if !result.status.success() {
            let stderr = String::from_utf8_lossy(&result.stderr).trim().to_string();
            return Err(DubbingError::tool_failed(self.tool_name(), result.status, stderr));
        }

        Ok(output.to_path_buf())
    }

    async fn replace_audio(&self, video: &Path, audio: &Path, output: &Path) -> Result<PathBuf> {
        let status = self.command(&replace_audio_args(video, audio, output))
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map_err(|e| self.launch_error(e))?;

        if !status.success() {
            return Err(DubbingError::tool_failed(self.tool_name(), status, ""));
        }

        Ok(output.to_path_buf())
    }
}
