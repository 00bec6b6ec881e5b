//! Configuration management

use crate::error::{DubbingError, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// The recognition model variant is fixed; only its directory is configurable.
pub const WHISPER_MODEL_FILE: &str = "ggml-small.bin";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub paths: PathsConfig,
    pub ffmpeg: FfmpegConfig,
    pub whisper: WhisperConfig,
    pub tts: TtsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub max_upload_mb: usize,
    pub retain_outputs_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub work_dir: PathBuf,
    pub output_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FfmpegConfig {
    pub binary: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WhisperConfig {
    pub model_dir: PathBuf,
    pub threads: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TtsConfig {
    pub base_url: String,
    pub slow: bool,
    pub max_chunk_chars: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8501".to_string(),
            max_upload_mb: 200,
            retain_outputs_secs: 3600,
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            work_dir: PathBuf::from("./work"),
            output_dir: PathBuf::from("./outputs"),
        }
    }
}

impl Default for FfmpegConfig {
    fn default() -> Self {
        Self {
            binary: PathBuf::from("ffmpeg"),
        }
    }
}

impl Default for WhisperConfig {
    fn default() -> Self {
        Self {
            model_dir: PathBuf::from("./models"),
            threads: num_cpus::get(),
        }
    }
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            base_url: "https://translate.google.com".to_string(),
            slow: false,
            max_chunk_chars: 100,
        }
    }
}

impl Config {
    /// Full path of the recognition model file
    pub fn model_path(&self) -> PathBuf {
        self.whisper.model_dir.join(WHISPER_MODEL_FILE)
    }

    pub fn bind_addr(&self) -> Result<SocketAddr> {
        self.server.bind.parse()
            .map_err(|e| DubbingError::config(format!("Invalid bind address '{}': {}", self.server.bind, e)))
    }

    pub fn max_upload_bytes(&self) -> usize {
        self.server.max_upload_mb * 1024 * 1024
    }
}

#[derive(Debug, Clone, Parser)]
#[command(name = "dubber", about = "AI voice-over for videos", version, author)]
pub struct Args {
    #[arg(short = 'c', long = "config", global = true, help = "Config file path (TOML format)")]
    pub config_file: Option<PathBuf>,

    #[arg(short = 'v', long = "verbose", global = true, help = "Enable verbose output mode")]
    pub verbose: bool,

    #[arg(long = "ffmpeg", global = true, help = "ffmpeg binary name or path")]
    pub ffmpeg: Option<PathBuf>,

    #[arg(long = "model-dir", global = true, help = "Directory holding ggml-small.bin")]
    pub model_dir: Option<PathBuf>,

    #[arg(long = "threads", global = true, help = "Speech recognition thread count")]
    pub threads: Option<usize>,

    #[arg(long = "work-dir", global = true, help = "Root directory for per-run workspaces")]
    pub work_dir: Option<PathBuf>,

    #[arg(long = "output-dir", global = true, help = "Directory for finished videos")]
    pub output_dir: Option<PathBuf>,

    #[arg(long = "bind", global = true, help = "Web server listen address")]
    pub bind: Option<String>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Start the upload form web server (default)
    Serve,
    /// Dub a single video file
    Run {
        #[arg(short = 'i', long = "input", help = "Input video (mp4, avi or mov)")]
        input: PathBuf,

        #[arg(short = 'l', long = "language", default_value = "en", help = "Target language: en, es, fr, hi or its English name")]
        language: String,

        #[arg(short = 'o', long = "output", default_value = "ai_voice_video.mp4", help = "Output video path")]
        output: PathBuf,
    },
    /// Validate configuration and external dependencies
    Check,
    /// Write the default configuration to a TOML file
    InitConfig {
        path: PathBuf,
    },
}

impl Config {
    /// Create config from command line arguments and config file
    pub fn from_args_and_config(args: &Args) -> Result<Self> {
        let mut config = if let Some(config_path) = &args.config_file {
            Self::from_file(config_path)?
        } else {
            Self::default()
        };

        // Command line arguments override config file settings
        if let Some(ffmpeg) = &args.ffmpeg {
            config.ffmpeg.binary = ffmpeg.clone();
        }
        if let Some(model_dir) = &args.model_dir {
            config.whisper.model_dir = model_dir.clone();
        }
        if let Some(threads) = args.threads {
            config.whisper.threads = threads;
        }
        if let Some(work_dir) = &args.work_dir {
            config.paths.work_dir = work_dir.clone();
        }
        if let Some(output_dir) = &args.output_dir {
            config.paths.output_dir = output_dir.clone();
        }
        if let Some(bind) = &args.bind {
            config.server.bind = bind.clone();
        }

        config.validate()?;

        Ok(config)
    }

    /// Load config from TOML config file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| DubbingError::config(format!("Failed to read config file: {}", e)))?;

        toml::from_str(&content)
            .map_err(|e| DubbingError::config(format!("Failed to parse config file: {}", e)))
    }

    pub fn validate(&self) -> Result<()> {
        self.bind_addr()?;

        if self.server.max_upload_mb == 0 {
            return Err(DubbingError::config("Upload limit must be greater than 0"));
        }

        if self.ffmpeg.binary.as_os_str().is_empty() {
            return Err(DubbingError::config("ffmpeg binary cannot be empty"));
        }

        if self.whisper.threads == 0 {
            return Err(DubbingError::config("Recognition thread count must be greater than 0"));
        }
        if self.whisper.threads > num_cpus::get() * 2 {
            return Err(DubbingError::config("Recognition thread count cannot exceed 2x logical CPU cores"));
        }

        if !(self.tts.base_url.starts_with("http://") || self.tts.base_url.starts_with("https://")) {
            return Err(DubbingError::config(format!("TTS base URL must be http(s): {}", self.tts.base_url)));
        }
        if self.tts.max_chunk_chars == 0 || self.tts.max_chunk_chars > 200 {
            return Err(DubbingError::config("TTS chunk size must be in range [1, 200]"));
        }

        Ok(())
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DubbingError::config(format!("Failed to serialize config: {}", e)))?;

        std::fs::write(path, content)
            .map_err(|e| DubbingError::config(format!("Failed to write config file: {}", e)))
    }

    pub fn create_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        Self::default().save_to_file(path)
    }
}
