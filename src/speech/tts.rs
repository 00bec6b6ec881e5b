//! Speech synthesis through the Google Translate TTS endpoint

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::config::TtsConfig;
use crate::error::{DubbingError, Result};
use crate::speech::Language;

/// Characters after which a chunk may be cut.
const BREAK_CHARS: &[char] = &['.', ',', ';', ':', '!', '?', '…', '।', '。', '\n'];

#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Speaks `text` and writes the audio to `output`.
    async fn synthesize(&self, text: &str, language: Language, output: &Path) -> Result<PathBuf>;
}

#[derive(Debug, Clone)]
pub struct GoogleTts {
    client: reqwest::Client,
    base_url: String,
    slow: bool,
    max_chunk_chars: usize,
}

impl GoogleTts {
    pub fn new(config: &TtsConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("dubber/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| DubbingError::synthesis(format!("client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            slow: config.slow,
            max_chunk_chars: config.max_chunk_chars.max(1),
        })
    }

    async fn fetch_chunk(&self, chunk: &str, index: usize, total: usize, language: Language) -> Result<Vec<u8>> {
        let url = format!("{}/translate_tts", self.base_url);
        let speed = if self.slow { "0.3" } else { "1" };
        let total = total.to_string();
        let index = index.to_string();
        let text_len = chunk.chars().count().to_string();

        let response = self.client
            .get(&url)
            .query(&[
                ("ie", "UTF-8"),
                ("client", "tw-ob"),
                ("tl", language.code()),
                ("q", chunk),
                ("ttsspeed", speed),
                ("total", total.as_str()),
                ("idx", index.as_str()),
                ("textlen", text_len.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(DubbingError::synthesis(format!(
                "provider returned {}: {}", status, body.chars().take(200).collect::<String>()
            )));
        }

        let body = response.bytes().await?;
        if body.is_empty() {
            return Err(DubbingError::synthesis("provider returned an empty audio body"));
        }
        Ok(body.to_vec())
    }
}

#[async_trait]
impl Synthesizer for GoogleTts {
    async fn synthesize(&self, text: &str, language: Language, output: &Path) -> Result<PathBuf> {
        let chunks = split_text(text, self.max_chunk_chars);
        if chunks.is_empty() {
            return Err(DubbingError::synthesis("no text to speak"));
        }

        // MP3 frames are self-delimiting, so the chunk bodies concatenate into one stream.
        let mut audio = Vec::new();
        for (index, chunk) in chunks.iter().enumerate() {
            log::debug!("TTS chunk {}/{} ({} chars)", index + 1, chunks.len(), chunk.chars().count());
            audio.extend(self.fetch_chunk(chunk, index, chunks.len(), language).await?);
        }

        if let Err(e) = tokio::fs::write(output, &audio).await {
            log::warn!("Cannot save synthesized voice to {}: {}", output.display(), e);
            return Err(DubbingError::synthesis(format!("cannot save the synthesized voice: {}", e)));
        }

        log::info!("Synthesized {} bytes of {} speech in {} request(s)", audio.len(), language, chunks.len());
        Ok(output.to_path_buf())
    }
}

/// Splits text into chunks of at most `max_chars` characters, preferring
/// punctuation, then whitespace, then a hard cut.
pub fn split_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut chunks = Vec::new();

    for sentence in text.split_inclusive(BREAK_CHARS) {
        let sentence = sentence.trim();
        if sentence.is_empty() || sentence.chars().all(|c| BREAK_CHARS.contains(&c)) {
            continue;
        }
        if sentence.chars().count() <= max_chars {
            chunks.push(sentence.to_string());
            continue;
        }

        let mut current = String::new();
        for word in sentence.split_whitespace() {
            let word_len = word.chars().count();
            let current_len = current.chars().count();

            if current_len > 0 && current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                continue;
            }
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
            }
            if word_len <= max_chars {
                current.push_str(word);
            } else {
                let letters: Vec<char> = word.chars().collect();
                for piece in letters.chunks(max_chars) {
                    chunks.push(piece.iter().collect());
                }
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
    }

    chunks
}
