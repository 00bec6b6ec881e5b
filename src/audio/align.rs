//! Duration alignment of a synthesized voice track to the original audio
//!
//! The candidate is padded with trailing silence when it is shorter than the
//! reference and truncated when it is longer. There is no crossfade and no
//! speech-rate adjustment.

use std::path::{Path, PathBuf};

use crate::audio::{decoder, AudioFormat, WavAudio};
use crate::error::Result;

/// How a candidate was brought to the reference duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjustment {
    Padded { frames: usize },
    Truncated { frames: usize },
    Unchanged,
}

/// Candidate frames needed to cover the reference duration, rounded to the
/// nearest frame at the candidate's sample rate.
pub fn target_frames(reference: &WavAudio, candidate_rate: u32) -> usize {
    let reference_rate = reference.sample_rate() as u64;
    let scaled = reference.frames() as u64 * candidate_rate as u64;
    ((scaled + reference_rate / 2) / reference_rate) as usize
}

/// Returns the candidate resized to the reference duration, keeping the
/// candidate's own sample rate and channel layout.
pub fn align_to_reference(reference: &WavAudio, candidate: &WavAudio) -> (WavAudio, Adjustment) {
    let target = target_frames(reference, candidate.sample_rate());
    let current = candidate.frames() as usize;

    let adjustment = if target > current {
        Adjustment::Padded { frames: target - current }
    } else if target < current {
        Adjustment::Truncated { frames: current - target }
    } else {
        Adjustment::Unchanged
    };

    let mut aligned = candidate.clone();
    aligned.resize(target);
    aligned.header.format = AudioFormat::Int16;
    aligned.header.bits_per_sample = AudioFormat::Int16.bytes_per_sample() * 8;

    (aligned, adjustment)
}

/// Decode both clips, align the candidate and export it as 16-bit PCM WAV.
pub fn adjust_audio_length(reference_path: &Path, candidate_path: &Path, output_path: &Path) -> Result<PathBuf> {
    let reference = decoder::decode_file(reference_path)?;
    let candidate = decoder::decode_file(candidate_path)?;

    let (aligned, adjustment) = align_to_reference(&reference, &candidate);
    log::debug!("Aligned {:.3}s candidate to {:.3}s reference: {:?}",
                candidate.duration(), reference.duration(), adjustment);

    aligned.save_to_file(output_path)?;
    Ok(output_path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioData;
    use ndarray::{Array1, Array2};
    use tempfile::TempDir;

    const RATE: u32 = 8000;

    fn ramp(seconds: usize, rate: u32) -> WavAudio {
        let frames = seconds * rate as usize;
        let data = Array1::from_iter((0..frames).map(|i| 0.1 + (i % 100) as f32 / 200.0));
        WavAudio::new_mono(rate, data, AudioFormat::Int16)
    }

    fn mono(audio: &WavAudio) -> &Array1<f32> {
        match audio.data() {
            AudioData::Mono(d) => d,
            _ => panic!("expected mono"),
        }
    }

    #[test]
    fn test_shorter_candidate_is_padded_with_silence() {
        let reference = ramp(10, RATE);
        let candidate = ramp(7, RATE);

        let (aligned, adjustment) = align_to_reference(&reference, &candidate);

        assert_eq!(adjustment, Adjustment::Padded { frames: 3 * RATE as usize });
        assert_eq!(aligned.frames(), 10 * RATE);
        assert!((aligned.duration() - 10.0).abs() < 1e-9);

        let data = mono(&aligned);
        let split = 7 * RATE as usize;
        assert_eq!(data.slice(ndarray::s![..split]), mono(&candidate).view());
        assert!(data.slice(ndarray::s![split..]).iter().all(|&s| s == 0.0));
    }

    #[test]
    fn test_longer_candidate_is_truncated() {
        let reference = ramp(10, RATE);
        let candidate = ramp(13, RATE);

        let (aligned, adjustment) = align_to_reference(&reference, &candidate);

        assert_eq!(adjustment, Adjustment::Truncated { frames: 3 * RATE as usize });
        assert_eq!(aligned.frames(), 10 * RATE);
        let split = 10 * RATE as usize;
        assert_eq!(mono(&aligned).view(), mono(&candidate).slice(ndarray::s![..split]));
    }

    #[test]
    fn test_equal_duration_is_unchanged() {
        let reference = ramp(2, RATE);
        let candidate = ramp(2, RATE);

        let (aligned, adjustment) = align_to_reference(&reference, &candidate);

        assert_eq!(adjustment, Adjustment::Unchanged);
        assert_eq!(aligned.data(), candidate.data());
    }

    #[test]
    fn test_duration_follows_reference_across_sample_rates() {
        // 44.1 kHz stereo reference against a 24 kHz mono voice, like real runs.
        let reference = WavAudio::new_stereo(44100, Array2::zeros((44100 * 3 + 21, 2)), AudioFormat::Int16).unwrap();

        for candidate_secs in [1, 3, 5] {
            let candidate = ramp(candidate_secs, 24000);
            let (aligned, _) = align_to_reference(&reference, &candidate);

            assert_eq!(aligned.sample_rate(), 24000);
            assert_eq!(aligned.channels(), 1);
            let frame = 1.0 / 24000.0;
            assert!((aligned.duration() - reference.duration()).abs() <= frame / 2.0 + 1e-12);
        }
    }

    #[test]
    fn test_adjust_audio_length_exports_wav() {
        let dir = TempDir::new().unwrap();
        let reference_path = dir.path().join("audio.wav");
        let candidate_path = dir.path().join("voice.wav");
        let output_path = dir.path().join("adjusted.wav");

        WavAudio::new_stereo(RATE, Array2::zeros((RATE as usize * 4, 2)), AudioFormat::Int16)
            .unwrap()
            .save_to_file(&reference_path)
            .unwrap();
        ramp(1, RATE).save_to_file(&candidate_path).unwrap();

        let written = adjust_audio_length(&reference_path, &candidate_path, &output_path).unwrap();
        assert_eq!(written, output_path);

        let exported = WavAudio::from_file(&output_path).unwrap();
        assert_eq!(exported.format(), AudioFormat::Int16);
        assert_eq!(exported.frames(), RATE * 4);
    }

    #[test]
    fn test_adjust_audio_length_with_mp3_voice() {
        let dir = TempDir::new().unwrap();
        let reference_path = dir.path().join("audio.wav");
        let output_path = dir.path().join("adjusted.wav");
        let voice_path = concat!(env!("CARGO_MANIFEST_DIR"), "/tests/fixtures/voice.mp3");

        WavAudio::new_stereo(44100, Array2::zeros((44100 * 3, 2)), AudioFormat::Int16)
            .unwrap()
            .save_to_file(&reference_path)
            .unwrap();

        adjust_audio_length(&reference_path, Path::new(voice_path), &output_path).unwrap();

        let exported = WavAudio::from_file(&output_path).unwrap();
        assert_eq!(exported.sample_rate(), 44100);
        assert_eq!(exported.channels(), 1);
        assert_eq!(exported.frames(), 44100 * 3);
        assert_eq!(exported.duration(), 3.0);
    }

    #[test]
    fn test_adjust_audio_length_missing_candidate_fails() {
        let dir = TempDir::new().unwrap();
        let reference_path = dir.path().join("audio.wav");
        ramp(1, RATE).save_to_file(&reference_path).unwrap();

        let result = adjust_audio_length(&reference_path, &dir.path().join("missing.mp3"), &dir.path().join("out.wav"));
        assert!(result.is_err());
        assert!(!dir.path().join("out.wav").exists());
    }
}
