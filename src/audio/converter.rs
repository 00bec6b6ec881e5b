//! Audio Format Converter

use ndarray::{Array1, Array2, ArrayView1};
use crate::audio::{AudioData, WavAudio};
use crate::error::{DubbingError, Result};

/// Whisper models expect 16 kHz mono input.
pub const RECOGNITION_SAMPLE_RATE: u32 = 16000;

pub struct AudioConverter;

impl AudioConverter {
    /// Downmix to a single channel, keeping rate and format.
    pub fn to_mono(audio: &WavAudio) -> WavAudio {
        if audio.channels() == 1 {
            return audio.clone();
        }
        WavAudio::new_mono(audio.sample_rate(), audio.data().to_mono(), audio.format())
    }

    /// Convert sample rate using linear interpolation
    pub fn convert_sample_rate(audio: &WavAudio, target_sample_rate: u32) -> Result<WavAudio> {
        if target_sample_rate == 0 {
            return Err(DubbingError::audio("Target sample rate cannot be 0"));
        }
        if audio.sample_rate() == target_sample_rate {
            return Ok(audio.clone());
        }

        let ratio = target_sample_rate as f64 / audio.sample_rate() as f64;
        let new_length = (audio.data().len() as u64 * target_sample_rate as u64
            / audio.sample_rate() as u64) as usize;

        let new_data = match audio.data() {
            AudioData::Mono(data) => {
                AudioData::Mono(Self::resample_mono(data.view(), new_length, ratio)?)
            }
            AudioData::Stereo(data) => {
                let new_left = Self::resample_mono(data.column(0), new_length, ratio)?;
                let new_right = Self::resample_mono(data.column(1), new_length, ratio)?;
                let mut stereo = Array2::zeros((new_length, 2));
                stereo.column_mut(0).assign(&new_left);
                stereo.column_mut(1).assign(&new_right);
                AudioData::Stereo(stereo)
            }
        };

        let mut new_audio = audio.clone();
        new_audio.header.sample_rate = target_sample_rate;
        new_audio.header.frames = new_length as u32;
        new_audio.header.duration = new_length as f64 / target_sample_rate as f64;
        new_audio.data = new_data;
        Ok(new_audio)
    }

    /// Mono 16 kHz samples ready for speech recognition.
    pub fn prepare_for_recognition(audio: &WavAudio) -> Result<Vec<f32>> {
        let mono = Self::to_mono(audio);
        let resampled = Self::convert_sample_rate(&mono, RECOGNITION_SAMPLE_RATE)?;
        Ok(resampled.data().to_mono().to_vec())
    }

    fn resample_mono(data: ArrayView1<f32>, new_length: usize, ratio: f64) -> Result<Array1<f32>> {
        if data.is_empty() {
            return Err(DubbingError::audio("Input data is empty"));
        }

        let old_length = data.len();
        let mut new_data = Array1::zeros(new_length);

        for i in 0..new_length {
            let old_pos = i as f64 / ratio;
            let old_index = old_pos.floor() as usize;
            let fraction = old_pos - old_index as f64;

            new_data[i] = if old_index >= old_length - 1 {
                data[old_length - 1]
            } else {
                data[old_index] + (data[old_index + 1] - data[old_index]) * fraction as f32
            };
        }

        Ok(new_data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::AudioFormat;

    #[test]
    fn test_resample_same_rate() {
        let audio = WavAudio::new_mono(16000, Array1::from(vec![0.1, 0.2, 0.3]), AudioFormat::Float32);
        let result = AudioConverter::convert_sample_rate(&audio, 16000).unwrap();
        assert_eq!(result.sample_rate(), 16000);
        assert_eq!(result.frames(), 3);
    }

    #[test]
    fn test_resample_upsample() {
        let audio = WavAudio::new_mono(8000, Array1::from(vec![0.0, 1.0]), AudioFormat::Float32);
        let result = AudioConverter::convert_sample_rate(&audio, 16000).unwrap();
        assert_eq!(result.sample_rate(), 16000);
        assert_eq!(result.data().len(), 4);
    }

    #[test]
    fn test_resample_empty_fails() {
        let audio = WavAudio::new_mono(8000, Array1::zeros(0), AudioFormat::Float32);
        assert!(AudioConverter::convert_sample_rate(&audio, 16000).is_err());
    }

    #[test]
    fn test_prepare_for_recognition() {
        // One second of 44.1 kHz stereo, as produced by extraction.
        let stereo = Array2::from_elem((44100, 2), 0.25f32);
        let audio = WavAudio::new_stereo(44100, stereo, AudioFormat::Int16).unwrap();

        let samples = AudioConverter::prepare_for_recognition(&audio).unwrap();

        assert_eq!(samples.len(), 16000);
        assert!(samples.iter().all(|s| (s - 0.25).abs() < 1e-6));
    }
}
