//! In-memory PCM clips and WAV file I/O

use std::path::Path;
use std::fs::File;
use std::io::BufWriter;
use hound::{WavReader, WavWriter, SampleFormat};
use ndarray::{Array1, Array2};
use crate::error::{DubbingError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioFormat {
    Int16,
    Float32,
}

impl AudioFormat {
    pub fn name(&self) -> &'static str {
        match self {
            AudioFormat::Int16 => "int16",
            AudioFormat::Float32 => "float32",
        }
    }

    pub fn bytes_per_sample(&self) -> u16 {
        match self {
            AudioFormat::Int16 => 2,
            AudioFormat::Float32 => 4,
        }
    }

    pub fn to_sample_format(self) -> SampleFormat {
        match self {
            AudioFormat::Int16 => SampleFormat::Int,
            AudioFormat::Float32 => SampleFormat::Float,
        }
    }
}

/// Clip layout. `frames` counts sample frames, i.e. one sample per channel.
#[derive(Debug, Clone)]
pub struct AudioHeader {
    pub sample_rate: u32,
    pub channels: u16,
    pub format: AudioFormat,
    pub frames: u32,
    pub bits_per_sample: u16,
    pub duration: f64,
}

impl AudioHeader {
    pub fn new(sample_rate: u32, channels: u16, format: AudioFormat, frames: u32) -> Self {
        let bits_per_sample = format.bytes_per_sample() * 8;
        let duration = if sample_rate == 0 { 0.0 } else { frames as f64 / sample_rate as f64 };

        Self {
            sample_rate,
            channels,
            format,
            frames,
            bits_per_sample,
            duration,
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.sample_rate == 0 {
            return Err(DubbingError::audio("Sample rate cannot be 0"));
        }

        if self.channels == 0 || self.channels > 2 {
            return Err(DubbingError::audio("Channel count must be 1 or 2"));
        }

        Ok(())
    }

    pub fn to_wav_spec(&self) -> hound::WavSpec {
        hound::WavSpec {
            channels: self.channels,
            sample_rate: self.sample_rate,
            bits_per_sample: self.bits_per_sample,
            sample_format: self.format.to_sample_format(),
        }
    }

    fn set_frames(&mut self, frames: usize) {
        self.frames = frames as u32;
        self.duration = frames as f64 / self.sample_rate as f64;
    }
}

#[derive(Debug, Clone)]
pub struct WavAudio {
    pub header: AudioHeader,
    pub data: AudioData,
}

/// Samples normalized to [-1.0, 1.0]; stereo is stored as (frames, 2).
#[derive(Debug, Clone, PartialEq)]
pub enum AudioData {
    Mono(Array1<f32>),
    Stereo(Array2<f32>),
}

impl AudioData {
    pub fn len(&self) -> usize {
        match self {
            AudioData::Mono(data) => data.len(),
            AudioData::Stereo(data) => data.nrows(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn channels(&self) -> u16 {
        match self {
            AudioData::Mono(_) => 1,
            AudioData::Stereo(_) => 2,
        }
    }

    pub fn to_mono(&self) -> Array1<f32> {
        match self {
            AudioData::Mono(data) => data.clone(),
            AudioData::Stereo(data) => {
                if data.nrows() == 0 {
                    return Array1::zeros(0);
                }
                data.mean_axis(ndarray::Axis(1)).unwrap_or_else(|| Array1::zeros(0))
            }
        }
    }

    pub fn to_stereo(&self) -> Array2<f32> {
        match self {
            AudioData::Mono(data) => {
                let mut stereo = Array2::zeros((data.len(), 2));
                stereo.column_mut(0).assign(data);
                stereo.column_mut(1).assign(data);
                stereo
            }
            AudioData::Stereo(data) => data.clone(),
        }
    }

    /// Interleaved samples, frame by frame.
    pub fn interleaved(&self) -> impl Iterator<Item = f32> + '_ {
        let (mono, stereo) = match self {
            AudioData::Mono(data) => (Some(data.iter().copied()), None),
            AudioData::Stereo(data) => (None, Some(data.iter().copied())),
        };
        mono.into_iter().flatten().chain(stereo.into_iter().flatten())
    }
}

impl WavAudio {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let file = File::open(path)
            .map_err(|e| DubbingError::audio(format!("Cannot open audio file: {}", e)))?;

        let mut reader = WavReader::new(std::io::BufReader::new(file))
            .map_err(|e| DubbingError::audio(format!("Not a readable WAV file: {}", e)))?;

        let spec = reader.spec();

        if spec.sample_rate == 0 {
            return Err(DubbingError::audio("Invalid sample rate"));
        }

        if spec.channels == 0 || spec.channels > 2 {
            return Err(DubbingError::audio(format!(
                "Only mono or stereo audio supported, got {} channels", spec.channels
            )));
        }

        let (format, samples) = match (spec.sample_format, spec.bits_per_sample) {
            (SampleFormat::Int, 16) => {
                let samples = reader.samples::<i16>()
                    .map(|s| s.map(|v| v as f32 / 32767.0))
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|e| DubbingError::audio(format!("Failed to read sample: {}", e)))?;
                (AudioFormat::Int16, samples)
            }
            (SampleFormat::Float, 32) => {
                let samples = reader.samples::<f32>()
                    .collect::<std::result::Result<Vec<f32>, _>>()
                    .map_err(|e| DubbingError::audio(format!("Failed to read sample: {}", e)))?;
                (AudioFormat::Float32, samples)
            }
            (sample_format, bits) => {
                return Err(DubbingError::audio(format!(
                    "Unsupported WAV sample format: {:?} {}-bit", sample_format, bits
                )));
            }
        };

        let data = if spec.channels == 1 {
            AudioData::Mono(Array1::from(samples))
        } else {
            let frames = samples.len() / 2;
            let stereo = Array2::from_shape_vec((frames, 2), samples[..frames * 2].to_vec())
                .map_err(|e| DubbingError::audio(format!("Malformed stereo data: {}", e)))?;
            AudioData::Stereo(stereo)
        };

        let header = AudioHeader::new(spec.sample_rate, spec.channels, format, data.len() as u32);
        header.validate()?;

        log::debug!("Read {}: {:.3}s, {}Hz, {}ch",
                    path.display(), header.duration, header.sample_rate, header.channels);

        Ok(WavAudio { header, data })
    }

    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DubbingError::audio(format!("Cannot create output directory: {}", e)))?;
            }
        }

        let file = File::create(path)
            .map_err(|e| DubbingError::audio(format!("Cannot create output file: {}", e)))?;

        let spec = self.header.to_wav_spec();
        let mut writer = WavWriter::new(BufWriter::new(file), spec)
            .map_err(|e| DubbingError::audio(format!("Cannot create WAV writer: {}", e)))?;

        for sample in self.data.interleaved() {
            let clamped = if sample.is_finite() { sample.clamp(-1.0, 1.0) } else { 0.0 };
            let written = match self.header.format {
                AudioFormat::Float32 => writer.write_sample(clamped),
                AudioFormat::Int16 => writer.write_sample((clamped * 32767.0) as i16),
            };
            written.map_err(|e| DubbingError::audio(format!("Failed to write sample: {}", e)))?;
        }

        writer.finalize()
            .map_err(|e| DubbingError::audio(format!("Failed to finalize WAV writing: {}", e)))?;

        Ok(())
    }

    pub fn new_mono(sample_rate: u32, data: Array1<f32>, format: AudioFormat) -> Self {
        let header = AudioHeader::new(sample_rate, 1, format, data.len() as u32);

        WavAudio {
            header,
            data: AudioData::Mono(data),
        }
    }

    pub fn new_stereo(sample_rate: u32, data: Array2<f32>, format: AudioFormat) -> Result<Self> {
        if data.ncols() != 2 {
            return Err(DubbingError::audio("Stereo data must have 2 columns"));
        }

        let header = AudioHeader::new(sample_rate, 2, format, data.nrows() as u32);

        Ok(WavAudio {
            header,
            data: AudioData::Stereo(data),
        })
    }

    pub fn data(&self) -> &AudioData {
        &self.data
    }

    pub fn sample_rate(&self) -> u32 {
        self.header.sample_rate
    }

    pub fn channels(&self) -> u16 {
        self.header.channels
    }

    pub fn frames(&self) -> u32 {
        self.header.frames
    }

    pub fn duration(&self) -> f64 {
        self.header.duration
    }

    pub fn format(&self) -> AudioFormat {
        self.header.format
    }

    /// Zero-pads or truncates to exactly `new_length` frames.
    pub fn resize(&mut self, new_length: usize) {
        match &mut self.data {
            AudioData::Mono(data) => {
                if new_length > data.len() {
                    let mut new_data = Array1::zeros(new_length);
                    new_data.slice_mut(ndarray::s![..data.len()]).assign(data);
                    *data = new_data;
                } else {
                    *data = data.slice(ndarray::s![..new_length]).to_owned();
                }
            }
            AudioData::Stereo(data) => {
                if new_length > data.nrows() {
                    let mut new_data = Array2::zeros((new_length, 2));
                    new_data.slice_mut(ndarray::s![..data.nrows(), ..]).assign(data);
                    *data = new_data;
                } else {
                    *data = data.slice(ndarray::s![..new_length, ..]).to_owned();
                }
            }
        }

        self.header.set_frames(new_length);
    }

    pub fn validate(&self) -> Result<()> {
        self.header.validate()?;

        if self.data.len() as u32 != self.header.frames {
            return Err(DubbingError::audio(format!(
                "Data length mismatch: header shows {} frames, actual {} frames",
                self.header.frames, self.data.len()
            )));
        }

        if self.data.channels() != self.header.channels {
            return Err(DubbingError::audio(format!(
                "Channel count mismatch: header shows {} channels, actual {} channels",
                self.header.channels, self.data.channels()
            )));
        }

        Ok(())
    }
}
