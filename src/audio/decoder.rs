//! Compressed audio decoding
//!
//! WAV files go through `hound`; everything else (the synthesized MP3 in
//! particular) is probed and decoded with symphonia. Clips with more than two
//! channels are downmixed to mono.

use std::fs::File;
use std::path::Path;

use ndarray::{Array1, Array2};
use symphonia::core::audio::SampleBuffer;
use symphonia::core::codecs::DecoderOptions;
use symphonia::core::errors::Error as SymphoniaError;
use symphonia::core::formats::FormatOptions;
use symphonia::core::io::MediaSourceStream;
use symphonia::core::meta::MetadataOptions;
use symphonia::core::probe::Hint;

use crate::audio::{AudioFormat, WavAudio};
use crate::error::{DubbingError, Result};

/// Decode any supported audio file into PCM.
pub fn decode_file<P: AsRef<Path>>(path: P) -> Result<WavAudio> {
    let path = path.as_ref();
    let extension = path.extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase);

    let decoded = match extension.as_deref() {
        Some("wav") => WavAudio::from_file(path),
        _ => decode_compressed(path),
    };
    decoded.inspect_err(|e| log::warn!("Cannot decode {}: {}", path.display(), e))
}

fn decode_compressed(path: &Path) -> Result<WavAudio> {
    let file = File::open(path)
        .map_err(|e| DubbingError::audio(format!("Cannot open audio file: {}", e)))?;
    let mss = MediaSourceStream::new(Box::new(file), Default::default());

    let mut hint = Hint::new();
    if let Some(ext) = path.extension().and_then(|e| e.to_str()) {
        hint.with_extension(ext);
    }

    let probed = symphonia::default::get_probe()
        .format(&hint, mss, &FormatOptions::default(), &MetadataOptions::default())
        .map_err(|e| DubbingError::audio(format!("unrecognized audio format: {}", e)))?;
    let mut format = probed.format;

    let track = format.default_track()
        .ok_or_else(|| DubbingError::audio("no audio track found"))?;
    let track_id = track.id;
    let codec_params = track.codec_params.clone();

    let mut decoder = symphonia::default::get_codecs()
        .make(&codec_params, &DecoderOptions::default())
        .map_err(|e| DubbingError::audio(format!("codec: {}", e)))?;

    let mut sample_rate = codec_params.sample_rate.unwrap_or(0);
    let mut channels = codec_params.channels.map(|c| c.count()).unwrap_or(0);
    let mut interleaved: Vec<f32> = Vec::new();

    loop {
        let packet = match format.next_packet() {
            Ok(p) => p,
            Err(SymphoniaError::IoError(ref e)) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
            Err(SymphoniaError::ResetRequired) => break,
            Err(e) => return Err(e.into()),
        };

        if packet.track_id() != track_id {
            continue;
        }

        let decoded = match decoder.decode(&packet) {
            Ok(d) => d,
            Err(SymphoniaError::DecodeError(e)) => {
                log::warn!("Skipping corrupt audio frame in {}: {}", path.display(), e);
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let spec = *decoded.spec();
        if decoded.frames() == 0 {
            continue;
        }
        sample_rate = spec.rate;
        channels = spec.channels.count();

        let mut buffer = SampleBuffer::<f32>::new(decoded.capacity() as u64, spec);
        buffer.copy_interleaved_ref(decoded);
        interleaved.extend_from_slice(buffer.samples());
    }

    if sample_rate == 0 || channels == 0 {
        return Err(DubbingError::audio("unknown sample rate or channel layout"));
    }
    if interleaved.is_empty() {
        return Err(DubbingError::audio("no audio samples decoded"));
    }

    let audio = match channels {
        1 => WavAudio::new_mono(sample_rate, Array1::from(interleaved), AudioFormat::Int16),
        2 => {
            let frames = interleaved.len() / 2;
            interleaved.truncate(frames * 2);
            let stereo = Array2::from_shape_vec((frames, 2), interleaved)
                .map_err(|e| DubbingError::audio(format!("Malformed stereo data: {}", e)))?;
            WavAudio::new_stereo(sample_rate, stereo, AudioFormat::Int16)?
        }
        n => {
            let mono: Vec<f32> = interleaved.chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect();
            WavAudio::new_mono(sample_rate, Array1::from(mono), AudioFormat::Int16)
        }
    };

    log::debug!("Decoded {}: {:.3}s, {}Hz, {}ch",
                path.display(), audio.duration(), audio.sample_rate(), channels);

    Ok(audio)
}
