use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use ndarray::{Array1, Array2};

use dubber::audio::{align_to_reference, AudioConverter, AudioFormat, WavAudio};

fn stereo(seconds: usize, rate: u32) -> WavAudio {
    let frames = seconds * rate as usize;
    let data = Array2::from_shape_fn((frames, 2), |(i, c)| ((i + c * 7) % 200) as f32 / 400.0);
    WavAudio::new_stereo(rate, data, AudioFormat::Int16).unwrap()
}

fn mono(seconds: usize, rate: u32) -> WavAudio {
    let frames = seconds * rate as usize;
    WavAudio::new_mono(rate, Array1::from_iter((0..frames).map(|i| (i % 100) as f32 / 200.0)), AudioFormat::Int16)
}

fn bench_alignment(c: &mut Criterion) {
    let mut group = c.benchmark_group("align_to_reference");
    let reference = stereo(60, 44100);

    for voice_seconds in [30usize, 90] {
        let candidate = mono(voice_seconds, 24000);
        group.bench_with_input(BenchmarkId::from_parameter(voice_seconds), &candidate, |b, candidate| {
            b.iter(|| align_to_reference(black_box(&reference), black_box(candidate)))
        });
    }
    group.finish();
}

fn bench_recognition_prep(c: &mut Criterion) {
    let audio = stereo(30, 44100);
    c.bench_function("prepare_for_recognition_30s", |b| {
        b.iter(|| AudioConverter::prepare_for_recognition(black_box(&audio)).unwrap())
    });
}

criterion_group!(benches, bench_alignment, bench_recognition_prep);
criterion_main!(benches);
