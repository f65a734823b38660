use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use framecodec::{Codec, CodecConfig};

fn random_pcm(samples: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    let mut out = Vec::with_capacity(samples * 2);
    for _ in 0..samples {
        state = state.wrapping_mul(6364136223846793005).wrapping_add(1);
        let v = ((state >> 33) as u32 % 40001) as i32 - 20000;
        out.extend_from_slice(&(v as i16).to_le_bytes());
    }
    out
}

fn tone_pcm(samples: usize, channels: usize) -> Vec<u8> {
    (0..samples)
        .flat_map(|i| {
            let v = (12000.0 * (i as f64 * 0.0576).sin()) as i16;
            std::iter::repeat_n(v, channels).flat_map(|s| s.to_le_bytes())
        })
        .collect()
}

fn configs() -> Vec<(&'static str, CodecConfig)> {
    vec![
        ("48k_mono", CodecConfig::default()),
        ("48k_stereo", CodecConfig::new(48000, 2, 960, 128000)),
        ("16k_mono", CodecConfig::new(16000, 1, 320, 24000)),
    ]
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");
    for (name, cfg) in configs() {
        let codec = Codec::new(cfg).unwrap();
        let channels = cfg.channels as usize;
        let noise = random_pcm(cfg.frame_size * channels, 42);
        let tone = tone_pcm(cfg.frame_size, channels);
        group.throughput(Throughput::Bytes(codec.frame_bytes() as u64));

        group.bench_with_input(BenchmarkId::new("noise", name), &noise, |b, pcm| {
            b.iter(|| codec.encode_frame(black_box(pcm)).unwrap())
        });
        group.bench_with_input(BenchmarkId::new("tone", name), &tone, |b, pcm| {
            b.iter(|| codec.encode_frame(black_box(pcm)).unwrap())
        });
    }
    group.finish();
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");
    for (name, cfg) in configs() {
        let codec = Codec::new(cfg).unwrap();
        let channels = cfg.channels as usize;
        let packet = codec
            .encode_frame(&random_pcm(cfg.frame_size * channels, 7))
            .unwrap();
        group.throughput(Throughput::Bytes(codec.frame_bytes() as u64));

        group.bench_with_input(BenchmarkId::new("noise", name), &packet, |b, packet| {
            b.iter(|| codec.decode_frame(black_box(packet.as_bytes())).unwrap())
        });
    }
    group.finish();
}

fn bench_superframe(c: &mut Criterion) {
    let codec = Codec::new(CodecConfig::default()).unwrap();
    let pcm = random_pcm(codec.max_frame_size(), 11);
    let packets: Vec<u8> = codec
        .encode_frames(&pcm)
        .unwrap()
        .into_iter()
        .flat_map(|p| p.into_bytes())
        .collect();

    c.bench_function("encode_frames/6x960", |b| {
        b.iter(|| codec.encode_frames(black_box(&pcm)).unwrap())
    });
    c.bench_function("decode_frames/6x960", |b| {
        b.iter(|| codec.decode_frames(black_box(&packets)).unwrap())
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_superframe);
criterion_main!(benches);
