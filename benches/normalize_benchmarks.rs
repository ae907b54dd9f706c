//! Benchmarks for frame normalization and full conversion.
//!
//! Run with: cargo bench
//!
//! The conversion benchmark requires fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use framestream::{
    ChannelOrder, ConvertOptions, FfmpegLogLevel, FrameNormalizer, ResizeFilter, SourceFrame,
    TargetGeometry,
};

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";

fn gradient_frame(width: u32, height: u32, channel_order: ChannelOrder) -> SourceFrame {
    let data = (0..width * height * 3).map(|i| (i % 256) as u8).collect();
    SourceFrame::new(data, width, height, channel_order)
}

fn benchmark_filters(criterion: &mut Criterion) {
    let geometry = TargetGeometry::resolve(150, 1920, 1080).unwrap();
    let frame = gradient_frame(1920, 1080, ChannelOrder::Rgb);

    let mut group = criterion.benchmark_group("normalize 1080p -> 150x84");
    for filter in [
        ResizeFilter::Nearest,
        ResizeFilter::Triangle,
        ResizeFilter::CatmullRom,
        ResizeFilter::Lanczos3,
    ] {
        let normalizer = FrameNormalizer::new(filter);
        group.bench_function(filter.to_string(), |bencher| {
            bencher.iter(|| normalizer.normalize(black_box(frame.clone()), geometry).unwrap());
        });
    }
    group.finish();
}

fn benchmark_channel_swap(criterion: &mut Criterion) {
    let geometry = TargetGeometry::resolve(640, 640, 480).unwrap();
    let frame = gradient_frame(640, 480, ChannelOrder::Bgr);
    let normalizer = FrameNormalizer::default();

    criterion.bench_function("normalize 640x480 BGR passthrough", |bencher| {
        bencher.iter(|| normalizer.normalize(black_box(frame.clone()), geometry).unwrap());
    });
}

fn benchmark_conversion(criterion: &mut Criterion) {
    framestream::set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let output = dir.path().join("frames.data");
    let options = ConvertOptions::new();

    let mut group = criterion.benchmark_group("conversion");
    group.sample_size(10);
    group.bench_function("convert 2s 640x480 fixture", |bencher| {
        bencher.iter(|| framestream::convert(SAMPLE_VIDEO, &output, &options).unwrap());
    });
    group.finish();
}

criterion::criterion_group!(
    benches,
    benchmark_filters,
    benchmark_channel_swap,
    benchmark_conversion,
);
criterion::criterion_main!(benches);
