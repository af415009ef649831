//! Benchmarks for frame mapping, PNG encoding, and archive assembly.
//!
//! Run with: cargo bench

use std::hint::black_box;

use criterion::Criterion;
use image::{Rgba, RgbaImage};
use lottie_sprites::{
    AnimationDescriptor, ExtractedFrame, ImageHandle, ResampleSpec, build_archive,
    compute_mapping,
};
use tokio::runtime::Runtime;

fn benchmark_mapping(criterion: &mut Criterion) {
    criterion.bench_function("mapping 600 -> 240 (downsample)", |bencher| {
        bencher.iter(|| compute_mapping(black_box(600), black_box(240)));
    });

    criterion.bench_function("mapping 60 -> 600 (upsample)", |bencher| {
        bencher.iter(|| compute_mapping(black_box(60), black_box(600)));
    });

    let descriptor = AnimationDescriptor::new("bench.json", 512, 512, 300, 60.0).unwrap();
    criterion.bench_function("resample spec + mapping at 24 fps", |bencher| {
        bencher.iter(|| {
            let mut spec = ResampleSpec::for_descriptor(&descriptor);
            spec.set_frame_rate(&descriptor, black_box(24.0)).unwrap();
            spec.set_width(&descriptor, black_box(128)).unwrap();
            spec.mapping(&descriptor)
        });
    });
}

fn benchmark_encoding(criterion: &mut Criterion) {
    let image = RgbaImage::from_fn(256, 256, |x, y| Rgba([x as u8, y as u8, 128, 255]));

    criterion.bench_function("encode 256x256 frame as PNG", |bencher| {
        bencher.iter(|| ImageHandle::from_rgba(black_box(&image)).unwrap());
    });
}

fn benchmark_archive(criterion: &mut Criterion) {
    let runtime = Runtime::new().unwrap();
    let image = RgbaImage::from_pixel(128, 128, Rgba([255, 0, 0, 255]));
    let handle = ImageHandle::from_rgba(&image).unwrap();
    let frames: Vec<ExtractedFrame> = (0..60)
        .map(|index| ExtractedFrame {
            index,
            source_index: index,
            generation: 1,
            image: handle.clone(),
        })
        .collect();

    criterion.bench_function("zip 60 frames (stored)", |bencher| {
        bencher.iter(|| {
            runtime
                .block_on(build_archive(frames.iter(), "bench"))
                .unwrap()
        });
    });
}

criterion::criterion_group!(
    benches,
    benchmark_mapping,
    benchmark_encoding,
    benchmark_archive,
);
criterion::criterion_main!(benches);
