use std::hint::black_box;
use std::sync::Arc;

use aimg_ascii::{GlyphMapper, PixelSampler};
use aimg_core::charset::{CHARSET_STANDARD, GlyphRamp};
use aimg_core::frame::FrameBuffer;
use criterion::{Criterion, criterion_group, criterion_main};

fn noise_frame(width: u32, height: u32) -> FrameBuffer {
    let mut frame = FrameBuffer::new(width, height);
    let mut seed = 0x1234_5678_u32;
    for byte in &mut frame.data {
        seed = seed.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        *byte = (seed >> 24) as u8;
    }
    frame
}

fn bench_sampler(c: &mut Criterion) {
    let frame = noise_frame(1920, 1080);
    let sampler = PixelSampler::default();

    c.bench_function("sample_1080p_to_160", |b| {
        b.iter(|| sampler.sample(black_box(&frame), black_box(160)));
    });
    c.bench_function("sample_1080p_to_400", |b| {
        b.iter(|| sampler.sample(black_box(&frame), black_box(400)));
    });

    let ramp = Arc::new(GlyphRamp::new(CHARSET_STANDARD).unwrap_or_default());
    let mapper = GlyphMapper::new(ramp);
    if let Ok(grid) = sampler.sample(&frame, 400) {
        c.bench_function("map_grid_400", |b| {
            b.iter(|| mapper.map_grid(black_box(&grid)));
        });
    }
}

criterion_group!(benches, bench_sampler);
criterion_main!(benches);
