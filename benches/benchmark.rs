use criterion::{Criterion, black_box, criterion_group, criterion_main};
use glam::DVec2;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vr_video_sync::recognition::glyph::render_digits;
use vr_video_sync::recognition::{GlyphRecognizer, TextRecognizer};
use vr_video_sync::template::{masked_ccorr_normed, scaled_template};
use vr_video_sync::transform::{CoordinateTransform, LandmarkSet};

fn bench_transform_fit(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(0);
    let vr: Vec<DVec2> = (0..64)
        .map(|_| DVec2::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0)))
        .collect();
    let img = vr.iter().map(|p| DVec2::new(640.0 * p.x + 12.0, 360.0 * p.y + 7.0)).collect();
    let set = LandmarkSet::new(vr, img);

    c.bench_function("transform_fit_64", |b| {
        b.iter(|| CoordinateTransform::fit(black_box(&set)))
    });
}

fn bench_masked_matching(c: &mut Criterion) {
    let mut rng = ChaCha8Rng::seed_from_u64(1);
    let source = RgbImage::from_fn(320, 240, |_, _| {
        Rgb([rng.random_range(0..=255), rng.random_range(0..=255), rng.random_range(0..=255)])
    });
    let template = RgbaImage::from_fn(30, 30, |x, y| {
        let inside = (x as i32 - 15).pow(2) + (y as i32 - 15).pow(2) < 196;
        Rgba([200, (x * 8) as u8, (y * 8) as u8, if inside { 255 } else { 0 }])
    });
    let scaled = scaled_template(&template, 30);

    c.bench_function("masked_ccorr_normed_320x240_30", |b| {
        b.iter(|| masked_ccorr_normed(black_box(&source), black_box(&scaled)))
    });
}

fn bench_glyph_recognition(c: &mut Criterion) {
    let crop = render_digits("1234567", 4);
    let recognizer = GlyphRecognizer::default();

    c.bench_function("glyph_recognize_7_digits", |b| {
        b.iter(|| recognizer.recognize(black_box(&crop)))
    });
}

criterion_group!(
    benches,
    bench_transform_fit,
    bench_masked_matching,
    bench_glyph_recognition
);
criterion_main!(benches);
