use glam::DVec2;
use image::{Rgb, RgbImage, Rgba, RgbaImage};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use vr_video_sync::annotate::{MarkerStyle, draw_bboxes, draw_centroid, draw_marker};
use vr_video_sync::template::{
    Centroid, DetectorConfig, TemplateDetector, detect, masked_ccorr_normed, mean_centroid,
    median_centroid, scaled_template,
};
use vr_video_sync::types::BoundingBox;

/// Round marker made of red and blue 5 px cells, transparent outside the disc.
fn marker_template(size: u32) -> RgbaImage {
    let c = size as f32 / 2.0;
    RgbaImage::from_fn(size, size, |x, y| {
        let dx = x as f32 + 0.5 - c;
        let dy = y as f32 + 0.5 - c;
        let alpha = if dx * dx + dy * dy <= (c - 1.0) * (c - 1.0) { 255 } else { 0 };
        if ((x / 5) + (y / 5)) % 2 == 0 {
            Rgba([230, 20, 20, alpha])
        } else {
            Rgba([20, 20, 230, alpha])
        }
    })
}

fn noise(w: u32, h: u32, seed: u64) -> RgbImage {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    RgbImage::from_fn(w, h, |_, _| {
        Rgb([rng.random_range(0..=255), rng.random_range(0..=255), rng.random_range(0..=255)])
    })
}

/// Pastes the scaled template's opaque pixels at `(x0, y0)`.
fn paste(source: &mut RgbImage, template: &RgbaImage, size: u32, x0: u32, y0: u32) {
    let scaled = scaled_template(template, size);
    for (x, y, p) in scaled.rgb.enumerate_pixels() {
        if scaled.mask[((y * size + x) * 3) as usize] > 0.0 {
            source.put_pixel(x0 + x, y0 + y, *p);
        }
    }
}

#[test]
fn test_exact_copy_found_at_location() {
    let template = marker_template(20);
    let mut source = noise(120, 100, 1);
    paste(&mut source, &template, 20, 40, 30);

    let bboxes = detect(&source, &template, 20..21, 1, 0.999);
    assert!(!bboxes.is_empty());
    for b in &bboxes {
        assert_eq!((b.width(), b.height()), (20, 20));
        assert!((b.cx - 50.0).abs() <= 1.0 && (b.cy - 40.0).abs() <= 1.0, "{:?}", b);
    }
}

#[test]
fn test_multiscale_detection_finds_pasted_scale() {
    let template = marker_template(40);
    let mut source = noise(160, 120, 2);
    paste(&mut source, &template, 25, 70, 50);

    let detector = TemplateDetector::new(DetectorConfig {
        min_size: 10,
        max_size: 50,
        size_step: 5,
        threshold: 0.999,
    });
    let bboxes = detector.detect(&source, &template);
    let at_scale: Vec<_> = bboxes.iter().filter(|b| b.width() == 25).collect();
    assert!(!at_scale.is_empty());
    let centroid = Centroid::Median.aggregate(&bboxes).unwrap();
    assert!((centroid - DVec2::new(82.5, 62.5)).length() <= 1.0, "{:?}", centroid);
}

#[test]
fn test_perfect_match_scores_one() {
    let template = marker_template(16);
    let mut source = noise(40, 40, 3);
    paste(&mut source, &template, 16, 10, 12);
    let response = masked_ccorr_normed(&source, &scaled_template(&template, 16)).unwrap();
    assert_eq!(response.dimensions(), (25, 25));
    let best = response
        .enumerate_pixels()
        .max_by(|a, b| a.2.0[0].total_cmp(&b.2.0[0]))
        .unwrap();
    assert_eq!((best.0, best.1), (10, 12));
    assert!((best.2.0[0] - 1.0).abs() < 1e-4);
}

#[test]
fn test_empty_size_range() {
    let template = marker_template(20);
    let source = noise(60, 60, 4);
    assert!(detect(&source, &template, 30..30, 5, 0.5).is_empty());
    #[allow(clippy::reversed_empty_ranges)]
    let reversed = detect(&source, &template, 40..10, 5, 0.5);
    assert!(reversed.is_empty());
}

#[test]
fn test_template_larger_than_source() {
    let template = marker_template(20);
    let source = noise(15, 15, 5);
    assert!(masked_ccorr_normed(&source, &scaled_template(&template, 20)).is_none());
    assert!(detect(&source, &template, 16..30, 2, 0.0).is_empty());
}

#[test]
fn test_threshold_out_of_range_accepted() {
    let template = marker_template(10);
    let source = noise(20, 20, 6);
    // nothing reaches 1.5; everything reaches -1
    assert!(detect(&source, &template, 10..11, 1, 1.5).is_empty());
    assert_eq!(detect(&source, &template, 10..11, 1, -1.0).len(), 11 * 11);
}

#[test]
fn test_zero_step_does_not_hang() {
    let template = marker_template(10);
    let source = noise(20, 20, 7);
    assert_eq!(detect(&source, &template, 10..12, 0, -1.0).len(), 11 * 11 + 10 * 10);
}

#[test]
fn test_centroid_aggregation() {
    let bboxes = [
        BoundingBox::from_anchor(0, 0, 10, 10),
        BoundingBox::from_anchor(2, 0, 10, 10),
        BoundingBox::from_anchor(10, 4, 10, 10),
    ];
    assert_eq!(mean_centroid(&bboxes), Some(DVec2::new(9.0, 19.0 / 3.0)));
    assert_eq!(median_centroid(&bboxes), Some(DVec2::new(7.0, 5.0)));
    assert_eq!(median_centroid(&bboxes[..2]), Some(DVec2::new(6.0, 5.0)));
    assert_eq!(mean_centroid(&[]), None);
    assert_eq!(Centroid::default(), Centroid::Median);
}

#[test]
fn test_drawing_returns_new_images() {
    let frame = RgbImage::from_pixel(64, 48, Rgb([0, 0, 0]));
    let style = MarkerStyle::default();
    let marked = draw_marker(&frame, DVec2::new(32.0, 24.0), &style);
    assert_eq!(*marked.get_pixel(32, 24), Rgb(style.color));
    assert_eq!(*frame.get_pixel(32, 24), Rgb([0, 0, 0]));

    // off-image markers are clipped
    let clipped = draw_marker(&frame, DVec2::new(-100.0, -100.0), &style);
    assert_eq!(clipped, frame);

    let bboxes = [BoundingBox::from_anchor(5, 5, 10, 10)];
    let boxed = draw_bboxes(&frame, &bboxes, false);
    assert_ne!(*boxed.get_pixel(5, 5), Rgb([0, 0, 0]));
    assert_eq!(*frame.get_pixel(5, 5), Rgb([0, 0, 0]));

    assert_eq!(draw_centroid(&frame, &[], Centroid::Mean), frame);
    let mean = draw_centroid(&frame, &bboxes, Centroid::Mean);
    assert_ne!(mean, frame);
}
