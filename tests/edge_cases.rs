use glam::DVec2;
use image::{GrayImage, Rgb, RgbImage, RgbaImage};
use vr_video_sync::frame_index::read_frame_index;
use vr_video_sync::positions::{PositionColumns, PositionLog};
use vr_video_sync::recognition::{GlyphRecognizer, TextRecognizer};
use vr_video_sync::template::{detect, median_centroid};
use vr_video_sync::transform::{CoordinateTransform, LandmarkSet};
use vr_video_sync::types::CropRegion;

#[test]
fn test_single_landmark_minimum_norm() {
    // underdetermined, still maps the one landmark exactly
    let set = LandmarkSet::new(vec![DVec2::new(2.0, 1.0)], vec![DVec2::new(10.0, -4.0)]);
    let t = CoordinateTransform::fit(&set).unwrap();
    let p = t.apply_point(DVec2::new(2.0, 1.0));
    assert!((p - DVec2::new(10.0, -4.0)).length() < 1e-9);
}

#[test]
fn test_fully_transparent_template() {
    let template = RgbaImage::new(8, 8);
    let source = RgbImage::from_pixel(20, 20, Rgb([200, 10, 10]));
    // zero mask energy scores zero everywhere
    assert!(detect(&source, &template, 8..9, 1, 0.5).is_empty());
}

#[test]
fn test_empty_crop_reads_nothing() {
    let frame = RgbImage::from_pixel(20, 20, Rgb([255, 255, 255]));
    let crop = CropRegion::from_corners((5, 5), (5, 5));
    let reading = read_frame_index(&frame, &crop, 125, &GlyphRecognizer::default());
    assert!(!reading.is_valid);
}

#[test]
fn test_glyph_recognizer_empty_image() {
    let spans = GlyphRecognizer::default().recognize(&GrayImage::new(0, 0)).unwrap();
    assert!(spans.is_empty());
}

#[test]
fn test_empty_position_log() {
    let log = PositionLog::from_reader(
        "frame,left_screen_pos_x,left_screen_pos_y\n".as_bytes(),
        &PositionColumns::default(),
    )
    .unwrap();
    assert!(log.is_empty());
    assert_eq!(log.samples_at(0).count(), 0);
}

#[test]
fn test_median_centroid_single_box() {
    let b = vr_video_sync::types::BoundingBox::from_anchor(3, 4, 10, 10);
    assert_eq!(median_centroid(&[b]), Some(DVec2::new(8.0, 9.0)));
}
