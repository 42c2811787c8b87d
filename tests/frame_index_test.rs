use image::{DynamicImage, GrayImage, Luma, Rgb, RgbImage};
use vr_video_sync::SyncError;
use vr_video_sync::frame_index::{
    FrameIndexReader, FrameIndexReading, binarize, parse_frame_index, read_frame_index,
    to_grayscale,
};
use vr_video_sync::recognition::glyph::render_digits;
use vr_video_sync::recognition::{GlyphRecognizer, RecognizerBackend, TextRecognizer, TextSpan};
use vr_video_sync::types::CropRegion;

/// A 200x120 frame with `text` burned in at (20, 10) and noise elsewhere.
fn frame_with_counter(text: &str, scale: u32) -> (RgbImage, CropRegion) {
    let mut frame = RgbImage::from_fn(200, 120, |x, y| {
        if (x + y) % 7 == 0 { Rgb([250, 250, 250]) } else { Rgb([40, 60, 50]) }
    });
    let counter = DynamicImage::ImageLuma8(render_digits(text, scale)).to_rgb8();
    image::imageops::replace(&mut frame, &counter, 20, 10);
    let crop = CropRegion::from_corners((20, 10), (20 + counter.width(), 10 + counter.height()));
    (frame, crop)
}

#[test]
fn test_clean_digits_read() {
    let (frame, crop) = frame_with_counter("42", 4);
    let reading = read_frame_index(&frame, &crop, 125, &GlyphRecognizer::default());
    assert_eq!(reading.raw_text, "42");
    assert!(reading.is_valid);
    assert_eq!(reading.parsed_value, Some(42));
}

#[test]
fn test_all_digits_and_scales() {
    let recognizer = GlyphRecognizer::default();
    for scale in [1, 2, 3, 5] {
        let (frame, crop) = frame_with_counter("1234567890", scale);
        let reading = read_frame_index(&frame, &crop, 125, &recognizer);
        assert_eq!(reading.parsed_value, Some(1234567890), "scale {}", scale);
    }
}

#[test]
fn test_inverted_polarity_read() {
    // dark digits on a light crop
    let digits = render_digits("907", 3);
    let inverted = GrayImage::from_fn(digits.width(), digits.height(), |x, y| {
        Luma([255 - digits.get_pixel(x, y).0[0]])
    });
    let spans = GlyphRecognizer::default().recognize(&inverted).unwrap();
    assert_eq!(spans.len(), 1);
    assert_eq!(spans[0].text, "907");
}

#[test]
fn test_non_numeric_symbols_invalid() {
    // filled squares and a thin bar look like no digit
    let mut frame = RgbImage::from_pixel(80, 40, Rgb([0, 0, 0]));
    for (x0, w) in [(4u32, 14u32), (24, 14), (44, 2)] {
        for y in 8..22 {
            for x in x0..x0 + w {
                frame.put_pixel(x, y, Rgb([255, 255, 255]));
            }
        }
    }
    let crop = CropRegion::from_corners((0, 0), (80, 40));
    let reading = read_frame_index(&frame, &crop, 125, &GlyphRecognizer::default());
    assert!(!reading.is_valid);
    assert_eq!(reading.parsed_value, None);
    assert!(reading.raw_text.contains('?'));
}

#[test]
fn test_blank_crop_unreadable() {
    let frame = RgbImage::from_pixel(50, 50, Rgb([10, 10, 10]));
    let crop = CropRegion::from_corners((5, 5), (45, 45));
    let reading = read_frame_index(&frame, &crop, 125, &GlyphRecognizer::default());
    assert_eq!(reading, FrameIndexReading::unreadable());
}

#[test]
fn test_source_frame_not_mutated() {
    let (frame, crop) = frame_with_counter("7", 3);
    let before = frame.clone();
    let reader = FrameIndexReader::new(GlyphRecognizer::default(), crop, 125);
    assert_eq!(reader.read(&frame).parsed_value, Some(7));
    assert_eq!(frame, before);
}

struct Failing;

impl TextRecognizer for Failing {
    fn recognize(&self, _binary: &GrayImage) -> vr_video_sync::Result<Vec<TextSpan>> {
        Err(SyncError::Recognition("backend unavailable".to_string()))
    }
}

struct Fixed(Vec<&'static str>);

impl TextRecognizer for Fixed {
    fn recognize(&self, _binary: &GrayImage) -> vr_video_sync::Result<Vec<TextSpan>> {
        Ok(self
            .0
            .iter()
            .map(|t| TextSpan {
                text: t.to_string(),
                confidence: 1.0,
                x: 0,
            })
            .collect())
    }
}

#[test]
fn test_recognizer_error_is_invalid_reading() {
    let frame = RgbImage::new(10, 10);
    let crop = CropRegion::from_corners((0, 0), (10, 10));
    let reading = read_frame_index(&frame, &crop, 125, &Failing);
    assert!(!reading.is_valid);
    assert_eq!(reading.parsed_value, None);
}

#[test]
fn test_only_first_span_is_used() {
    let frame = RgbImage::new(10, 10);
    let crop = CropRegion::from_corners((0, 0), (10, 10));
    assert_eq!(read_frame_index(&frame, &crop, 125, &Fixed(vec!["12", "34"])).parsed_value, Some(12));
    assert!(!read_frame_index(&frame, &crop, 125, &Fixed(vec!["x1", "34"])).is_valid);
}

#[test]
fn test_parse_frame_index() {
    assert_eq!(parse_frame_index("42"), Some(42));
    assert_eq!(parse_frame_index(" 17\n"), Some(17));
    assert_eq!(parse_frame_index("-3"), Some(-3));
    assert_eq!(parse_frame_index("+8"), Some(8));
    assert_eq!(parse_frame_index("1_000"), Some(1000));
    assert_eq!(parse_frame_index("007"), Some(7));
    for bad in ["", "4 2", "4.2", "0x10", "_1", "1__0", "1_", "l2", "--1", "-"] {
        assert_eq!(parse_frame_index(bad), None, "{:?}", bad);
    }
}

#[test]
fn test_binarize_threshold_inclusive() {
    let gray = GrayImage::from_raw(3, 1, vec![124, 125, 126]).unwrap();
    assert_eq!(binarize(&gray, 125).into_raw(), vec![0, 255, 255]);
}

#[test]
fn test_grayscale_weights() {
    let rgb = RgbImage::from_raw(4, 1, vec![255, 255, 255, 255, 0, 0, 0, 255, 0, 0, 0, 255]).unwrap();
    assert_eq!(to_grayscale(&rgb).into_raw(), vec![255, 76, 150, 29]);
}

#[test]
fn test_crop_outside_frame_clamped() {
    let (frame, _) = frame_with_counter("5", 2);
    let crop = CropRegion::from_corners((190, 110), (400, 400));
    let reading = read_frame_index(&frame, &crop, 125, &GlyphRecognizer::default());
    assert!(!reading.is_valid);
}

#[test]
fn test_recognizer_backend_defaults_to_tesseract() {
    assert_eq!(RecognizerBackend::default(), RecognizerBackend::Tesseract);
    let backend: RecognizerBackend = serde_json::from_str("\"glyph\"").unwrap();
    assert_eq!(backend, RecognizerBackend::Glyph);
    assert_eq!(serde_json::to_string(&RecognizerBackend::Tesseract).unwrap(), "\"tesseract\"");
}

#[test]
fn test_glyph_backend_is_opt_in() {
    let (frame, crop) = frame_with_counter("4711", 3);
    let recognizer = RecognizerBackend::Glyph.create().unwrap();
    let reading = read_frame_index(&frame, &crop, 125, &recognizer);
    assert_eq!(reading.parsed_value, Some(4711));
}
