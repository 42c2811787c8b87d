use image::{GrayImage, Luma, RgbImage};
use log::{debug, trace};

use crate::recognition::TextRecognizer;
use crate::types::CropRegion;

/// Outcome of reading the burned-in counter from one frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameIndexReading {
    pub raw_text: String,
    pub parsed_value: Option<i64>,
    pub is_valid: bool,
}

impl FrameIndexReading {
    pub fn from_text(raw_text: &str) -> FrameIndexReading {
        let parsed_value = parse_frame_index(raw_text);
        FrameIndexReading {
            raw_text: raw_text.to_string(),
            parsed_value,
            is_valid: parsed_value.is_some(),
        }
    }
    pub fn unreadable() -> FrameIndexReading {
        FrameIndexReading {
            raw_text: String::new(),
            parsed_value: None,
            is_valid: false,
        }
    }
}

/// Base-10 integer with optional sign and surrounding whitespace.
/// Single underscores between digits are accepted as group separators.
pub fn parse_frame_index(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, digits) = match trimmed.strip_prefix('-') {
        Some(rest) => (-1, rest),
        None => (1, trimmed.strip_prefix('+').unwrap_or(trimmed)),
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
        || !digits.chars().all(|c| c.is_ascii_digit() || c == '_')
    {
        return None;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    cleaned.parse::<i64>().ok().map(|v| sign * v)
}

/// Copies the region out of the frame; the region is clipped to the frame.
pub fn crop_frame(frame: &RgbImage, crop: &CropRegion) -> RgbImage {
    let c = crop.clamp_to(frame.width(), frame.height());
    image::imageops::crop_imm(frame, c.x1, c.y1, c.width(), c.height()).to_image()
}

/// BT.601 luma with the same fixed-point rounding as common video tooling.
pub fn to_grayscale(rgb: &RgbImage) -> GrayImage {
    GrayImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let [r, g, b] = rgb.get_pixel(x, y).0;
        let v = (r as u32 * 4899 + g as u32 * 9617 + b as u32 * 1868 + 8192) >> 14;
        Luma([v.min(255) as u8])
    })
}

/// Pixels at or above `threshold` become white, the rest black.
pub fn binarize(gray: &GrayImage, threshold: u8) -> GrayImage {
    GrayImage::from_fn(gray.width(), gray.height(), |x, y| {
        if gray.get_pixel(x, y).0[0] >= threshold {
            Luma([255])
        } else {
            Luma([0])
        }
    })
}

/// Crop, grayscale, threshold, recognise, then validate the first span.
///
/// Never fails: recogniser errors and non-numeric text both produce an
/// invalid reading.
pub fn read_frame_index<R: TextRecognizer + ?Sized>(
    frame: &RgbImage,
    crop: &CropRegion,
    threshold: u8,
    recognizer: &R,
) -> FrameIndexReading {
    let binary = binarize(&to_grayscale(&crop_frame(frame, crop)), threshold);
    match recognizer.recognize(&binary) {
        Ok(spans) => match spans.first() {
            Some(span) => {
                let reading = FrameIndexReading::from_text(&span.text);
                trace!("read '{}' -> {:?}", span.text, reading.parsed_value);
                reading
            }
            None => FrameIndexReading::unreadable(),
        },
        Err(e) => {
            debug!("recognition failed: {}", e);
            FrameIndexReading::unreadable()
        }
    }
}

/// Reads frame counters from a fixed crop with a fixed recogniser.
pub struct FrameIndexReader<R: TextRecognizer> {
    pub recognizer: R,
    pub crop: CropRegion,
    pub threshold: u8,
}

impl<R: TextRecognizer> FrameIndexReader<R> {
    pub fn new(recognizer: R, crop: CropRegion, threshold: u8) -> FrameIndexReader<R> {
        FrameIndexReader {
            recognizer,
            crop,
            threshold,
        }
    }
    pub fn read(&self, frame: &RgbImage) -> FrameIndexReading {
        read_frame_index(frame, &self.crop, self.threshold, &self.recognizer)
    }
}
