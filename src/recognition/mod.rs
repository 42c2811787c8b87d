pub mod glyph;
pub mod tesseract;

pub use glyph::GlyphRecognizer;
pub use tesseract::TesseractRecognizer;

use image::GrayImage;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One run of recognised characters, left to right.
#[derive(Debug, Clone, PartialEq)]
pub struct TextSpan {
    pub text: String,
    pub confidence: f32,
    pub x: u32,
}

/// Optical text recognition over a binarised crop.
///
/// Spans are returned in reading order; callers that want a single value take
/// the first one.
pub trait TextRecognizer {
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<TextSpan>>;
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for &T {
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<TextSpan>> {
        (**self).recognize(binary)
    }
}

impl<T: TextRecognizer + ?Sized> TextRecognizer for Box<T> {
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<TextSpan>> {
        (**self).recognize(binary)
    }
}

/// Recognition engine used to read frame counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecognizerBackend {
    /// The `tesseract` executable, for counters rendered in arbitrary fonts.
    #[default]
    Tesseract,
    /// Built-in reader for the bitmap font of [`glyph::render_digits`].
    Glyph,
}

impl RecognizerBackend {
    pub fn create(self) -> Result<Box<dyn TextRecognizer>> {
        match self {
            RecognizerBackend::Tesseract => Ok(Box::new(TesseractRecognizer::new("tesseract", true)?)),
            RecognizerBackend::Glyph => {
                warn!("glyph recognizer only reads counters drawn with the built-in 5x7 font");
                Ok(Box::new(GlyphRecognizer::default()))
            }
        }
    }
}
