//! Built-in digit reader for burned-in frame counters.
//!
//! The crop is split into glyphs by ink columns, each glyph is sampled onto a
//! 5x7 grid and compared cell by cell against a fixed digit font. Anything
//! that does not match a digit closely enough is reported as `?`.

use image::{GrayImage, Luma};
use std::sync::OnceLock;

use super::{TextRecognizer, TextSpan};
use crate::error::Result;

pub const GLYPH_W: u32 = 5;
pub const GLYPH_H: u32 = 7;
const CELLS: usize = (GLYPH_W * GLYPH_H) as usize;

/// 5x7 digit font, one byte per row, most significant of the low five bits is
/// the leftmost column.
const DIGIT_FONT: [[u8; 7]; 10] = [
    [0b01110, 0b10001, 0b10011, 0b10101, 0b11001, 0b10001, 0b01110],
    [0b00100, 0b01100, 0b00100, 0b00100, 0b00100, 0b00100, 0b01110],
    [0b01110, 0b10001, 0b00001, 0b00010, 0b00100, 0b01000, 0b11111],
    [0b11111, 0b00010, 0b00100, 0b00010, 0b00001, 0b10001, 0b01110],
    [0b00010, 0b00110, 0b01010, 0b10010, 0b11111, 0b00010, 0b00010],
    [0b11111, 0b10000, 0b11110, 0b00001, 0b00001, 0b10001, 0b01110],
    [0b00110, 0b01000, 0b10000, 0b11110, 0b10001, 0b10001, 0b01110],
    [0b11111, 0b00001, 0b00010, 0b00100, 0b01000, 0b01000, 0b01000],
    [0b01110, 0b10001, 0b10001, 0b01110, 0b10001, 0b10001, 0b01110],
    [0b01110, 0b10001, 0b10001, 0b01111, 0b00001, 0b00010, 0b01100],
];

fn font_bit(digit: usize, col: u32, row: u32) -> bool {
    (DIGIT_FONT[digit][row as usize] >> (GLYPH_W - 1 - col)) & 1 == 1
}

struct DigitTemplate {
    digit: u8,
    aspect: f32,
    cells: [bool; CELLS],
}

static TEMPLATES: OnceLock<Vec<DigitTemplate>> = OnceLock::new();

fn templates() -> &'static Vec<DigitTemplate> {
    TEMPLATES.get_or_init(|| {
        (0..10)
            .map(|d| {
                let cols: Vec<u32> = (0..GLYPH_W)
                    .filter(|c| (0..GLYPH_H).any(|r| font_bit(d, *c, r)))
                    .collect();
                let x0 = cols.first().copied().unwrap_or(0);
                let w = cols.last().map_or(GLYPH_W, |x1| x1 - x0 + 1);
                let cells = sample_cells(w, GLYPH_H, |x, y| font_bit(d, x0 + x, y));
                DigitTemplate {
                    digit: d as u8,
                    aspect: w as f32 / GLYPH_H as f32,
                    cells,
                }
            })
            .collect()
    })
}

/// Nearest-cell sampling of a `w` x `h` glyph onto the 5x7 grid.
fn sample_cells(w: u32, h: u32, ink: impl Fn(u32, u32) -> bool) -> [bool; CELLS] {
    let mut cells = [false; CELLS];
    for gy in 0..GLYPH_H {
        for gx in 0..GLYPH_W {
            let x = ((2 * gx + 1) * w) / (2 * GLYPH_W);
            let y = ((2 * gy + 1) * h) / (2 * GLYPH_H);
            cells[(gy * GLYPH_W + gx) as usize] = ink(x.min(w - 1), y.min(h - 1));
        }
    }
    cells
}

/// Digit recogniser backed by the built-in 5x7 font. It reads counters drawn
/// by [`render_digits`] and nothing else.
#[derive(Debug, Clone)]
pub struct GlyphRecognizer {
    /// Largest number of differing grid cells still accepted as a digit.
    pub max_mismatch: usize,
    /// Relative aspect-ratio difference beyond which a digit is not considered.
    pub max_aspect_diff: f32,
    /// A horizontal gap wider than this fraction of the line height starts a new span.
    pub span_gap_ratio: f32,
}

impl Default for GlyphRecognizer {
    fn default() -> Self {
        Self {
            max_mismatch: 5,
            max_aspect_diff: 0.35,
            span_gap_ratio: 0.5,
        }
    }
}

struct Segment {
    x0: u32,
    x1: u32,
    y0: u32,
    y1: u32,
}

impl Segment {
    fn width(&self) -> u32 {
        self.x1 - self.x0 + 1
    }
    fn height(&self) -> u32 {
        self.y1 - self.y0 + 1
    }
}

impl GlyphRecognizer {
    fn segments(&self, binary: &GrayImage, fg: u8) -> Vec<Segment> {
        let (w, h) = binary.dimensions();
        let ink = |x: u32, y: u32| binary.get_pixel(x, y).0[0] == fg;
        let mut segments = Vec::new();
        let mut start: Option<u32> = None;
        for x in 0..=w {
            let has_ink = x < w && (0..h).any(|y| ink(x, y));
            match (has_ink, start) {
                (true, None) => start = Some(x),
                (false, Some(x0)) => {
                    let x1 = x - 1;
                    let rows: Vec<u32> = (0..h)
                        .filter(|y| (x0..=x1).any(|xx| ink(xx, *y)))
                        .collect();
                    if let (Some(y0), Some(y1)) = (rows.first(), rows.last()) {
                        segments.push(Segment {
                            x0,
                            x1,
                            y0: *y0,
                            y1: *y1,
                        });
                    }
                    start = None;
                }
                _ => {}
            }
        }
        segments
    }

    fn classify(&self, binary: &GrayImage, fg: u8, seg: &Segment, line_height: u32) -> (char, f32) {
        if seg.height() * 2 < line_height {
            return ('?', 0.0);
        }
        let cells = sample_cells(seg.width(), seg.height(), |x, y| {
            binary.get_pixel(seg.x0 + x, seg.y0 + y).0[0] == fg
        });
        let aspect = seg.width() as f32 / seg.height() as f32;
        let best = templates()
            .iter()
            .filter(|t| (aspect - t.aspect).abs() / t.aspect <= self.max_aspect_diff)
            .map(|t| {
                let mismatch = t.cells.iter().zip(cells.iter()).filter(|(a, b)| a != b).count();
                (t.digit, mismatch)
            })
            .min_by_key(|(_, mismatch)| *mismatch);
        match best {
            Some((digit, mismatch)) if mismatch <= self.max_mismatch => (
                char::from(b'0' + digit),
                1.0 - mismatch as f32 / CELLS as f32,
            ),
            _ => ('?', 0.0),
        }
    }
}

impl TextRecognizer for GlyphRecognizer {
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<TextSpan>> {
        let total = binary.width() as usize * binary.height() as usize;
        if total == 0 {
            return Ok(Vec::new());
        }
        let white = binary.pixels().filter(|p| p.0[0] > 0).count();
        if white == 0 || white == total {
            return Ok(Vec::new());
        }
        // text is whichever colour covers less of the crop
        let fg = if white * 2 <= total { 255 } else { 0 };
        let binary = &GrayImage::from_fn(binary.width(), binary.height(), |x, y| {
            Luma([if binary.get_pixel(x, y).0[0] > 0 { 255 } else { 0 }])
        });

        let segments = self.segments(binary, fg);
        let line_height = segments.iter().map(Segment::height).max().unwrap_or(0);
        let max_gap = (line_height as f32 * self.span_gap_ratio) as u32;

        let mut spans: Vec<TextSpan> = Vec::new();
        let mut confidences: Vec<Vec<f32>> = Vec::new();
        let mut prev_x1: Option<u32> = None;
        for seg in &segments {
            let (ch, conf) = self.classify(binary, fg, seg, line_height);
            let new_span = match prev_x1 {
                Some(x1) => seg.x0 - x1 - 1 > max_gap,
                None => true,
            };
            if new_span {
                spans.push(TextSpan {
                    text: String::new(),
                    confidence: 0.0,
                    x: seg.x0,
                });
                confidences.push(Vec::new());
            }
            if let (Some(span), Some(c)) = (spans.last_mut(), confidences.last_mut()) {
                span.text.push(ch);
                c.push(conf);
            }
            prev_x1 = Some(seg.x1);
        }
        for (span, c) in spans.iter_mut().zip(confidences) {
            span.confidence = c.iter().sum::<f32>() / c.len().max(1) as f32;
        }
        Ok(spans)
    }
}

/// Renders digits with the built-in font, white on black, one blank font
/// column between glyphs and a one-cell border. Non-digit characters leave a
/// blank glyph-sized gap.
pub fn render_digits(text: &str, scale: u32) -> GrayImage {
    let scale = scale.max(1);
    let n = text.chars().count() as u32;
    let width = (n * (GLYPH_W + 1) + 1) * scale;
    let height = (GLYPH_H + 2) * scale;
    let mut img = GrayImage::new(width.max(scale), height);
    for (i, ch) in text.chars().enumerate() {
        let Some(d) = ch.to_digit(10) else {
            continue;
        };
        let ox = (1 + i as u32 * (GLYPH_W + 1)) * scale;
        for row in 0..GLYPH_H {
            for col in 0..GLYPH_W {
                if !font_bit(d as usize, col, row) {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        img.put_pixel(ox + col * scale + dx, (row + 1) * scale + dy, Luma([255]));
                    }
                }
            }
        }
    }
    img
}
