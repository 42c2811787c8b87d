use image::{DynamicImage, GrayImage, ImageFormat};
use log::{debug, info};
use std::io::{Cursor, Write};
use std::process::{Command, Stdio};

use super::{TextRecognizer, TextSpan};
use crate::error::{Result, SyncError};

/// Recognition through the `tesseract` command-line tool in single-line mode.
#[derive(Debug, Clone)]
pub struct TesseractRecognizer {
    pub binary: String,
    pub digits_only: bool,
}

impl TesseractRecognizer {
    /// Checks that the executable runs before any frame is processed.
    pub fn new(binary: &str, digits_only: bool) -> Result<TesseractRecognizer> {
        let output = Command::new(binary)
            .arg("--version")
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| SyncError::Precondition(format!("cannot run '{}': {}", binary, e)))?;
        let version = String::from_utf8_lossy(&output.stdout);
        info!("using {}", version.lines().next().unwrap_or(binary));
        Ok(TesseractRecognizer {
            binary: binary.to_string(),
            digits_only,
        })
    }
}

impl TextRecognizer for TesseractRecognizer {
    fn recognize(&self, binary: &GrayImage) -> Result<Vec<TextSpan>> {
        if binary.width() == 0 || binary.height() == 0 {
            return Ok(Vec::new());
        }
        let mut bytes: Vec<u8> = Vec::new();
        DynamicImage::ImageLuma8(binary.clone()).write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;

        let mut cmd = Command::new(&self.binary);
        cmd.args(["stdin", "stdout", "--psm", "7"]);
        if self.digits_only {
            cmd.args(["-c", "tessedit_char_whitelist=0123456789"]);
        }
        let mut child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&bytes)?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            return Err(SyncError::Recognition(format!(
                "{} exited with {}",
                self.binary, output.status
            )));
        }
        let text = String::from_utf8_lossy(&output.stdout);
        debug!("tesseract read '{}'", text.trim());
        Ok(text
            .split_whitespace()
            .map(|word| TextSpan {
                text: word.to_string(),
                confidence: 1.0,
                x: 0,
            })
            .collect())
    }
}
