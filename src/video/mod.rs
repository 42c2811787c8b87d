pub mod capture;
pub mod codec;
pub mod sequence;

pub use codec::*;
pub use capture::{VideoFileSink, VideoFileSource};
pub use sequence::{ImageSequenceSink, ImageSequenceSource};

use image::RgbImage;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};

/// Stream properties queried once when a source is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec_tag: Option<String>,
    pub frame_count: Option<u64>,
}

/// Sequential, forward-only frame reader.
pub trait FrameSource {
    fn info(&self) -> &VideoInfo;
    /// `Ok(None)` at end of stream.
    fn read_frame(&mut self) -> Result<Option<RgbImage>>;
}

/// Frame writer with the dimensions and rate of its source.
pub trait FrameSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()>;
    /// Flushes and closes the output. Idempotent.
    fn finish(&mut self) -> Result<()>;
}

impl<T: FrameSource + ?Sized> FrameSource for Box<T> {
    fn info(&self) -> &VideoInfo {
        (**self).info()
    }
    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        (**self).read_frame()
    }
}

impl<T: FrameSink + ?Sized> FrameSink for Box<T> {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        (**self).write_frame(frame)
    }
    fn finish(&mut self) -> Result<()> {
        (**self).finish()
    }
}

/// Directories are read as image sequences, files through `opencv::videoio`.
pub fn open_source(path: &Path, fallback_fps: f64) -> Result<Box<dyn FrameSource>> {
    if !path.exists() {
        return Err(SyncError::NotFound(path.to_path_buf()));
    }
    if path.is_dir() {
        Ok(Box::new(ImageSequenceSource::open(path, fallback_fps)?))
    } else {
        Ok(Box::new(VideoFileSource::open(path)?))
    }
}

/// Opens an output matching `info` inside `out_dir`, named after `source`.
///
/// Image-sequence sources produce an image-sequence directory; encoded videos
/// keep their base name and take the container extension of the resolved codec.
pub fn open_sink(
    source: &Path,
    info: &VideoInfo,
    out_dir: &Path,
) -> Result<(PathBuf, Box<dyn FrameSink>)> {
    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "output".to_string());
    if source.is_dir() {
        let dir = out_dir.join(&stem);
        let sink: Box<dyn FrameSink> = Box::new(ImageSequenceSink::create(&dir, info)?);
        Ok((dir, sink))
    } else {
        let choice = codec_for_tag(info.codec_tag.as_deref());
        let path = out_dir.join(format!("{}{}", stem, choice.extension));
        let sink: Box<dyn FrameSink> = Box::new(VideoFileSink::create(&path, info, &choice)?);
        Ok((path, sink))
    }
}
