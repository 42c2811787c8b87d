use glob::glob;
use image::RgbImage;
use log::info;
use std::path::{Path, PathBuf};

use super::{FrameSink, FrameSource, VideoInfo};
use crate::error::{Result, SyncError};

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// A directory of PNG/JPG frames played back in file-name order.
pub struct ImageSequenceSource {
    paths: Vec<PathBuf>,
    next: usize,
    info: VideoInfo,
}

impl ImageSequenceSource {
    pub fn open(dir: &Path, fps: f64) -> Result<ImageSequenceSource> {
        let pattern = format!("{}/*", dir.display());
        let mut paths: Vec<PathBuf> = glob(&pattern)?.filter_map(img_filter).collect();
        paths.sort();
        let first = paths.first().ok_or_else(|| {
            SyncError::Precondition(format!("no frames found in '{}'", dir.display()))
        })?;
        let (width, height) = image::image_dimensions(first).map_err(|e| {
            SyncError::Precondition(format!("could not open video '{}': {}", dir.display(), e))
        })?;
        info!("opened {} frames from {}", paths.len(), dir.display());
        Ok(ImageSequenceSource {
            info: VideoInfo {
                width,
                height,
                fps,
                codec_tag: None,
                frame_count: Some(paths.len() as u64),
            },
            paths,
            next: 0,
        })
    }
}

impl FrameSource for ImageSequenceSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let Some(path) = self.paths.get(self.next) else {
            return Ok(None);
        };
        self.next += 1;
        let img = image::open(path).map_err(|e| SyncError::FrameRead(format!("{}: {}", path.display(), e)))?;
        Ok(Some(img.to_rgb8()))
    }
}

/// Writes frames as `000000.png`, `000001.png`, ... into a fresh directory.
pub struct ImageSequenceSink {
    dir: PathBuf,
    width: u32,
    height: u32,
    written: usize,
}

impl ImageSequenceSink {
    pub fn create(dir: &Path, info: &VideoInfo) -> Result<ImageSequenceSink> {
        std::fs::create_dir_all(dir)?;
        Ok(ImageSequenceSink {
            dir: dir.to_path_buf(),
            width: info.width,
            height: info.height,
            written: 0,
        })
    }

    pub fn written(&self) -> usize {
        self.written
    }
}

impl FrameSink for ImageSequenceSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if frame.dimensions() != (self.width, self.height) {
            return Err(SyncError::Video(format!(
                "frame is {}x{}, writer expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        frame.save(self.dir.join(format!("{:06}.png", self.written)))?;
        self.written += 1;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        Ok(())
    }
}
