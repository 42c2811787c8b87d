use image::RgbImage;
use log::{info, warn};
use opencv::{
    core::{self, Mat, Size},
    prelude::*,
    videoio::{self, VideoCapture, VideoWriter},
};
use std::path::Path;

use super::codec::{CodecChoice, fourcc_from_code};
use super::{FrameSink, FrameSource, VideoInfo};
use crate::error::{Result, SyncError};

fn path_str(path: &Path) -> Result<&str> {
    path.to_str().ok_or_else(|| {
        SyncError::Precondition(format!("video path '{}' is not valid UTF-8", path.display()))
    })
}

/// Copies a BGR `CV_8UC3` matrix into an RGB image.
fn mat_to_rgb(mat: &Mat) -> Result<RgbImage> {
    if mat.typ() != core::CV_8UC3 {
        return Err(SyncError::FrameRead(format!("unsupported frame type {}", mat.typ())));
    }
    let (width, height) = (mat.cols() as u32, mat.rows() as u32);
    let continuous;
    let mat = if mat.is_continuous() {
        mat
    } else {
        continuous = mat.try_clone()?;
        &continuous
    };
    let mut data = mat.data_bytes()?.to_vec();
    for px in data.chunks_exact_mut(3) {
        px.swap(0, 2);
    }
    RgbImage::from_raw(width, height, data)
        .ok_or_else(|| SyncError::FrameRead("short frame buffer".to_string()))
}

/// Encoded video file decoded through `opencv::videoio`.
pub struct VideoFileSource {
    cap: VideoCapture,
    info: VideoInfo,
}

impl VideoFileSource {
    pub fn open(path: &Path) -> Result<VideoFileSource> {
        let unopenable = || SyncError::Precondition(format!("could not open video '{}'", path.display()));
        let cap = VideoCapture::from_file(path_str(path)?, videoio::CAP_ANY).map_err(|_| unopenable())?;
        if !cap.is_opened()? {
            return Err(unopenable());
        }
        let fps = cap.get(videoio::CAP_PROP_FPS)?;
        let width = cap.get(videoio::CAP_PROP_FRAME_WIDTH)? as u32;
        let height = cap.get(videoio::CAP_PROP_FRAME_HEIGHT)? as u32;
        let fourcc = cap.get(videoio::CAP_PROP_FOURCC)? as u32;
        let frame_count = cap.get(videoio::CAP_PROP_FRAME_COUNT)?;
        let info = VideoInfo {
            width,
            height,
            fps,
            codec_tag: Some(fourcc_from_code(fourcc)),
            frame_count: (frame_count > 0.0).then_some(frame_count as u64),
        };
        info!(
            "opened {} ({}x{} @ {:.3} fps)",
            path.display(),
            info.width,
            info.height,
            info.fps
        );
        Ok(VideoFileSource { cap, info })
    }
}

impl FrameSource for VideoFileSource {
    fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn read_frame(&mut self) -> Result<Option<RgbImage>> {
        let mut mat = Mat::default();
        let grabbed = self
            .cap
            .read(&mut mat)
            .map_err(|e| SyncError::FrameRead(e.to_string()))?;
        if !grabbed || mat.empty() {
            return Ok(None);
        }
        mat_to_rgb(&mat).map(Some)
    }
}

/// Encoded video file written through `opencv::videoio`.
pub struct VideoFileSink {
    writer: VideoWriter,
    frame: Mat,
    width: u32,
    height: u32,
    finished: bool,
}

impl VideoFileSink {
    pub fn create(path: &Path, info: &VideoInfo, codec: &CodecChoice) -> Result<VideoFileSink> {
        let fps = if info.fps > 0.0 { info.fps } else { 30.0 };
        let [a, b, c, d] = codec.fourcc_chars();
        let fourcc = VideoWriter::fourcc(a, b, c, d)?;
        let size = Size::new(info.width as i32, info.height as i32);
        let writer = VideoWriter::new(path_str(path)?, fourcc, fps, size, true)?;
        if !writer.is_opened()? {
            return Err(SyncError::Video(format!(
                "could not open '{}' for writing with {}",
                path.display(),
                codec.fourcc
            )));
        }
        let frame = Mat::new_rows_cols_with_default(size.height, size.width, core::CV_8UC3, core::Scalar::all(0.0))?;
        info!("writing {} with {}", path.display(), codec.fourcc);
        Ok(VideoFileSink {
            writer,
            frame,
            width: info.width,
            height: info.height,
            finished: false,
        })
    }
}

impl FrameSink for VideoFileSink {
    fn write_frame(&mut self, frame: &RgbImage) -> Result<()> {
        if self.finished {
            return Err(SyncError::Video("writer already finished".to_string()));
        }
        if frame.dimensions() != (self.width, self.height) {
            return Err(SyncError::Video(format!(
                "frame is {}x{}, writer expects {}x{}",
                frame.width(),
                frame.height(),
                self.width,
                self.height
            )));
        }
        let dst = self.frame.data_bytes_mut()?;
        for (d, s) in dst.chunks_exact_mut(3).zip(frame.as_raw().chunks_exact(3)) {
            d[0] = s[2];
            d[1] = s[1];
            d[2] = s[0];
        }
        self.writer.write(&self.frame)?;
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.finished = true;
        self.writer.release()?;
        Ok(())
    }
}

impl Drop for VideoFileSink {
    fn drop(&mut self) {
        if let Err(e) = self.finish() {
            warn!("closing video writer: {}", e);
        }
    }
}
