use glam::DVec2;
use image::{DynamicImage, RgbImage};
use rerun::{RecordingStream, TimeCell};
use std::io::Cursor;

use crate::error::{Result, SyncError};

fn preview_err<E: std::fmt::Display>(e: E) -> SyncError {
    SyncError::Preview(e.to_string())
}

pub fn log_image_as_compressed(
    recording: &RecordingStream,
    topic: &str,
    img: &RgbImage,
    format: image::ImageFormat,
) -> Result<()> {
    let mut bytes: Vec<u8> = Vec::new();
    DynamicImage::ImageRgb8(img.clone()).write_to(&mut Cursor::new(&mut bytes), format)?;
    recording
        .log(
            format!("{}/image", topic),
            &rerun::Image::from_file_contents(bytes, None),
        )
        .map_err(preview_err)
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(points: &[DVec2]) -> Vec<(f32, f32)> {
    points
        .iter()
        .map(|p| (p.x as f32 + 0.5, p.y as f32 + 0.5))
        .collect()
}

/// Logs one video frame and the reprojected samples drawn on it, on the
/// `frame` sequence timeline.
pub fn log_preview_frame(
    recording: &RecordingStream,
    topic: &str,
    frame_idx: usize,
    frame: &RgbImage,
    points: &[DVec2],
    color: [u8; 3],
) -> Result<()> {
    recording.set_time("frame", TimeCell::from_sequence(frame_idx as i64));
    log_image_as_compressed(recording, topic, frame, image::ImageFormat::Jpeg)?;
    recording
        .log(
            format!("{}/positions", topic),
            &rerun::Points2D::new(rerun_shift(points))
                .with_colors([rerun::Color::from_rgb(color[0], color[1], color[2])])
                .with_radii([rerun::Radius::new_ui_points(5.0)]),
        )
        .map_err(preview_err)
}
