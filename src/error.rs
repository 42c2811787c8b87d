use std::path::PathBuf;

/// Errors surfaced by calibration, table loading and the synchronisation run.
///
/// Per-frame recognition misses are not errors; they are carried by
/// [`crate::frame_index::FrameIndexReading`] and skipped by the pipeline.
#[derive(thiserror::Error, Debug)]
pub enum SyncError {
    #[error("precondition failed: {0}")]
    Precondition(String),
    #[error("insufficient landmarks to fit a transform (vr={vr}, image={image})")]
    InsufficientData { vr: usize, image: usize },
    #[error("coordinate transform has not been fitted")]
    TransformNotFitted,
    #[error("could not read a frame from the video source: {0}")]
    FrameRead(String),
    #[error("point must have 2 or 3 components, got {0}")]
    InvalidPoint(usize),
    #[error("least-squares solve failed: {0}")]
    Solver(&'static str),
    #[error("column '{0}' not found in position table")]
    MissingColumn(String),
    #[error("position table row {line}: {message}")]
    PositionLoad { line: u64, message: String },
    #[error("text recognition failed: {0}")]
    Recognition(String),
    #[error("preview stream error: {0}")]
    Preview(String),
    #[error("video backend error: {0}")]
    Video(String),
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Image(#[from] image::ImageError),
    #[error(transparent)]
    Csv(#[from] csv::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Pattern(#[from] glob::PatternError),
    #[error(transparent)]
    OpenCv(#[from] opencv::Error),
}

pub type Result<T> = std::result::Result<T, SyncError>;
