pub mod annotate;
pub mod calibrate;
pub mod config;
pub mod error;
pub mod estimate;
pub mod frame_index;
pub mod io;
pub mod optimization;
pub mod pipeline;
pub mod positions;
pub mod recognition;
pub mod template;
pub mod transform;
pub mod types;
pub mod video;
pub mod visualization;

pub use error::{Result, SyncError};
