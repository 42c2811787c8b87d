use serde::{Deserialize, Serialize};

use crate::annotate::MarkerStyle;
use crate::positions::PositionColumns;

/// Settings for one synchronisation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub columns: PositionColumns,
    pub output_x: String,
    pub output_y: String,
    pub binarize_threshold: u8,
    pub output_video: bool,
    pub preview: bool,
    /// Minimum time each previewed frame stays on screen.
    pub preview_delay_ms: u64,
    pub marker: MarkerStyle,
    /// Frame rate assumed for image-sequence sources.
    pub fallback_fps: f64,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            columns: PositionColumns::default(),
            output_x: "video_x".to_string(),
            output_y: "video_y".to_string(),
            binarize_threshold: 125,
            output_video: false,
            preview: false,
            preview_delay_ms: 1,
            marker: MarkerStyle::default(),
            fallback_fps: 30.0,
        }
    }
}

impl PipelineConfig {
    pub fn rendering(&self) -> bool {
        self.output_video || self.preview
    }
}
