use glam::DVec2;
use image::RgbImage;
use indicatif::ProgressBar;
use log::{debug, info, trace, warn};
use rerun::RecordingStream;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crate::annotate::draw_marker_mut;
use crate::config::PipelineConfig;
use crate::error::{Result, SyncError};
use crate::frame_index::FrameIndexReader;
use crate::positions::{PositionLog, ReprojectedSample, ResultTable};
use crate::recognition::TextRecognizer;
use crate::transform::{CalibrationRecord, CoordinateTransform};
use crate::types::VideoFrame;
use crate::video::{FrameSink, FrameSource};
use crate::visualization::log_preview_frame;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelineState {
    AwaitingCalibration,
    ReadingFrame,
    Correlating,
    Rendering,
    Advancing,
    Done,
    Failed,
}

/// Counters reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub frames_read: usize,
    pub frames_with_valid_index: usize,
    pub frames_correlated: usize,
    pub samples_reprojected: usize,
    pub stopped_early: bool,
}

#[derive(Debug)]
pub struct PipelineOutput {
    pub table: ResultTable,
    pub summary: RunSummary,
}

/// Single sequential pass over a video that matches each frame's burned-in
/// counter against the position log and reprojects the matching samples.
pub struct SyncPipeline<R: TextRecognizer> {
    transform: Option<CoordinateTransform>,
    positions: PositionLog,
    reader: FrameIndexReader<R>,
    config: PipelineConfig,
    stop: Option<Arc<AtomicBool>>,
    recording: Option<RecordingStream>,
    state: PipelineState,
}

impl<R: TextRecognizer> SyncPipeline<R> {
    /// An unfitted record is accepted here and rejected when the run starts.
    pub fn new(
        calibration: &CalibrationRecord,
        positions: PositionLog,
        reader: FrameIndexReader<R>,
        config: PipelineConfig,
    ) -> SyncPipeline<R> {
        SyncPipeline {
            transform: calibration.transform().ok(),
            positions,
            reader,
            config,
            stop: None,
            recording: None,
            state: PipelineState::AwaitingCalibration,
        }
    }

    pub fn with_transform(mut self, transform: CoordinateTransform) -> Self {
        self.transform = Some(transform);
        self
    }

    /// Checked between frames; setting it ends the run after the current frame.
    pub fn with_stop_flag(mut self, stop: Arc<AtomicBool>) -> Self {
        self.stop = Some(stop);
        self
    }

    pub fn with_recording(mut self, recording: RecordingStream) -> Self {
        self.recording = Some(recording);
        self
    }

    pub fn state(&self) -> PipelineState {
        self.state
    }

    pub fn positions(&self) -> &PositionLog {
        &self.positions
    }

    fn transition(&mut self, next: PipelineState) {
        trace!("{:?} -> {:?}", self.state, next);
        self.state = next;
    }

    fn check_preconditions(&self, source: &dyn FrameSource) -> Result<CoordinateTransform> {
        let transform = self.transform.ok_or_else(|| {
            SyncError::Precondition("no fitted coordinate transform".to_string())
        })?;
        if self.reader.crop.is_empty() {
            return Err(SyncError::Precondition(format!(
                "frame-index region {:?} is empty",
                self.reader.crop
            )));
        }
        let info = source.info();
        if info.width == 0 || info.height == 0 {
            return Err(SyncError::Precondition(
                "video source reports empty frames".to_string(),
            ));
        }
        Ok(transform)
    }

    /// Walks `source` once. The sink, when given, receives exactly one frame
    /// per input frame and is finished on every exit path.
    pub fn run(
        &mut self,
        source: &mut dyn FrameSource,
        mut sink: Option<&mut (dyn FrameSink + '_)>,
    ) -> Result<PipelineOutput> {
        self.state = PipelineState::AwaitingCalibration;
        let transform = match self.check_preconditions(source) {
            Ok(t) => t,
            Err(e) => {
                self.transition(PipelineState::Failed);
                return Err(e);
            }
        };

        let mut table = ResultTable::new(
            self.positions.headers(),
            &self.config.output_x,
            &self.config.output_y,
        );
        let mut summary = RunSummary::default();
        let looped = self.frame_loop(
            source,
            sink.as_deref_mut(),
            &transform,
            &mut table,
            &mut summary,
        );
        let finished = match sink {
            Some(s) => s.finish(),
            None => Ok(()),
        };
        if let Err(e) = looped.and(finished) {
            self.transition(PipelineState::Failed);
            return Err(e);
        }

        self.transition(PipelineState::Done);
        info!(
            "read {} frames, {} with a valid index, {} correlated, {} samples reprojected",
            summary.frames_read,
            summary.frames_with_valid_index,
            summary.frames_correlated,
            summary.samples_reprojected
        );
        Ok(PipelineOutput { table, summary })
    }

    fn frame_loop(
        &mut self,
        source: &mut dyn FrameSource,
        mut sink: Option<&mut (dyn FrameSink + '_)>,
        transform: &CoordinateTransform,
        table: &mut ResultTable,
        summary: &mut RunSummary,
    ) -> Result<()> {
        let pb = match source.info().frame_count {
            Some(n) => ProgressBar::new(n),
            None => ProgressBar::no_length(),
        };
        let mut frame_idx = 0usize;
        loop {
            if self.stop.as_ref().is_some_and(|s| s.load(Ordering::Relaxed)) {
                info!("stopped after {} frames", frame_idx);
                summary.stopped_early = true;
                break;
            }

            self.transition(PipelineState::ReadingFrame);
            let frame = match source.read_frame() {
                Ok(Some(image)) => VideoFrame::new(frame_idx, image),
                Ok(None) if frame_idx == 0 => {
                    return Err(SyncError::FrameRead("video produced no frames".to_string()));
                }
                Err(e) if frame_idx == 0 => {
                    return Err(match e {
                        SyncError::FrameRead(m) => SyncError::FrameRead(m),
                        other => SyncError::FrameRead(other.to_string()),
                    });
                }
                Ok(None) => break,
                Err(e) => {
                    debug!("read failed after {} frames, ending: {}", frame_idx, e);
                    break;
                }
            };
            summary.frames_read += 1;

            let reading = self.reader.read(&frame.image);
            let mut points: Vec<DVec2> = Vec::new();
            match reading.parsed_value {
                Some(vr_frame) if reading.is_valid => {
                    summary.frames_with_valid_index += 1;
                    self.transition(PipelineState::Correlating);
                    for sample in self.positions.samples_at(vr_frame) {
                        let image = transform.apply_point(sample.position());
                        points.push(image);
                        table.push(ReprojectedSample {
                            video_frame: frame.index,
                            sample: sample.clone(),
                            image,
                        });
                    }
                    if points.is_empty() {
                        debug!("frame {}: no samples logged at {}", frame.index, vr_frame);
                    } else {
                        summary.frames_correlated += 1;
                        summary.samples_reprojected += points.len();
                    }
                }
                _ => debug!("frame {}: unreadable index {:?}", frame.index, reading.raw_text),
            }

            if self.config.rendering() {
                let annotated = if points.is_empty() {
                    None
                } else {
                    self.transition(PipelineState::Rendering);
                    Some(self.annotate(&frame.image, &points))
                };
                let out = annotated.as_ref().unwrap_or(&frame.image);
                if let Some(s) = sink.as_deref_mut() {
                    s.write_frame(out)?;
                }
                if self.config.preview {
                    self.preview(frame.index, out, &points);
                }
            } else if let Some(s) = sink.as_deref_mut() {
                s.write_frame(&frame.image)?;
            }

            self.transition(PipelineState::Advancing);
            frame_idx += 1;
            pb.inc(1);
        }
        pb.finish_and_clear();
        Ok(())
    }

    fn annotate(&self, frame: &RgbImage, points: &[DVec2]) -> RgbImage {
        let mut out = frame.clone();
        for p in points {
            draw_marker_mut(&mut out, *p, &self.config.marker);
        }
        out
    }

    fn preview(&self, frame_idx: usize, frame: &RgbImage, points: &[DVec2]) {
        let Some(recording) = &self.recording else {
            return;
        };
        if let Err(e) = log_preview_frame(
            recording,
            "position_estimation",
            frame_idx,
            frame,
            points,
            self.config.marker.color,
        ) {
            warn!("preview frame {}: {}", frame_idx, e);
        }
        std::thread::sleep(Duration::from_millis(self.config.preview_delay_ms));
    }
}
