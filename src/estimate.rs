use log::info;
use rerun::RecordingStream;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicBool;

use crate::config::PipelineConfig;
use crate::error::{Result, SyncError};
use crate::frame_index::FrameIndexReader;
use crate::io::{RunReport, Trial, mkdirs, now_timestamp, write_run_report};
use crate::pipeline::{RunSummary, SyncPipeline};
use crate::positions::{PositionLog, ResultTable};
use crate::recognition::TextRecognizer;
use crate::types::CropRegion;
use crate::video::{open_sink, open_source};

pub const ESTIMATIONS_DIR: &str = "estimations";
pub const RESULT_TABLE: &str = "repositions.csv";
pub const RUN_REPORT: &str = "summary.json";

/// Inputs of one estimation run. File names are relative to the trial root.
pub struct EstimateOptions<R: TextRecognizer> {
    pub positions_filename: String,
    pub video_filename: String,
    pub crop: CropRegion,
    pub recognizer: R,
    pub config: PipelineConfig,
    pub stop: Option<Arc<AtomicBool>>,
    pub recording: Option<RecordingStream>,
}

impl<R: TextRecognizer> EstimateOptions<R> {
    pub fn new(positions_filename: &str, video_filename: &str, crop: CropRegion, recognizer: R) -> Self {
        EstimateOptions {
            positions_filename: positions_filename.to_string(),
            video_filename: video_filename.to_string(),
            crop,
            recognizer,
            config: PipelineConfig::default(),
            stop: None,
            recording: None,
        }
    }
}

pub struct Estimation {
    pub table: ResultTable,
    pub summary: RunSummary,
    pub output_dir: PathBuf,
    pub table_path: PathBuf,
    pub output_video: Option<PathBuf>,
}

/// Reprojects a trial's position log onto its video.
///
/// `<root>/estimations/` is recreated once the inputs have opened and receives the result
/// table, the run report and, when requested, the annotated video.
pub fn estimate_positions<R: TextRecognizer>(
    trial: &Trial,
    options: EstimateOptions<R>,
) -> Result<Estimation> {
    let positions_path = trial.root_dir.join(&options.positions_filename);
    let video_path = trial.root_dir.join(&options.video_filename);
    if !positions_path.exists() {
        return Err(SyncError::Precondition(format!(
            "position log '{}' does not exist",
            positions_path.display()
        )));
    }
    if !video_path.exists() {
        return Err(SyncError::Precondition(format!(
            "video '{}' does not exist in the trial directory",
            video_path.display()
        )));
    }
    let record = trial.transformer.as_ref().ok_or_else(|| {
        SyncError::Precondition(format!(
            "trial '{}' has no calibration; assign one first",
            trial.trial_name
        ))
    })?;
    if record.transform.is_none() {
        return Err(SyncError::Precondition(
            "the trial calibration has not been fitted".to_string(),
        ));
    }

    let config = options.config;
    let positions = PositionLog::from_path(&positions_path, &config.columns)?;
    let mut source = open_source(&video_path, config.fallback_fps)?;

    let outdir = mkdirs(&trial.root_dir.join(ESTIMATIONS_DIR), true)?;
    let mut sink = if config.output_video {
        Some(open_sink(&video_path, source.info(), &outdir)?)
    } else {
        None
    };
    info!(
        "frame-index region ({}, {}) - ({}, {})",
        options.crop.x1, options.crop.y1, options.crop.x2, options.crop.y2
    );

    let reader = FrameIndexReader::new(options.recognizer, options.crop, config.binarize_threshold);
    let mut pipeline = SyncPipeline::new(record, positions, reader, config);
    if let Some(stop) = options.stop {
        pipeline = pipeline.with_stop_flag(stop);
    }
    if let Some(recording) = options.recording {
        pipeline = pipeline.with_recording(recording);
    }

    let output = match sink.as_mut() {
        Some((_, s)) => pipeline.run(&mut *source, Some(&mut **s)),
        None => pipeline.run(&mut *source, None),
    }?;
    drop(source);

    let table_path = outdir.join(RESULT_TABLE);
    output.table.write_path(&table_path)?;
    let output_video = sink.map(|(path, _)| path);
    let report = RunReport {
        timestamp: now_timestamp(),
        trial_name: trial.trial_name.clone(),
        positions: options.positions_filename,
        video: options.video_filename,
        output_video: output_video.as_ref().map(|p| p.display().to_string()),
        result_rows: output.table.len(),
        summary: output.summary.clone(),
    };
    write_run_report(&outdir.join(RUN_REPORT), &report)?;
    info!("wrote {} rows to {}", output.table.len(), table_path.display());

    Ok(Estimation {
        table: output.table,
        summary: output.summary,
        output_dir: outdir,
        table_path,
        output_video,
    })
}
