use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::time::Instant;

use vr_video_sync::annotate::{draw_bboxes, draw_centroid};
use vr_video_sync::calibrate::calibrate_from_manifest;
use vr_video_sync::config::PipelineConfig;
use vr_video_sync::estimate::{EstimateOptions, estimate_positions};
use vr_video_sync::frame_index::read_frame_index;
use vr_video_sync::io::{Trial, object_from_json};
use vr_video_sync::recognition::{RecognizerBackend, TextRecognizer};
use vr_video_sync::template::{Centroid, DetectorConfig, TemplateDetector};
use vr_video_sync::types::CropRegion;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find calibration markers in a still frame
    Detect {
        /// Frame to search
        image: PathBuf,

        /// Marker template with alpha channel
        template: PathBuf,

        #[arg(long, default_value = "10")]
        min_size: u32,

        #[arg(long, default_value = "50")]
        max_size: u32,

        #[arg(long, default_value = "5")]
        step: u32,

        #[arg(short, long, default_value = "0.9")]
        threshold: f32,

        /// Save the frame with boxes and centroids drawn
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fit a calibration record from a manifest
    Calibrate {
        /// Calibration manifest JSON
        manifest: PathBuf,

        /// Directory for `<name>.json`, defaults to the manifest's directory
        #[arg(short, long)]
        output_dir: Option<PathBuf>,
    },
    /// Reproject a trial's position log onto its video
    Estimate {
        /// Trial directory
        root: PathBuf,

        /// Trial JSON, relative to the trial directory
        trial: String,

        /// Position log CSV, relative to the trial directory
        positions: String,

        /// Video file or frame directory, relative to the trial directory
        video: String,

        /// Frame-index region as x1,y1,x2,y2
        #[arg(long)]
        roi: CropRegion,

        /// Write an annotated copy of the video
        #[arg(short, long)]
        output_video: bool,

        /// Stream annotated frames to a rerun viewer
        #[arg(short, long)]
        preview: bool,

        /// Pipeline configuration JSON
        #[arg(long)]
        config: Option<PathBuf>,

        /// Read frame indices with the built-in 5x7 glyph reader instead of tesseract
        #[arg(long)]
        glyph: bool,
    },
    /// Read the frame index from a single image
    ReadIndex {
        image: PathBuf,

        /// Frame-index region as x1,y1,x2,y2
        #[arg(long)]
        roi: CropRegion,

        #[arg(short, long, default_value = "125")]
        threshold: u8,

        /// Use the built-in 5x7 glyph reader instead of tesseract
        #[arg(long)]
        glyph: bool,
    },
}

fn recognizer(glyph: bool) -> Result<Box<dyn TextRecognizer>, Box<dyn std::error::Error>> {
    let backend = if glyph {
        RecognizerBackend::Glyph
    } else {
        RecognizerBackend::default()
    };
    Ok(backend.create()?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    match args.command {
        Commands::Detect {
            image,
            template,
            min_size,
            max_size,
            step,
            threshold,
            output,
        } => {
            let source = image::open(&image)?.to_rgb8();
            let template = image::open(&template)?.to_rgba8();
            let detector = TemplateDetector::new(DetectorConfig {
                min_size,
                max_size,
                size_step: step,
                threshold,
            });
            let now = Instant::now();
            let bboxes = detector.detect(&source, &template);
            println!("detecting markers took {:.6} sec", now.elapsed().as_secs_f64());
            for b in &bboxes {
                println!("({}, {}) - ({}, {})  centroid ({:.1}, {:.1})", b.x1, b.y1, b.x2, b.y2, b.cx, b.cy);
            }
            for centroid in [Centroid::Mean, Centroid::Median] {
                match centroid.aggregate(&bboxes) {
                    Some(p) => println!("{:?} centroid: ({:.3}, {:.3})", centroid, p.x, p.y),
                    None => println!("{:?} centroid: none", centroid),
                }
            }
            if let Some(output) = output {
                let annotated = draw_bboxes(&source, &bboxes, true);
                let annotated = draw_centroid(&annotated, &bboxes, Centroid::Mean);
                let annotated = draw_centroid(&annotated, &bboxes, Centroid::Median);
                annotated.save(&output)?;
            }
        }
        Commands::Calibrate {
            manifest,
            output_dir,
        } => {
            let record = calibrate_from_manifest(&manifest)?;
            let out_dir = output_dir.unwrap_or_else(|| {
                manifest
                    .parent()
                    .map(|p| p.to_path_buf())
                    .unwrap_or_else(|| PathBuf::from("."))
            });
            let path = record.save(&out_dir)?;
            println!("transform: {:?}", record.transform()?.to_rows());
            println!("saved {}", path.display());
        }
        Commands::Estimate {
            root,
            trial,
            positions,
            video,
            roi,
            output_video,
            preview,
            config,
            glyph,
        } => {
            let trial = Trial::load(&root, &trial)?;
            let mut config: PipelineConfig = match config {
                Some(path) => object_from_json(&path)?,
                None => PipelineConfig::default(),
            };
            config.output_video |= output_video;
            config.preview |= preview;

            let mut options = EstimateOptions::new(&positions, &video, roi, recognizer(glyph)?);
            if config.preview {
                options.recording = Some(rerun::RecordingStreamBuilder::new("vrsync").spawn()?);
            }
            options.config = config;

            let now = Instant::now();
            let estimation = estimate_positions(&trial, options)?;
            println!("estimation took {:.6} sec", now.elapsed().as_secs_f64());
            println!(
                "{} rows written to {}",
                estimation.table.len(),
                estimation.table_path.display()
            );
            if let Some(path) = estimation.output_video {
                println!("annotated video: {}", path.display());
            }
        }
        Commands::ReadIndex {
            image,
            roi,
            threshold,
            glyph,
        } => {
            let frame = image::open(&image)?.to_rgb8();
            let reading = read_frame_index(&frame, &roi, threshold, &recognizer(glyph)?);
            println!(
                "raw {:?} parsed {:?} valid {}",
                reading.raw_text, reading.parsed_value, reading.is_valid
            );
        }
    }

    Ok(())
}
