use clap::Parser;
use glam::DVec2;
use image::{DynamicImage, Rgb, RgbImage};
use log::warn;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::path::Path;

use vr_video_sync::annotate::{MarkerStyle, draw_marker_mut};
use vr_video_sync::io::Trial;
use vr_video_sync::recognition::glyph::render_digits;
use vr_video_sync::transform::CalibrationRecord;
use vr_video_sync::types::CropRegion;

/// Render a synthetic recording session: a frame directory with burned-in
/// counters, the matching position log, a fitted calibration and a trial file.
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Output (trial) directory
    #[arg(short, long)]
    output: String,

    /// Number of video frames
    #[arg(short, long, default_value = "60")]
    num_frames: usize,

    /// First VR frame index shown in the video
    #[arg(long, default_value = "100")]
    first_index: u64,

    /// Position samples logged per VR frame
    #[arg(long, default_value = "2")]
    samples_per_frame: usize,

    /// Fraction of video frames whose counter is hidden
    #[arg(long, default_value = "0.1")]
    drop_rate: f64,

    #[arg(long, default_value = "320")]
    width: u32,

    #[arg(long, default_value = "240")]
    height: u32,

    /// Pixel size of one counter font cell
    #[arg(long, default_value = "3")]
    scale: u32,

    #[arg(long, default_value = "42")]
    seed: u64,
}

const COUNTER_ORIGIN: (u32, u32) = (4, 4);

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let root = Path::new(&args.output);
    let frames_dir = root.join("frames");
    std::fs::create_dir_all(&frames_dir)?;
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);

    // VR screen space is the unit square, mapped into the frame below the counter.
    let (w, h) = (args.width as f64, args.height as f64);
    let to_image = |p: DVec2| DVec2::new(0.1 * w + 0.8 * w * p.x, 0.2 * h + 0.7 * h * (1.0 - p.y));

    let mut record = CalibrationRecord::new("synthetic_transformer");
    for vr in [
        DVec2::new(0.0, 0.0),
        DVec2::new(1.0, 0.0),
        DVec2::new(0.0, 1.0),
        DVec2::new(1.0, 1.0),
    ] {
        record.add_landmark(vr, to_image(vr));
    }
    record.fit()?;

    let mut csv_writer = csv::Writer::from_path(root.join("positions.csv"))?;
    csv_writer.write_record(["frame", "left_screen_pos_x", "left_screen_pos_y", "sample"])?;
    let marker = MarkerStyle {
        color: [255, 80, 80],
        ..Default::default()
    };

    let mut roi = CropRegion::from_corners(COUNTER_ORIGIN, COUNTER_ORIGIN);
    let mut sample_id = 0usize;
    for i in 0..args.num_frames {
        let vr_frame = args.first_index + i as u64;
        let mut frame = RgbImage::from_pixel(args.width, args.height, Rgb([30, 30, 30]));
        for _ in 0..args.samples_per_frame {
            let p = DVec2::new(rng.random_range(0.0..1.0), rng.random_range(0.0..1.0));
            csv_writer.write_record([
                vr_frame.to_string(),
                p.x.to_string(),
                p.y.to_string(),
                sample_id.to_string(),
            ])?;
            sample_id += 1;
            draw_marker_mut(&mut frame, to_image(p), &marker);
        }
        if rng.random_range(0.0..1.0) >= args.drop_rate {
            let counter = DynamicImage::ImageLuma8(render_digits(&vr_frame.to_string(), args.scale)).to_rgb8();
            let (cw, ch) = counter.dimensions();
            roi = roi.union(&CropRegion::from_corners(
                COUNTER_ORIGIN,
                (COUNTER_ORIGIN.0 + cw, COUNTER_ORIGIN.1 + ch),
            ));
            image::imageops::replace(
                &mut frame,
                &counter,
                COUNTER_ORIGIN.0 as i64,
                COUNTER_ORIGIN.1 as i64,
            );
        }
        frame.save(frames_dir.join(format!("{:06}.png", i)))?;
    }
    csv_writer.flush()?;

    let trial = Trial::new(root, Some("session")).with_transformer(record);
    trial.save(None)?;

    if roi.is_empty() {
        warn!("no frame carries a counter (drop rate {}), the region below is empty", args.drop_rate);
    }
    println!("Generated {} frames in {}", args.num_frames, frames_dir.display());
    println!(
        "frame-index region: --roi {},{},{},{} --glyph",
        roi.x1, roi.y1, roi.x2, roi.y2
    );
    Ok(())
}
