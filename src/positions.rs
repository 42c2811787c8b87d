use csv::StringRecord;
use glam::DVec2;
use log::info;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::error::{Result, SyncError};

/// Names of the columns the log is keyed and positioned by.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionColumns {
    pub frame: String,
    pub x: String,
    pub y: String,
}

impl Default for PositionColumns {
    fn default() -> Self {
        Self {
            frame: "frame".to_string(),
            x: "left_screen_pos_x".to_string(),
            y: "left_screen_pos_y".to_string(),
        }
    }
}

/// One logged VR sample; `record` keeps every original column verbatim.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionSample {
    pub frame: u64,
    pub x: f64,
    pub y: f64,
    pub record: StringRecord,
}

impl PositionSample {
    pub fn position(&self) -> DVec2 {
        DVec2::new(self.x, self.y)
    }
}

/// The VR position log, indexed by frame number. Frame numbers repeat.
#[derive(Debug, Clone)]
pub struct PositionLog {
    headers: StringRecord,
    samples: Vec<PositionSample>,
    by_frame: HashMap<u64, Vec<usize>>,
}

fn column_index(headers: &StringRecord, name: &str) -> Result<usize> {
    headers
        .iter()
        .position(|h| h == name)
        .ok_or_else(|| SyncError::MissingColumn(name.to_string()))
}

/// Integer, or a finite non-negative real truncated toward zero.
pub fn coerce_frame_index(value: &str) -> Option<u64> {
    let v = value.trim();
    if let Ok(i) = v.parse::<i64>() {
        return u64::try_from(i).ok();
    }
    match v.parse::<f64>() {
        Ok(f) if f.is_finite() && f >= 0.0 => Some(f.trunc() as u64),
        _ => None,
    }
}

impl PositionLog {
    pub fn from_reader<R: std::io::Read>(reader: R, columns: &PositionColumns) -> Result<PositionLog> {
        let mut rdr = csv::Reader::from_reader(reader);
        let headers = rdr.headers()?.clone();
        let frame_idx = column_index(&headers, &columns.frame)?;
        let x_idx = column_index(&headers, &columns.x)?;
        let y_idx = column_index(&headers, &columns.y)?;

        let mut samples = Vec::new();
        let mut by_frame: HashMap<u64, Vec<usize>> = HashMap::new();
        for result in rdr.records() {
            let record = result?;
            let line = record.position().map_or(0, |p| p.line());
            let field = |idx: usize| record.get(idx).unwrap_or("");
            let frame = coerce_frame_index(field(frame_idx)).ok_or_else(|| SyncError::PositionLoad {
                line,
                message: format!("'{}' is not a non-negative frame index", field(frame_idx)),
            })?;
            let parse_coord = |idx: usize, name: &str| {
                field(idx).trim().parse::<f64>().map_err(|_| SyncError::PositionLoad {
                    line,
                    message: format!("'{}' in column '{}' is not a number", field(idx), name),
                })
            };
            let x = parse_coord(x_idx, &columns.x)?;
            let y = parse_coord(y_idx, &columns.y)?;
            by_frame.entry(frame).or_default().push(samples.len());
            samples.push(PositionSample { frame, x, y, record });
        }
        info!(
            "loaded {} position samples over {} frames",
            samples.len(),
            by_frame.len()
        );
        Ok(PositionLog {
            headers,
            samples,
            by_frame,
        })
    }

    pub fn from_path(path: &Path, columns: &PositionColumns) -> Result<PositionLog> {
        if !path.exists() {
            return Err(SyncError::NotFound(path.to_path_buf()));
        }
        Self::from_reader(std::fs::File::open(path)?, columns)
    }

    pub fn headers(&self) -> &StringRecord {
        &self.headers
    }
    pub fn samples(&self) -> &[PositionSample] {
        &self.samples
    }
    pub fn len(&self) -> usize {
        self.samples.len()
    }
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Every sample logged at `frame`, in log order. Negative indices match nothing.
    pub fn samples_at(&self, frame: i64) -> impl Iterator<Item = &PositionSample> {
        u64::try_from(frame)
            .ok()
            .and_then(|f| self.by_frame.get(&f))
            .into_iter()
            .flatten()
            .map(move |i| &self.samples[*i])
    }
}

/// A position sample matched to a video frame and mapped into its pixels.
#[derive(Debug, Clone, PartialEq)]
pub struct ReprojectedSample {
    pub video_frame: usize,
    pub sample: PositionSample,
    pub image: DVec2,
}

/// Reprojected samples in video playback order.
#[derive(Debug, Clone)]
pub struct ResultTable {
    headers: StringRecord,
    x_column: String,
    y_column: String,
    rows: Vec<ReprojectedSample>,
}

impl ResultTable {
    pub fn new(headers: &StringRecord, x_column: &str, y_column: &str) -> ResultTable {
        ResultTable {
            headers: headers.clone(),
            x_column: x_column.to_string(),
            y_column: y_column.to_string(),
            rows: Vec::new(),
        }
    }
    pub fn push(&mut self, row: ReprojectedSample) {
        self.rows.push(row);
    }
    pub fn rows(&self) -> &[ReprojectedSample] {
        &self.rows
    }
    pub fn len(&self) -> usize {
        self.rows.len()
    }
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Original columns, then the two output columns. An output column that
    /// already exists in the input keeps its position and is overwritten.
    pub fn output_headers(&self) -> Vec<String> {
        let mut headers: Vec<String> = self.headers.iter().map(str::to_string).collect();
        for name in [&self.x_column, &self.y_column] {
            if !headers.iter().any(|h| h == name) {
                headers.push(name.clone());
            }
        }
        headers
    }

    pub fn write<W: std::io::Write>(&self, writer: W) -> Result<()> {
        let headers = self.output_headers();
        let x_idx = headers.iter().position(|h| *h == self.x_column);
        let y_idx = headers.iter().position(|h| *h == self.y_column);
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(&headers)?;
        for row in &self.rows {
            let mut fields: Vec<String> = row.sample.record.iter().map(str::to_string).collect();
            fields.resize(headers.len(), String::new());
            if let Some(i) = x_idx {
                fields[i] = row.image.x.to_string();
            }
            if let Some(i) = y_idx {
                fields[i] = row.image.y.to_string();
            }
            wtr.write_record(&fields)?;
        }
        wtr.flush()?;
        Ok(())
    }

    pub fn write_path(&self, path: &Path) -> Result<()> {
        self.write(std::fs::File::create(path)?)
    }
}
