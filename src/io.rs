use log::info;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::{Result, SyncError};
use crate::pipeline::RunSummary;
use crate::transform::CalibrationRecord;

/// Serializes an object to a pretty-printed JSON file.
pub fn object_to_json<T: Serialize>(output_path: &Path, object: &T) -> Result<()> {
    let j = serde_json::to_string_pretty(object)?;
    let mut file = std::fs::File::create(output_path)?;
    file.write_all(j.as_bytes())?;
    Ok(())
}

/// Deserializes an object from a JSON file.
pub fn object_from_json<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    if !file_path.exists() {
        return Err(SyncError::NotFound(file_path.to_path_buf()));
    }
    let contents = std::fs::read_to_string(file_path)?;
    Ok(serde_json::from_str(&contents)?)
}

/// Creates `dir`, first removing any existing directory when `delete_existing`.
pub fn mkdirs(dir: &Path, delete_existing: bool) -> Result<PathBuf> {
    if delete_existing && dir.exists() {
        std::fs::remove_dir_all(dir)?;
    }
    std::fs::create_dir_all(dir)?;
    Ok(dir.to_path_buf())
}

impl CalibrationRecord {
    pub fn load(path: &Path) -> Result<CalibrationRecord> {
        object_from_json(path)
    }

    /// Writes `<output_dir>/<name>.json` and returns its path.
    pub fn save(&self, output_dir: &Path) -> Result<PathBuf> {
        let name = self.name.as_deref().unwrap_or("transformer");
        let path = output_dir.join(format!("{}.json", name));
        object_to_json(&path, self)?;
        info!("calibration saved in {}", path.display());
        Ok(path)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TrialFile {
    trial_name: String,
    #[serde(default)]
    transformer: String,
}

/// A recorded session: its directory and the calibration that applies to it.
#[derive(Debug, Clone)]
pub struct Trial {
    pub trial_name: String,
    pub root_dir: PathBuf,
    pub transformer: Option<CalibrationRecord>,
}

impl Trial {
    /// A trial named after its directory when no name is given.
    pub fn new(root_dir: &Path, trial_name: Option<&str>) -> Trial {
        let trial_name = trial_name.map(str::to_string).unwrap_or_else(|| {
            root_dir
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_default()
        });
        Trial {
            trial_name,
            root_dir: root_dir.to_path_buf(),
            transformer: None,
        }
    }

    pub fn with_transformer(mut self, transformer: CalibrationRecord) -> Self {
        self.transformer = Some(transformer);
        self
    }

    /// Reads `<root_dir>/<json_name>`. The calibration it points to is loaded
    /// when that file exists; otherwise the trial has no transformer.
    pub fn load(root_dir: &Path, json_name: &str) -> Result<Trial> {
        let file: TrialFile = object_from_json(&root_dir.join(json_name))?;
        let record_path = root_dir.join(&file.transformer);
        let transformer = if !file.transformer.is_empty() && record_path.is_file() {
            Some(CalibrationRecord::load(&record_path)?)
        } else {
            None
        };
        Ok(Trial {
            trial_name: file.trial_name,
            root_dir: root_dir.to_path_buf(),
            transformer,
        })
    }

    /// Writes the calibration next to the trial file and `<root>/<name>.json`
    /// referencing it by relative path.
    pub fn save(&self, outname: Option<&str>) -> Result<PathBuf> {
        let transformer = match &self.transformer {
            Some(record) => {
                let path = record.save(&self.root_dir)?;
                path.strip_prefix(&self.root_dir)
                    .unwrap_or(&path)
                    .to_string_lossy()
                    .to_string()
            }
            None => String::new(),
        };
        let file = TrialFile {
            trial_name: self.trial_name.clone(),
            transformer,
        };
        let path = self
            .root_dir
            .join(format!("{}.json", outname.unwrap_or(&self.trial_name)));
        object_to_json(&path, &file)?;
        info!("trial saved in {}", path.display());
        Ok(path)
    }
}

/// Written next to the result table after a run.
#[derive(Debug, Serialize, Deserialize)]
pub struct RunReport {
    pub timestamp: String,
    pub trial_name: String,
    pub positions: String,
    pub video: String,
    pub output_video: Option<String>,
    pub result_rows: usize,
    pub summary: RunSummary,
}

pub fn now_timestamp() -> String {
    let now = time::OffsetDateTime::now_local().unwrap_or_else(|_| time::OffsetDateTime::now_utc());
    now.format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_default()
}

pub fn write_run_report(output_path: &Path, report: &RunReport) -> Result<()> {
    object_to_json(output_path, report)
}
