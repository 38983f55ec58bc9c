use std::fs;
use std::path::PathBuf;
use std::process::Command;

use tracing::debug;

use super::tiff_source::write_volume;
use crate::detect::{Detection, SpotDetector};
use crate::error::{CountError, Result};
use crate::params::DetectionParameters;
use crate::volume::ChannelVolume;

/// Message the linking stage prints when detection found nothing.
pub const EMPTY_COLLECTION_MARKER: &str = "The spot collection is empty.";

/// Delegates detection to an external program, run once per volume as
/// `program [args...] <volume.tif> <params.json>`.
///
/// The program prints the spot count as the last line of stdout and exits 0.
#[derive(Clone, Debug)]
pub struct CommandDetector {
    program: PathBuf,
    args: Vec<String>,
}

impl CommandDetector {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.args = args;
        self
    }
}

impl SpotDetector for CommandDetector {
    fn detect(&self, volume: &ChannelVolume, params: &DetectionParameters) -> Result<Detection> {
        let dir = tempfile::tempdir()?;
        let volume_path = dir.path().join(format!("C{}.tif", volume.channel));
        let params_path = dir.path().join("params.json");
        write_volume(&volume_path, volume)?;
        fs::write(&params_path, serde_json::to_vec_pretty(params)?)?;

        let output = Command::new(&self.program)
            .args(&self.args)
            .arg(&volume_path)
            .arg(&params_path)
            .output()
            .map_err(|e| {
                CountError::Detection(format!(
                    "could not start {}: {e}",
                    self.program.display()
                ))
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!(
            program = %self.program.display(),
            status = %output.status,
            threshold = params.threshold,
            mean_filter = params.mean_filter_enabled(),
            stderr = %stderr.trim(),
            "detector finished"
        );
        if !output.status.success() && !has_marker(&stdout, &stderr) {
            let diag = last_line(&stderr)
                .or_else(|| last_line(&stdout))
                .map(str::to_string)
                .unwrap_or_else(|| format!("detector exited with {}", output.status));
            return Err(CountError::Detection(diag));
        }
        interpret(&stdout, &stderr)
    }
}

fn has_marker(stdout: &str, stderr: &str) -> bool {
    stdout.contains(EMPTY_COLLECTION_MARKER) || stderr.contains(EMPTY_COLLECTION_MARKER)
}

fn last_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).filter(|l| !l.is_empty()).last()
}

/// Read the outcome of a run that did not fail outright.
fn interpret(stdout: &str, stderr: &str) -> Result<Detection> {
    if has_marker(stdout, stderr) {
        return Ok(Detection::Empty);
    }
    let line = last_line(stdout)
        .ok_or_else(|| CountError::Detection("detector printed no spot count".into()))?;
    line.parse::<u64>()
        .map(Detection::Spots)
        .map_err(|_| CountError::Detection(format!("expected a spot count, got \"{line}\"")))
}
