use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{CountError, Result};

/// Settings handed to the spot detector. Built once per run and shared by
/// every file and channel.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionParameters {
    /// Spot radius in calibrated units. Not a diameter.
    pub radius: f64,
    /// Laplacian-of-Gaussian quality threshold.
    pub threshold: f64,
    pub subpixel_localization: bool,
    pub median_filter: bool,
    pub linking_max_distance: f64,
    pub gap_closing_max_distance: f64,
    pub max_frame_gap: u32,
    /// Keep only spots whose mean intensity is below this value; 0 disables the filter.
    pub mean_intensity_filter: f64,
    /// Channel the detector reads inside the single-channel volume. Always 1.
    pub target_channel: u32,
    pub initial_spot_filter_value: f64,
}

impl Default for DetectionParameters {
    fn default() -> Self {
        Self {
            radius: 0.35,
            threshold: 70.0,
            subpixel_localization: true,
            median_filter: false,
            linking_max_distance: 10.0,
            gap_closing_max_distance: 10.0,
            max_frame_gap: 3,
            mean_intensity_filter: 0.0,
            target_channel: 1,
            initial_spot_filter_value: 1.0,
        }
    }
}

impl DetectionParameters {
    /// Load a JSON parameter file. Missing fields fall back to the defaults.
    pub fn from_file(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)?;
        let params: Self = serde_json::from_str(&text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn mean_filter_enabled(&self) -> bool {
        self.mean_intensity_filter != 0.0
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(CountError::Config(format!(
                "radius must be a positive number, got {}",
                self.radius
            )));
        }
        if !self.threshold.is_finite() {
            return Err(CountError::Config(format!(
                "threshold must be finite, got {}",
                self.threshold
            )));
        }
        for (name, v) in [
            ("linking_max_distance", self.linking_max_distance),
            ("gap_closing_max_distance", self.gap_closing_max_distance),
        ] {
            if !(v.is_finite() && v >= 0.0) {
                return Err(CountError::Config(format!(
                    "{name} must be a non-negative number, got {v}"
                )));
            }
        }
        if self.target_channel != 1 {
            return Err(CountError::Config(format!(
                "target_channel must be 1 for single-channel volumes, got {}",
                self.target_channel
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("params.json");
        fs::write(&path, r#"{ "radius": 0.5, "median_filter": true }"#).unwrap();

        let p = DetectionParameters::from_file(&path).unwrap();
        assert_eq!(p.radius, 0.5);
        assert!(p.median_filter);
        assert_eq!(p.threshold, 70.0);
        assert_eq!(p.max_frame_gap, 3);
        assert!(!p.mean_filter_enabled());
    }

    #[test]
    fn cli_threshold_overrides_file() {
        let p = DetectionParameters::default().with_threshold(150.0);
        assert_eq!(p.threshold, 150.0);
    }

    #[test]
    fn rejects_non_positive_radius() {
        let p = DetectionParameters {
            radius: 0.0,
            ..Default::default()
        };
        assert!(matches!(p.validate(), Err(CountError::Config(_))));
    }

    #[test]
    fn rejects_other_target_channel() {
        let p = DetectionParameters {
            target_channel: 3,
            ..Default::default()
        };
        assert!(p.validate().is_err());
    }
}
