use std::path::PathBuf;

use tracing::{info, warn};

use crate::aggregate::{record, record_channel};
use crate::channels::report_file_name;
use crate::detect::{SpotDetector, count_spots};
use crate::discovery::discover;
use crate::domain::SourceFile;
use crate::error::Result;
use crate::extract::VolumeExtractor;
use crate::image::ImageSource;
use crate::params::DetectionParameters;
use crate::report::{ReportOptions, write_report};
use crate::table::ResultTable;

#[derive(Clone, Debug)]
pub struct RunConfig {
    pub root: PathBuf,
    /// Literal substring a file name must contain.
    pub filter: String,
    /// 1-based channel indices, in report order.
    pub channels: Vec<u32>,
    pub report: ReportOptions,
}

impl RunConfig {
    pub fn report_path(&self) -> PathBuf {
        self.root.join(report_file_name(&self.channels))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub discovered: usize,
    pub processed: Vec<String>,
    pub skipped: Vec<PathBuf>,
    pub report: Option<PathBuf>,
}

/// Per-file, per-channel counting driver. Strictly sequential: one image
/// and one channel volume alive at a time.
pub struct Pipeline<'a> {
    source: &'a dyn ImageSource,
    extractor: &'a dyn VolumeExtractor,
    detector: &'a dyn SpotDetector,
    params: &'a DetectionParameters,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        source: &'a dyn ImageSource,
        extractor: &'a dyn VolumeExtractor,
        detector: &'a dyn SpotDetector,
        params: &'a DetectionParameters,
    ) -> Self {
        Self {
            source,
            extractor,
            detector,
            params,
        }
    }

    /// Discover, count, and write the report. Any error aborts the run
    /// before the report is written.
    pub fn run(&self, cfg: &RunConfig) -> Result<RunSummary> {
        let files = discover(&cfg.root, &cfg.filter)?;
        let mut summary = RunSummary {
            discovered: files.len(),
            ..Default::default()
        };
        if files.is_empty() {
            info!(root = %cfg.root.display(), filter = %cfg.filter, "no matching files, nothing to do");
            return Ok(summary);
        }

        let table = self.process_files(&files, &cfg.channels, &mut summary)?;

        let dest = cfg.report_path();
        if write_report(&table, &dest, &cfg.report)? {
            summary.report = Some(dest);
        } else {
            warn!("every file was skipped; no report written");
        }
        Ok(summary)
    }

    /// Count every file into a fresh table. Files without a ROI are skipped.
    pub fn process_files(
        &self,
        files: &[SourceFile],
        channels: &[u32],
        summary: &mut RunSummary,
    ) -> Result<ResultTable> {
        let mut table = ResultTable::new();
        for file in files {
            if self.process_file(file, channels, &mut table)? {
                summary.processed.push(file.basename.clone());
            } else {
                summary.skipped.push(file.path.clone());
            }
        }
        Ok(table)
    }

    /// Returns false when the file was skipped.
    fn process_file(&self, file: &SourceFile, channels: &[u32], table: &mut ResultTable) -> Result<bool> {
        info!("Currently opening {}...", file.basename);
        // dropped at the end of this call on every path, skip included
        let image = self.source.open(file.path())?;

        let (Some(roi), Some(roi_area)) = (image.roi(), image.roi_area()) else {
            warn!(path = %file.path().display(), "Couldn't load the ROI for this image; skipping it");
            return Ok(false);
        };
        info!(
            file = %file.basename,
            roi = roi.kind(),
            roi_area,
            unit = %image.calibration().unit,
            "ROI loaded"
        );

        record(table, channels, &file.basename, roi_area)?;
        for &channel in channels {
            info!("Currently working on channel {channel}");
            let count = {
                let volume = self.extractor.extract(image.as_ref(), channel, roi)?;
                count_spots(self.detector, &volume, self.params)?
            };
            record_channel(table, channel, count, roi_area)?;
        }
        table.check_lockstep()?;
        Ok(true)
    }
}

