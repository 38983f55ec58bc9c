#![forbid(unsafe_code)]

pub mod error;
pub mod params;
pub mod channels;
pub mod discovery;
pub mod domain;
pub mod volume;

pub mod roi {
    pub mod ijroi;
    pub mod shape;

    pub use shape::{Roi, RoiMask};
}

pub mod image;
pub mod extract;
pub mod detect;
pub mod source_factory;

pub mod backend {
    pub mod command;
    pub mod hyperstack;
    pub mod tiff_source;
}

pub mod table;
pub mod aggregate;
pub mod report;
pub mod pipeline;

// Re-exports: stable API surface
pub use backend::command::CommandDetector;
pub use backend::tiff_source::TiffSource;
pub use channels::{parse_channels, report_file_name};
pub use detect::{Detection, SpotDetector, count_spots};
pub use discovery::discover;
pub use error::{CountError, Result};
pub use extract::{MaskingExtractor, VolumeExtractor};
pub use image::{Calibration, ImageSource, OpenImage};
pub use params::DetectionParameters;
pub use pipeline::{Pipeline, RunConfig, RunSummary};
pub use report::{ReportOptions, write_report};
pub use table::ResultTable;
