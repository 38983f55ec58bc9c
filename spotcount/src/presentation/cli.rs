use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(author, version, about = "Count fluorescent spots per channel inside image ROIs", long_about = None)]
pub struct Cli {
    /// Log filter used when RUST_LOG is unset (e.g. "info", "spotcount_core=debug")
    #[arg(long, global = true, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Count spots in every matching image under ROOT and write Results_C<n>.csv there
    Count {
        root: PathBuf,

        /// substring the file name must contain (literal, not a glob)
        #[arg(long, default_value = "tif")]
        filter: String,

        /// channels of interest, 1-based and comma-separated (e.g. "3,4")
        #[arg(long, default_value = "3")]
        channels: String,

        /// intensity threshold for the spots; overrides the parameter file
        #[arg(long)]
        threshold: Option<f64>,

        /// JSON file with detection parameters (missing fields use defaults)
        #[arg(long)]
        params: Option<PathBuf>,

        /// external detector, run as `PROGRAM [ARGS..] <volume.tif> <params.json>`
        #[arg(long)]
        detector: PathBuf,

        /// extra argument for the detector (repeatable)
        #[arg(long = "detector-arg", allow_hyphen_values = true)]
        detector_args: Vec<String>,

        /// field delimiter of the report; "tab" for tab-separated
        #[arg(long, default_value = ",")]
        delimiter: String,
    },

    /// Show size, calibration and ROI of one image
    Inspect { image: PathBuf },

    /// Print the effective detection parameters as JSON
    Params {
        #[arg(long)]
        params: Option<PathBuf>,

        #[arg(long)]
        threshold: Option<f64>,

        /// write to this file instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
}
