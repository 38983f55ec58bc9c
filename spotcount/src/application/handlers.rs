use std::fs;
use std::path::PathBuf;

use spotcount_core::error::{CountError, Result};
use spotcount_core::source_factory::{SourceBackend, open_source};
use spotcount_core::{
    CommandDetector, DetectionParameters, MaskingExtractor, Pipeline, ReportOptions, RunConfig,
    parse_channels,
};
use tracing::debug;

/// Defaults, then the JSON file, then an explicit threshold.
fn params_from_args(params: Option<PathBuf>, threshold: Option<f64>) -> Result<DetectionParameters> {
    let mut p = match params {
        Some(path) => DetectionParameters::from_file(&path)?,
        None => DetectionParameters::default(),
    };
    if let Some(t) = threshold {
        p = p.with_threshold(t);
    }
    p.validate()?;
    Ok(p)
}

fn parse_delimiter(s: &str) -> Result<u8> {
    match s {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match s.as_bytes() {
            [b] if b.is_ascii() && *b != b'"' && *b != b'\n' => Ok(*b),
            _ => Err(CountError::Config(format!(
                "delimiter must be a single ASCII character or \"tab\", got {s:?}"
            ))),
        },
    }
}

#[allow(clippy::too_many_arguments)]
pub fn handle_count(
    root: PathBuf,
    filter: String,
    channels: String,
    threshold: Option<f64>,
    params: Option<PathBuf>,
    detector: PathBuf,
    detector_args: Vec<String>,
    delimiter: String,
) -> Result<()> {
    if !root.is_dir() {
        return Err(CountError::Config(format!(
            "{} is not a directory",
            root.display()
        )));
    }
    let cfg = RunConfig {
        root,
        filter,
        channels: parse_channels(&channels)?,
        report: ReportOptions {
            delimiter: parse_delimiter(&delimiter)?,
        },
    };
    let params = params_from_args(params, threshold)?;
    debug!(?params, channels = ?cfg.channels, "count configuration");

    let source = open_source(SourceBackend::Tiff);
    let extractor = MaskingExtractor;
    let detector = CommandDetector::new(detector).with_args(detector_args);
    let summary = Pipeline::new(source.as_ref(), &extractor, &detector, &params).run(&cfg)?;

    for path in &summary.skipped {
        eprintln!("count: skipped {} (no ROI)", path.display());
    }
    match &summary.report {
        Some(report) => eprintln!(
            "count: {} of {} file(s) counted -> {}",
            summary.processed.len(),
            summary.discovered,
            report.display()
        ),
        None => eprintln!(
            "count: {} file(s) found, none counted; no report written",
            summary.discovered
        ),
    }
    Ok(())
}

pub fn handle_inspect(image: PathBuf) -> Result<()> {
    let opened = open_source(SourceBackend::Tiff).open(&image)?;
    let dims = opened.dimensions();
    let cal = opened.calibration();

    println!("{}", image.display());
    println!(
        "  size      {} x {}, {} channel(s), {} slice(s), {} frame(s)",
        dims.width, dims.height, dims.channels, dims.slices, dims.frames
    );
    println!(
        "  voxel     {} x {} x {} {}",
        cal.pixel_width, cal.pixel_height, cal.pixel_depth, cal.unit
    );
    match opened.roi() {
        Some(roi) => {
            let pixels = roi.pixel_area(dims.width, dims.height);
            println!(
                "  roi       {}, {} px, {} {}^2",
                roi.kind(),
                pixels,
                cal.area(pixels),
                cal.unit
            );
        }
        None => println!("  roi       none"),
    }
    Ok(())
}

pub fn handle_params(
    params: Option<PathBuf>,
    threshold: Option<f64>,
    out: Option<PathBuf>,
) -> Result<()> {
    let p = params_from_args(params, threshold)?;
    let json = serde_json::to_string_pretty(&p)?;
    match out {
        Some(path) => {
            fs::write(&path, format!("{json}\n"))?;
            eprintln!("params: wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_overrides_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("p.json");
        fs::write(&file, r#"{"threshold": 40.0, "radius": 0.5}"#).unwrap();

        let p = params_from_args(Some(file.clone()), None).unwrap();
        assert_eq!((p.radius, p.threshold), (0.5, 40.0));

        let p = params_from_args(Some(file), Some(90.0)).unwrap();
        assert_eq!((p.radius, p.threshold), (0.5, 90.0));
    }

    #[test]
    fn non_finite_threshold_rejected() {
        assert!(matches!(
            params_from_args(None, Some(f64::NAN)),
            Err(CountError::Config(_))
        ));
    }

    #[test]
    fn params_file_round_trips_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("defaults.json");
        handle_params(None, Some(120.0), Some(out.clone())).unwrap();

        let back = DetectionParameters::from_file(&out).unwrap();
        assert_eq!(back, DetectionParameters::default().with_threshold(120.0));
    }

    #[test]
    fn delimiters() {
        assert_eq!(parse_delimiter(",").unwrap(), b',');
        assert_eq!(parse_delimiter(";").unwrap(), b';');
        assert_eq!(parse_delimiter("tab").unwrap(), b'\t');
        assert!(parse_delimiter("").is_err());
        assert!(parse_delimiter(",,").is_err());
        assert!(parse_delimiter("\"").is_err());
    }

    #[test]
    fn count_rejects_missing_root() {
        let err = handle_count(
            PathBuf::from("/nonexistent/spotcount-root"),
            "tif".into(),
            "3".into(),
            None,
            None,
            PathBuf::from("true"),
            Vec::new(),
            ",".into(),
        )
        .unwrap_err();
        assert!(matches!(err, CountError::Config(_)));
    }
}
