#![cfg(unix)]

use spotcount_core::roi::Roi;
use spotcount_core::volume::{ChannelVolume, Plane};
use spotcount_core::{
    Calibration, CommandDetector, CountError, Detection, DetectionParameters, SpotDetector,
    count_spots,
};

fn volume() -> ChannelVolume {
    let roi = Roi::Rectangle {
        left: 0,
        top: 0,
        width: 2,
        height: 2,
    };
    let planes = vec![
        Plane::new(3, 3, vec![1.0; 9]).unwrap(),
        Plane::new(3, 3, vec![2.0; 9]).unwrap(),
    ];
    ChannelVolume::from_planes(1, planes, &roi.mask(3, 3), Calibration::default()).unwrap()
}

/// `sh -c SCRIPT` receives the volume and parameter paths as `$0` and `$1`.
fn shell(script: &str) -> CommandDetector {
    CommandDetector::new("sh").with_args(vec!["-c".into(), script.into()])
}

#[test]
fn reads_spot_count_from_stdout() {
    let d = shell("echo 'Starting detection'; echo 17");
    assert_eq!(
        d.detect(&volume(), &DetectionParameters::default()).unwrap(),
        Detection::Spots(17)
    );
}

#[test]
fn passes_existing_volume_and_parameter_files() {
    let d = shell(r#"test -s "$0" && grep -q '"radius": 0.35' "$1" && echo 1"#);
    assert_eq!(
        d.detect(&volume(), &DetectionParameters::default()).unwrap(),
        Detection::Spots(1)
    );
}

#[test]
fn empty_collection_is_zero_even_on_failure_status() {
    let d = shell("echo '[SparseLAPTracker] The spot collection is empty.' >&2; exit 1");
    let params = DetectionParameters::default();
    assert_eq!(d.detect(&volume(), &params).unwrap(), Detection::Empty);
    assert_eq!(count_spots(&d, &volume(), &params).unwrap(), 0);
}

#[test]
fn other_failures_carry_the_diagnostic() {
    let d = shell("echo 'Detector settings invalid: RADIUS' >&2; exit 3");
    let err = d
        .detect(&volume(), &DetectionParameters::default())
        .unwrap_err();
    match err {
        CountError::Detection(msg) => assert_eq!(msg, "Detector settings invalid: RADIUS"),
        other => panic!("unexpected error {other:?}"),
    }
}

#[test]
fn missing_program_is_fatal() {
    let d = CommandDetector::new("/nonexistent/spot-detector");
    assert!(matches!(
        d.detect(&volume(), &DetectionParameters::default()),
        Err(CountError::Detection(_))
    ));
}
