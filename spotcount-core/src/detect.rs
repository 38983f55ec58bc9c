use tracing::{info, warn};

use crate::error::Result;
use crate::params::DetectionParameters;
use crate::volume::ChannelVolume;

/// Result of one detection run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detection {
    Spots(u64),
    /// The linking stage had nothing to link. Counts as zero spots.
    Empty,
}

/// Blob detection plus depth-wise linking, supplied from outside this crate.
/// Any `Err` is fatal for the whole run.
pub trait SpotDetector {
    fn detect(&self, volume: &ChannelVolume, params: &DetectionParameters) -> Result<Detection>;
}

/// Run the detector and turn its outcome into a spot count.
pub fn count_spots(
    detector: &dyn SpotDetector,
    volume: &ChannelVolume,
    params: &DetectionParameters,
) -> Result<u64> {
    match detector.detect(volume, params)? {
        Detection::Spots(n) => {
            info!(channel = volume.channel, "Found {n} spots");
            Ok(n)
        }
        Detection::Empty => {
            warn!(channel = volume.channel, "spot collection is empty, counting 0");
            Ok(0)
        }
    }
}
