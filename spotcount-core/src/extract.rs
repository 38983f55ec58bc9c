use tracing::debug;

use crate::error::{CountError, Result};
use crate::image::OpenImage;
use crate::roi::Roi;
use crate::volume::ChannelVolume;

/// Produces the single-channel, ROI-masked volume the detector works on.
/// Implementations must leave the source image untouched.
pub trait VolumeExtractor {
    fn extract(&self, image: &dyn OpenImage, channel: u32, roi: &Roi) -> Result<ChannelVolume>;
}

/// Copies every slice of one channel and zeroes voxels outside the ROI.
/// The same 2-D mask is applied to every slice.
#[derive(Clone, Copy, Debug, Default)]
pub struct MaskingExtractor;

impl VolumeExtractor for MaskingExtractor {
    fn extract(&self, image: &dyn OpenImage, channel: u32, roi: &Roi) -> Result<ChannelVolume> {
        let dims = image.dimensions();
        if channel == 0 || channel > dims.channels {
            return Err(CountError::Config(format!(
                "channel {channel} requested but the image has {} channel(s)",
                dims.channels
            )));
        }
        let mask = roi.mask(dims.width, dims.height);
        let planes = (1..=dims.slices)
            .map(|z| image.plane(channel, z))
            .collect::<Result<Vec<_>>>()?;
        debug!(
            channel,
            slices = dims.slices,
            inside = mask.count(),
            "extracted masked channel"
        );
        ChannelVolume::from_planes(channel, planes, &mask, image.calibration().clone())
    }
}
