use crate::error::{CountError, Result};
use crate::image::Calibration;
use crate::roi::RoiMask;

/// One 2-D plane of samples, row-major.
#[derive(Clone, Debug, PartialEq)]
pub struct Plane {
    pub width: u32,
    pub height: u32,
    pub data: Vec<f32>,
}

impl Plane {
    pub fn new(width: u32, height: u32, data: Vec<f32>) -> Result<Self> {
        let want = width as usize * height as usize;
        if data.len() != want {
            return Err(CountError::Format(format!(
                "plane of {width}x{height} needs {want} samples, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }
}

/// Single-channel, full-depth volume with everything outside the ROI set
/// to zero. Single use: handed to the detector and dropped.
#[derive(Clone, Debug, PartialEq)]
pub struct ChannelVolume {
    pub channel: u32,
    pub width: u32,
    pub height: u32,
    pub depth: u32,
    pub calibration: Calibration,
    /// Slice-major voxels: `voxels[z * width * height + y * width + x]`.
    pub voxels: Vec<f32>,
}

impl ChannelVolume {
    /// Stack planes into a volume and clear every voxel outside `mask`.
    pub fn from_planes(
        channel: u32,
        planes: Vec<Plane>,
        mask: &RoiMask,
        calibration: Calibration,
    ) -> Result<Self> {
        let (width, height) = (mask.width(), mask.height());
        let depth = planes.len() as u32;
        let mut voxels = Vec::with_capacity(width as usize * height as usize * planes.len());
        for (z, plane) in planes.into_iter().enumerate() {
            if plane.width != width || plane.height != height {
                return Err(CountError::Format(format!(
                    "slice {} is {}x{}, expected {width}x{height}",
                    z + 1,
                    plane.width,
                    plane.height
                )));
            }
            voxels.extend(
                plane
                    .data
                    .into_iter()
                    .zip(mask.bits())
                    .map(|(v, &inside)| if inside { v } else { 0.0 }),
            );
        }
        Ok(Self {
            channel,
            width,
            height,
            depth,
            calibration,
            voxels,
        })
    }

    pub fn slice(&self, z: u32) -> &[f32] {
        let n = self.width as usize * self.height as usize;
        let start = z as usize * n;
        &self.voxels[start..start + n]
    }
}
