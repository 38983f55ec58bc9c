use std::path::Path;

use crate::error::Result;
use crate::roi::Roi;
use crate::volume::Plane;

/// Physical size of one voxel.
#[derive(Clone, Debug, PartialEq)]
pub struct Calibration {
    pub pixel_width: f64,
    pub pixel_height: f64,
    pub pixel_depth: f64,
    pub unit: String,
}

impl Default for Calibration {
    fn default() -> Self {
        Self {
            pixel_width: 1.0,
            pixel_height: 1.0,
            pixel_depth: 1.0,
            unit: "pixel".into(),
        }
    }
}

impl Calibration {
    /// Convert a pixel count to a physical area.
    pub fn area(&self, pixels: u64) -> f64 {
        pixels as f64 * self.pixel_width * self.pixel_height
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
    pub channels: u32,
    pub slices: u32,
    pub frames: u32,
}

/// An opened multi-channel volumetric image. Resources are released on drop.
pub trait OpenImage {
    fn dimensions(&self) -> Dimensions;

    fn calibration(&self) -> &Calibration;

    /// ROI stored with the image, if any.
    fn roi(&self) -> Option<&Roi>;

    /// Plane for a 1-based channel and slice, first frame.
    fn plane(&self, channel: u32, slice: u32) -> Result<Plane>;

    /// Physical area of the stored ROI.
    fn roi_area(&self) -> Option<f64> {
        let dims = self.dimensions();
        self.roi()
            .map(|r| self.calibration().area(r.pixel_area(dims.width, dims.height)))
    }
}

pub trait ImageSource {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenImage>>;
}
