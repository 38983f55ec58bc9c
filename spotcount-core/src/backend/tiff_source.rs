use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::Path;

use tiff::ColorType;
use tiff::decoder::ifd::Value;
use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::encoder::{Rational, TiffEncoder, colortype};
use tiff::tags::{ResolutionUnit, Tag};
use tracing::{debug, warn};

use super::hyperstack::{
    Description, TAG_IJ_META, TAG_IJ_META_COUNTS, layout_planes, roi_from_metadata,
};
use crate::error::{CountError, Result};
use crate::image::{Calibration, Dimensions, ImageSource, OpenImage};
use crate::roi::Roi;
use crate::roi::ijroi::{self, Decoded};
use crate::volume::{ChannelVolume, Plane};

/// Opens (ImageJ) TIFF stacks. The ROI comes from the embedded ImageJ
/// metadata or, failing that, from a `<name>.roi` file beside the image.
#[derive(Clone, Copy, Debug, Default)]
pub struct TiffSource;

pub struct TiffImage {
    dims: Dimensions,
    calibration: Calibration,
    roi: Option<Roi>,
    /// ImageJ order: `planes[slice * channels + channel]`, first frame only.
    planes: Vec<Plane>,
}

impl ImageSource for TiffSource {
    fn open(&self, path: &Path) -> Result<Box<dyn OpenImage>> {
        Ok(Box::new(TiffImage::read(path)?))
    }
}

impl TiffImage {
    pub fn read(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let mut dec = Decoder::new(BufReader::new(file))?.with_limits(Limits::unlimited());

        let description = match dec.find_tag(Tag::ImageDescription)? {
            Some(v) => Description::parse(&v.into_string()?)?,
            None => None,
        };
        let calibration = read_calibration(&mut dec, description.as_ref())?;
        let embedded_roi = read_embedded_roi(&mut dec)?;

        let (width, height) = dec.dimensions()?;
        let mut planes = Vec::new();
        let mut samples = 1u32;
        loop {
            let (w, h) = dec.dimensions()?;
            if (w, h) != (width, height) {
                return Err(CountError::Format(format!(
                    "page {} is {w}x{h}, first page is {width}x{height}",
                    planes.len() as u32 / samples + 1
                )));
            }
            samples = samples_per_pixel(dec.colortype()?)?;
            let data = to_f32(dec.read_image()?)?;
            split_samples(&mut planes, data, width, height, samples)?;
            if !dec.more_images() {
                break;
            }
            dec.next_image()?;
        }
        let pages = planes.len() as u32 / samples;

        let (channels, slices, frames) = match (&description, samples) {
            (_, s) if s > 1 => (s, pages, 1),
            (Some(d), _) => (d.channels, d.slices, d.frames),
            (None, _) => (1, pages, 1),
        };
        let needed = layout_planes(channels, slices, 1)? as usize;
        if (planes.len() as u64) < layout_planes(channels, slices, frames)? {
            return Err(CountError::Format(format!(
                "{}: metadata declares {channels} channel(s) x {slices} slice(s) x {frames} frame(s) but the file holds {} plane(s)",
                path.display(),
                planes.len()
            )));
        }
        planes.truncate(needed);

        let roi = match embedded_roi {
            Some(bytes) => decode_roi(path, &bytes)?,
            None => read_sidecar_roi(path)?,
        };

        debug!(
            path = %path.display(),
            width, height, channels, slices, frames,
            roi = roi.as_ref().map(|r| r.kind()).unwrap_or("none"),
            "opened TIFF"
        );
        Ok(Self {
            dims: Dimensions {
                width,
                height,
                channels,
                slices,
                frames,
            },
            calibration,
            roi,
            planes,
        })
    }
}

impl OpenImage for TiffImage {
    fn dimensions(&self) -> Dimensions {
        self.dims
    }

    fn calibration(&self) -> &Calibration {
        &self.calibration
    }

    fn roi(&self) -> Option<&Roi> {
        self.roi.as_ref()
    }

    fn plane(&self, channel: u32, slice: u32) -> Result<Plane> {
        let Dimensions {
            channels, slices, ..
        } = self.dims;
        if channel == 0 || channel > channels || slice == 0 || slice > slices {
            return Err(CountError::Config(format!(
                "plane c={channel} z={slice} outside {channels} channel(s) x {slices} slice(s)"
            )));
        }
        let idx = ((slice - 1) * channels + (channel - 1)) as usize;
        Ok(self.planes[idx].clone())
    }
}

fn read_calibration<R: std::io::Read + std::io::Seek>(
    dec: &mut Decoder<R>,
    description: Option<&Description>,
) -> Result<Calibration> {
    let xres = rational(dec.find_tag(Tag::XResolution)?);
    let yres = rational(dec.find_tag(Tag::YResolution)?).or(xres);
    let res_unit = match dec.find_tag(Tag::ResolutionUnit)? {
        Some(v) => Some(v.into_u16()?),
        None => None,
    };
    let unit = description
        .and_then(|d| d.unit.clone())
        .or_else(|| match res_unit {
            Some(2) => Some("inch".to_string()),
            Some(3) => Some("cm".to_string()),
            _ => None,
        });
    let pixel_depth = description.and_then(|d| d.spacing).unwrap_or(1.0);

    match (xres, yres, unit) {
        (Some(x), Some(y), Some(unit)) => Ok(Calibration {
            pixel_width: 1.0 / x,
            pixel_height: 1.0 / y,
            pixel_depth,
            unit,
        }),
        _ => Ok(Calibration::default()),
    }
}

fn rational(v: Option<Value>) -> Option<f64> {
    match v? {
        Value::Rational(n, d) if n > 0 && d > 0 => Some(n as f64 / d as f64),
        Value::List(items) => rational(items.into_iter().next()),
        _ => None,
    }
}

fn read_embedded_roi<R: std::io::Read + std::io::Seek>(
    dec: &mut Decoder<R>,
) -> Result<Option<Vec<u8>>> {
    let counts = match dec.find_tag(Tag::Unknown(TAG_IJ_META_COUNTS))? {
        Some(v) => v.into_u32_vec()?,
        None => return Ok(None),
    };
    let data = match dec.find_tag(Tag::Unknown(TAG_IJ_META))? {
        Some(v) => v.into_u8_vec()?,
        None => return Ok(None),
    };
    roi_from_metadata(&counts, &data)
}

fn read_sidecar_roi(path: &Path) -> Result<Option<Roi>> {
    let sidecar = path.with_extension("roi");
    if !sidecar.is_file() {
        return Ok(None);
    }
    let bytes = fs::read(&sidecar)?;
    decode_roi(&sidecar, &bytes)
}

fn decode_roi(origin: &Path, bytes: &[u8]) -> Result<Option<Roi>> {
    match ijroi::decode(bytes)? {
        Decoded::Shape(roi) => Ok(Some(roi)),
        Decoded::NoArea(kind) => {
            warn!(path = %origin.display(), kind, "ROI has no area; ignoring it");
            Ok(None)
        }
    }
}

fn samples_per_pixel(ct: ColorType) -> Result<u32> {
    match ct {
        ColorType::Gray(_) => Ok(1),
        ColorType::GrayA(_) => Ok(2),
        ColorType::RGB(_) => Ok(3),
        ColorType::RGBA(_) | ColorType::CMYK(_) => Ok(4),
        other => Err(CountError::Format(format!(
            "unsupported TIFF color type {other:?}"
        ))),
    }
}

fn to_f32(result: DecodingResult) -> Result<Vec<f32>> {
    Ok(match result {
        DecodingResult::U8(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U16(v) => v.into_iter().map(f32::from).collect(),
        DecodingResult::U32(v) => v.into_iter().map(|x| x as f32).collect(),
        DecodingResult::F32(v) => v,
        DecodingResult::F64(v) => v.into_iter().map(|x| x as f32).collect(),
        _ => {
            return Err(CountError::Format(
                "unsupported TIFF sample format (signed or 64-bit integer)".into(),
            ));
        }
    })
}

/// Append one page, de-interleaving multi-sample pixels into one plane per sample.
fn split_samples(
    planes: &mut Vec<Plane>,
    data: Vec<f32>,
    width: u32,
    height: u32,
    samples: u32,
) -> Result<()> {
    if samples == 1 {
        planes.push(Plane::new(width, height, data)?);
        return Ok(());
    }
    let s = samples as usize;
    for k in 0..s {
        let plane: Vec<f32> = data.iter().skip(k).step_by(s).copied().collect();
        planes.push(Plane::new(width, height, plane)?);
    }
    Ok(())
}

/// Write 32-bit float planes as an ImageJ stack. `planes` must be in
/// ImageJ order (`slice * channels + channel`).
pub fn write_stack<'p>(
    path: &Path,
    width: u32,
    height: u32,
    channels: u32,
    calibration: &Calibration,
    planes: impl IntoIterator<Item = &'p [f32]>,
) -> Result<()> {
    let planes: Vec<&[f32]> = planes.into_iter().collect();
    if channels == 0 || planes.len() % channels as usize != 0 {
        return Err(CountError::Format(format!(
            "{} plane(s) do not split into {channels} channel(s)",
            planes.len()
        )));
    }
    let slices = planes.len() as u32 / channels;
    let description = Description::render(
        channels,
        slices,
        &calibration.unit,
        calibration.pixel_depth,
    );

    let mut enc = TiffEncoder::new(BufWriter::new(File::create(path)?))?;
    for (i, data) in planes.into_iter().enumerate() {
        let mut image = enc.new_image::<colortype::Gray32Float>(width, height)?;
        if i == 0 {
            image
                .encoder()
                .write_tag(Tag::ImageDescription, description.as_str())?;
        }
        image.x_resolution(per_unit(calibration.pixel_width));
        image.y_resolution(per_unit(calibration.pixel_height));
        image.resolution_unit(ResolutionUnit::None);
        image.write_data(data)?;
    }
    Ok(())
}

/// Write a masked channel volume as a single-channel ImageJ stack.
pub fn write_volume(path: &Path, volume: &ChannelVolume) -> Result<()> {
    write_stack(
        path,
        volume.width,
        volume.height,
        1,
        &volume.calibration,
        (0..volume.depth).map(|z| volume.slice(z)),
    )
}

fn per_unit(pixel_size: f64) -> Rational {
    const DENOM: u32 = 1_000_000;
    let ppu = 1.0 / pixel_size;
    if !ppu.is_finite() || ppu <= 0.0 || ppu * DENOM as f64 > u32::MAX as f64 {
        return Rational { n: 1, d: 1 };
    }
    Rational {
        n: (ppu * DENOM as f64).round() as u32,
        d: DENOM,
    }
}
