//! ImageJ hyperstack metadata: the `ImageDescription` key/value block and
//! the `IJMetadata` private TIFF tags.

use crate::error::{CountError, Result};

pub const TAG_IJ_META_COUNTS: u16 = 50838;
pub const TAG_IJ_META: u16 = 50839;

const IJ_MAGIC: u32 = 0x494a_494a; // "IJIJ"
const TYPE_ROI: u32 = 0x726f_6920; // "roi "

/// Fields of an ImageJ `ImageDescription` that matter for stack layout.
#[derive(Clone, Debug, PartialEq)]
pub struct Description {
    pub images: Option<u32>,
    pub channels: u32,
    pub slices: u32,
    pub frames: u32,
    pub unit: Option<String>,
    pub spacing: Option<f64>,
}

impl Description {
    /// Parse `key=value` lines. Returns `None` unless the text starts with `ImageJ=`.
    pub fn parse(text: &str) -> Result<Option<Self>> {
        if !text.starts_with("ImageJ=") {
            return Ok(None);
        }
        let mut d = Description {
            images: None,
            channels: 1,
            slices: 1,
            frames: 1,
            unit: None,
            spacing: None,
        };
        for line in text.lines() {
            let Some((k, v)) = line.split_once('=') else {
                continue;
            };
            let v = v.trim();
            match k.trim() {
                "images" => d.images = v.parse().ok(),
                "channels" => d.channels = v.parse().unwrap_or(1).max(1),
                "slices" => d.slices = v.parse().unwrap_or(1).max(1),
                "frames" => d.frames = v.parse().unwrap_or(1).max(1),
                "unit" => d.unit = Some(normalize_unit(v)),
                "spacing" => d.spacing = v.parse().ok(),
                _ => {}
            }
        }
        // plain stacks only carry `images=`
        if d.plane_count()? == 1 {
            if let Some(n) = d.images {
                d.slices = n.max(1);
            }
        }
        Ok(Some(d))
    }

    /// `channels * slices * frames`, rejecting layouts no file can hold.
    pub fn plane_count(&self) -> Result<u64> {
        layout_planes(self.channels, self.slices, self.frames)
    }

    /// Inverse of [`Description::parse`] for a single-frame stack. The
    /// tag is ASCII, so `µm` is written as `micron`.
    pub fn render(channels: u32, slices: u32, unit: &str, spacing: f64) -> String {
        let unit = if unit == "µm" { "micron" } else { unit };
        let images = channels as u64 * slices as u64;
        let mut s = format!("ImageJ=1.54f\nimages={images}\n");
        if channels > 1 {
            s.push_str(&format!("channels={channels}\n"));
        }
        s.push_str(&format!("slices={slices}\n"));
        if channels > 1 {
            s.push_str("hyperstack=true\nmode=grayscale\n");
        }
        s.push_str(&format!("unit={unit}\nspacing={spacing}\nloop=false\n"));
        s
    }
}

pub fn layout_planes(channels: u32, slices: u32, frames: u32) -> Result<u64> {
    (channels as u64)
        .checked_mul(slices as u64)
        .and_then(|n| n.checked_mul(frames as u64))
        .filter(|n| *n <= u32::MAX as u64)
        .ok_or_else(|| {
            CountError::Format(format!(
                "ImageJ layout {channels} channel(s) x {slices} slice(s) x {frames} frame(s) is too large"
            ))
        })
}

fn normalize_unit(raw: &str) -> String {
    match raw {
        "micron" | "\\u00B5m" => "µm".into(),
        other => other.to_string(),
    }
}

/// Pull the first `roi ` payload out of the ImageJ metadata tags.
///
/// `counts[0]` is the header size; each later count is the size of one
/// data block, in the order the header lists its (type, count) pairs.
pub fn roi_from_metadata(counts: &[u32], data: &[u8]) -> Result<Option<Vec<u8>>> {
    if counts.is_empty() || data.len() < 4 {
        return Ok(None);
    }
    let big_endian = match u32::from_be_bytes([data[0], data[1], data[2], data[3]]) {
        IJ_MAGIC => true,
        m if m.swap_bytes() == IJ_MAGIC => false,
        _ => return Ok(None),
    };
    let read_u32 = |off: usize| -> Result<u32> {
        let b: [u8; 4] = data
            .get(off..off + 4)
            .and_then(|s| s.try_into().ok())
            .ok_or_else(|| CountError::Format("truncated ImageJ metadata header".into()))?;
        Ok(if big_endian {
            u32::from_be_bytes(b)
        } else {
            u32::from_le_bytes(b)
        })
    };

    let header_len = counts[0] as usize;
    let mut entry_types = Vec::new();
    let mut off = 4;
    while off + 8 <= header_len {
        let kind = read_u32(off)?;
        let n = read_u32(off + 4)?;
        for _ in 0..n {
            entry_types.push(kind);
        }
        off += 8;
    }

    let mut pos = header_len;
    for (kind, len) in entry_types.iter().zip(&counts[1..]) {
        let len = *len as usize;
        let block = data.get(pos..pos + len).ok_or_else(|| {
            CountError::Format("ImageJ metadata block runs past the tag data".into())
        })?;
        if *kind == TYPE_ROI {
            return Ok(Some(block.to_vec()));
        }
        pos += len;
    }
    Ok(None)
}
