//! Decoder for the ImageJ binary ROI format (`Iout` header), as found in
//! `.roi` files and in the `roi ` entry of a TIFF's ImageJ metadata.
//! All multi-byte fields are big-endian.

use super::shape::Roi;
use crate::error::{CountError, Result};

const MAGIC: &[u8; 4] = b"Iout";
const HEADER_LEN: usize = 64;

const OFF_VERSION: usize = 4;
const OFF_TYPE: usize = 6;
const OFF_TOP: usize = 8;
const OFF_LEFT: usize = 10;
const OFF_BOTTOM: usize = 12;
const OFF_RIGHT: usize = 14;
const OFF_N_COORDS: usize = 16;
/// 32-bit coordinate count, used when the 16-bit one above is 0.
const OFF_SIZE: usize = 18;
const OFF_SHAPE_ROI_SIZE: usize = 36;
const OFF_OPTIONS: usize = 50;

const OPT_SUB_PIXEL: u16 = 128;

// path segment codes of a composite (shape) ROI
const SEG_MOVE: u32 = 0;
const SEG_LINE: u32 = 1;
const SEG_QUAD: u32 = 2;
const SEG_CUBIC: u32 = 3;
const SEG_CLOSE: u32 = 4;
const CURVE_STEPS: usize = 8;

/// Outcome of decoding a ROI blob.
#[derive(Clone, Debug, PartialEq)]
pub enum Decoded {
    Shape(Roi),
    /// Well-formed ROI without a planar area (line, point, angle).
    NoArea(&'static str),
}

pub fn decode(bytes: &[u8]) -> Result<Decoded> {
    if bytes.len() < HEADER_LEN || &bytes[..4] != MAGIC {
        return Err(CountError::Format("not an ImageJ ROI (missing Iout header)".into()));
    }
    let version = be_u16(bytes, OFF_VERSION);
    let roi_type = bytes[OFF_TYPE];
    let top = be_i16(bytes, OFF_TOP) as i32;
    let left = be_i16(bytes, OFF_LEFT) as i32;
    let bottom = be_i16(bytes, OFF_BOTTOM) as i32;
    let right = be_i16(bytes, OFF_RIGHT) as i32;
    let n = match be_u16(bytes, OFF_N_COORDS) {
        0 => be_u32(bytes, OFF_SIZE) as usize,
        n => n as usize,
    };
    let options = be_u16(bytes, OFF_OPTIONS);
    let width = (right - left).max(0);
    let height = (bottom - top).max(0);

    let shape_len = be_u32(bytes, OFF_SHAPE_ROI_SIZE) as usize;
    if shape_len > 0 {
        let rings = read_shape(bytes, shape_len, left, top)?;
        return Ok(Decoded::Shape(Roi::Composite { rings }));
    }

    match roi_type {
        1 => Ok(Decoded::Shape(Roi::Rectangle {
            left,
            top,
            width: width as u32,
            height: height as u32,
        })),
        2 => Ok(Decoded::Shape(Roi::Oval {
            left: left as f64,
            top: top as f64,
            width: width as f64,
            height: height as f64,
        })),
        0 | 7 | 8 => {
            let sub_pixel = options & OPT_SUB_PIXEL != 0 && version >= 222;
            let points = read_points(bytes, n, left, top, sub_pixel)?;
            Ok(Decoded::Shape(Roi::Polygon { points }))
        }
        3 => Ok(Decoded::NoArea("line")),
        4 => Ok(Decoded::NoArea("freeline")),
        5 => Ok(Decoded::NoArea("polyline")),
        6 => Ok(Decoded::NoArea("no-roi")),
        9 => Ok(Decoded::NoArea("angle")),
        10 => Ok(Decoded::NoArea("point")),
        other => Err(CountError::Format(format!("unknown ROI type {other}"))),
    }
}

fn read_points(
    bytes: &[u8],
    n: usize,
    left: i32,
    top: i32,
    sub_pixel: bool,
) -> Result<Vec<(f64, f64)>> {
    let per_point = if sub_pixel { 12 } else { 4 };
    let need = n
        .checked_mul(per_point)
        .and_then(|b| b.checked_add(HEADER_LEN));
    if need.is_none_or(|need| bytes.len() < need) {
        return Err(CountError::Format(format!(
            "ROI declares {n} coordinates but holds {} bytes",
            bytes.len()
        )));
    }
    let int_end = HEADER_LEN + 4 * n;
    let mut points = Vec::with_capacity(n);
    if sub_pixel {
        // absolute float coordinates follow the integer block
        let xs = int_end;
        let ys = int_end + 4 * n;
        for i in 0..n {
            let x = f32::from_bits(be_u32(bytes, xs + 4 * i)) as f64;
            let y = f32::from_bits(be_u32(bytes, ys + 4 * i)) as f64;
            points.push((x, y));
        }
    } else {
        let xs = HEADER_LEN;
        let ys = HEADER_LEN + 2 * n;
        for i in 0..n {
            let x = be_i16(bytes, xs + 2 * i) as i32 + left;
            let y = be_i16(bytes, ys + 2 * i) as i32 + top;
            points.push((x as f64, y as f64));
        }
    }
    Ok(points)
}

/// Flatten the float path of a composite ROI into closed rings.
fn read_shape(bytes: &[u8], len: usize, left: i32, top: i32) -> Result<Vec<Vec<(f64, f64)>>> {
    let end = len.checked_mul(4).and_then(|b| b.checked_add(HEADER_LEN));
    if end.is_none_or(|end| bytes.len() < end) {
        return Err(CountError::Format(format!(
            "composite ROI declares {len} path values but holds {} bytes",
            bytes.len()
        )));
    }
    let values: Vec<f64> = (0..len)
        .map(|i| f32::from_bits(be_u32(bytes, HEADER_LEN + 4 * i)) as f64)
        .collect();

    let mut rings = Vec::new();
    let mut ring: Vec<(f64, f64)> = Vec::new();
    let mut i = 0;
    while i < values.len() {
        let seg = values[i] as u32;
        let argc = match seg {
            SEG_MOVE | SEG_LINE => Some(2),
            SEG_QUAD => Some(4),
            SEG_CUBIC => Some(6),
            SEG_CLOSE => Some(0),
            _ => None,
        }
        .filter(|_| seg as f64 == values[i])
        .ok_or_else(|| {
            CountError::Format(format!("composite ROI has unknown path segment {}", values[i]))
        })?;
        let args = values.get(i + 1..i + 1 + argc).ok_or_else(|| {
            CountError::Format("composite ROI path ends inside a segment".into())
        })?;
        let from = ring.last().copied().unwrap_or((0.0, 0.0));
        match seg {
            SEG_MOVE => {
                close_ring(&mut rings, &mut ring);
                ring.push((args[0], args[1]));
            }
            SEG_LINE => ring.push((args[0], args[1])),
            SEG_QUAD => {
                let (c, p) = ((args[0], args[1]), (args[2], args[3]));
                for k in 1..=CURVE_STEPS {
                    let t = k as f64 / CURVE_STEPS as f64;
                    let u = 1.0 - t;
                    ring.push((
                        u * u * from.0 + 2.0 * u * t * c.0 + t * t * p.0,
                        u * u * from.1 + 2.0 * u * t * c.1 + t * t * p.1,
                    ));
                }
            }
            SEG_CUBIC => {
                let (c1, c2, p) = ((args[0], args[1]), (args[2], args[3]), (args[4], args[5]));
                for k in 1..=CURVE_STEPS {
                    let t = k as f64 / CURVE_STEPS as f64;
                    let u = 1.0 - t;
                    let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
                    ring.push((
                        a * from.0 + b * c1.0 + c * c2.0 + d * p.0,
                        a * from.1 + b * c1.1 + c * c2.1 + d * p.1,
                    ));
                }
            }
            _ => close_ring(&mut rings, &mut ring),
        }
        i += 1 + argc;
    }
    close_ring(&mut rings, &mut ring);

    // older writers store the path relative to the bounding box
    let min = rings
        .iter()
        .flatten()
        .fold((f64::INFINITY, f64::INFINITY), |m, p| (m.0.min(p.0), m.1.min(p.1)));
    if min.0.abs() <= 1.0 && min.1.abs() <= 1.0 && (left, top) != (0, 0) {
        for p in rings.iter_mut().flatten() {
            p.0 += left as f64;
            p.1 += top as f64;
        }
    }
    Ok(rings)
}

fn close_ring(rings: &mut Vec<Vec<(f64, f64)>>, ring: &mut Vec<(f64, f64)>) {
    let done = std::mem::take(ring);
    if done.len() >= 3 {
        rings.push(done);
    }
}

fn be_u16(b: &[u8], off: usize) -> u16 {
    u16::from_be_bytes([b[off], b[off + 1]])
}

fn be_i16(b: &[u8], off: usize) -> i16 {
    i16::from_be_bytes([b[off], b[off + 1]])
}

fn be_u32(b: &[u8], off: usize) -> u32 {
    u32::from_be_bytes([b[off], b[off + 1], b[off + 2], b[off + 3]])
}
