/// Planar region of interest in pixel coordinates of the image it belongs to.
#[derive(Clone, Debug, PartialEq)]
pub enum Roi {
    Rectangle {
        left: i32,
        top: i32,
        width: u32,
        height: u32,
    },
    /// Ellipse inscribed in the given bounding box.
    Oval {
        left: f64,
        top: f64,
        width: f64,
        height: f64,
    },
    /// Closed polygon; also used for freehand and traced outlines.
    Polygon { points: Vec<(f64, f64)> },
    /// Several closed outlines filled with the even-odd rule, so inner
    /// rings cut holes and disjoint rings add up.
    Composite { rings: Vec<Vec<(f64, f64)>> },
}

impl Roi {
    pub fn kind(&self) -> &'static str {
        match self {
            Roi::Rectangle { .. } => "rectangle",
            Roi::Oval { .. } => "oval",
            Roi::Polygon { .. } => "polygon",
            Roi::Composite { .. } => "composite",
        }
    }

    /// Rasterize onto a `width` x `height` image, sampling pixel centres.
    /// Parts of the ROI outside the image are dropped.
    pub fn mask(&self, width: u32, height: u32) -> RoiMask {
        let mut bits = vec![false; width as usize * height as usize];
        let w = width as usize;
        match self {
            Roi::Rectangle {
                left,
                top,
                width: rw,
                height: rh,
            } => {
                let x0 = (*left).max(0) as i64;
                let y0 = (*top).max(0) as i64;
                let x1 = (*left as i64 + *rw as i64).min(width as i64);
                let y1 = (*top as i64 + *rh as i64).min(height as i64);
                for y in y0..y1.max(y0) {
                    for x in x0..x1.max(x0) {
                        bits[y as usize * w + x as usize] = true;
                    }
                }
            }
            Roi::Oval {
                left,
                top,
                width: ow,
                height: oh,
            } => {
                let (a, b) = (ow / 2.0, oh / 2.0);
                if a > 0.0 && b > 0.0 {
                    let (cx, cy) = (left + a, top + b);
                    for y in 0..height as usize {
                        let dy = (y as f64 + 0.5 - cy) / b;
                        for x in 0..w {
                            let dx = (x as f64 + 0.5 - cx) / a;
                            if dx * dx + dy * dy <= 1.0 {
                                bits[y * w + x] = true;
                            }
                        }
                    }
                }
            }
            Roi::Polygon { points } => {
                fill_even_odd(&mut bits, width, height, std::slice::from_ref(points))
            }
            Roi::Composite { rings } => fill_even_odd(&mut bits, width, height, rings),
        }
        RoiMask {
            width,
            height,
            bits,
        }
    }

    /// Number of image pixels covered by the ROI.
    pub fn pixel_area(&self, width: u32, height: u32) -> u64 {
        self.mask(width, height).count()
    }
}

fn fill_even_odd(bits: &mut [bool], width: u32, height: u32, rings: &[Vec<(f64, f64)>]) {
    let w = width as usize;
    for y in 0..height as usize {
        let py = y as f64 + 0.5;
        for x in 0..w {
            let px = x as f64 + 0.5;
            let crossings = rings
                .iter()
                .filter(|r| r.len() >= 3 && crosses_odd(r, px, py))
                .count();
            if crossings % 2 == 1 {
                bits[y * w + x] = true;
            }
        }
    }
}

fn crosses_odd(points: &[(f64, f64)], px: f64, py: f64) -> bool {
    let mut inside = false;
    let mut j = points.len() - 1;
    for i in 0..points.len() {
        let (xi, yi) = points[i];
        let (xj, yj) = points[j];
        if (yi > py) != (yj > py) && px < (xj - xi) * (py - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Per-pixel inside/outside flags for one image plane.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RoiMask {
    width: u32,
    height: u32,
    bits: Vec<bool>,
}

impl RoiMask {
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn bits(&self) -> &[bool] {
        &self.bits
    }

    pub fn count(&self) -> u64 {
        self.bits.iter().filter(|b| **b).count() as u64
    }
}
