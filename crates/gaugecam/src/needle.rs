//! Needle segmentation within the masked sector.
//!
//! The needle is assumed to be a light pointer against a darker face: the
//! masked frame is thresholded for near-white pixels in HSV, the bright
//! pixels are grouped into 8-connected regions, and the largest region's
//! area-weighted centroid stands in for the needle tip.

use image::{GrayImage, Rgb, RgbImage};
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

/// Inclusive HSV threshold window, OpenCV ranges: H in [0, 180],
/// S and V in [0, 255].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct HsvRange {
    pub h_min: u8,
    pub h_max: u8,
    pub s_min: u8,
    pub s_max: u8,
    pub v_min: u8,
    pub v_max: u8,
}

impl Default for HsvRange {
    fn default() -> Self {
        // near-white
        Self {
            h_min: 0,
            h_max: 180,
            s_min: 0,
            s_max: 30,
            v_min: 200,
            v_max: 255,
        }
    }
}

impl HsvRange {
    pub fn contains(&self, (h, s, v): (u8, u8, u8)) -> bool {
        (self.h_min..=self.h_max).contains(&h)
            && (self.s_min..=self.s_max).contains(&s)
            && (self.v_min..=self.v_max).contains(&v)
    }
}

/// RGB to HSV with OpenCV conventions: H in [0, 180), S and V in [0, 255].
pub fn rgb_to_hsv(pixel: Rgb<u8>) -> (u8, u8, u8) {
    let (r, g, b) = (pixel[0] as f32, pixel[1] as f32, pixel[2] as f32);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let v = max;
    let s = if max > 0.0 { 255.0 * delta / max } else { 0.0 };
    let h_deg = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta) + 120.0
    } else {
        60.0 * ((r - g) / delta) + 240.0
    };
    let h = h_deg.rem_euclid(360.0) / 2.0;
    (h.round() as u8, s.round() as u8, v.round() as u8)
}

/// Binary mask (0 / 255) of pixels inside the HSV window.
pub fn threshold_mask(frame: &RgbImage, range: &HsvRange) -> GrayImage {
    let (w, h) = frame.dimensions();
    let mut mask = GrayImage::new(w, h);
    for (x, y, pixel) in frame.enumerate_pixels() {
        if range.contains(rgb_to_hsv(*pixel)) {
            mask.put_pixel(x, y, image::Luma([255]));
        }
    }
    mask
}

/// A connected bright region accumulating its image moments as it grows.
#[derive(Debug, Clone, Default)]
pub struct Region {
    /// Number of member pixels.
    pub pixel_count: usize,
    /// Zeroth moment: sum of pixel weights.
    pub m00: f64,
    /// First moments: sum of x*weight and y*weight.
    pub m10: f64,
    pub m01: f64,
}

impl Region {
    fn push(&mut self, x: u32, y: u32, weight: f64) {
        self.pixel_count += 1;
        self.m00 += weight;
        self.m10 += x as f64 * weight;
        self.m01 += y as f64 * weight;
    }

    /// Area-weighted centroid; `None` when the zeroth moment is zero
    /// (degenerate region), so no division fault can occur downstream.
    pub fn centroid(&self) -> Option<Point2<f32>> {
        if self.m00 == 0.0 {
            return None;
        }
        Some(Point2::new(
            (self.m10 / self.m00) as f32,
            (self.m01 / self.m00) as f32,
        ))
    }
}

/// Largest 8-connected nonzero region of the mask, first-maximal in raster
/// order on ties. `None` when the mask is empty.
pub fn largest_region(mask: &GrayImage) -> Option<Region> {
    let (w, h) = mask.dimensions();
    let mut visited = vec![false; (w * h) as usize];
    let mut best: Option<Region> = None;
    let mut stack: Vec<(u32, u32)> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let idx = (y * w + x) as usize;
            if visited[idx] || mask.get_pixel(x, y)[0] == 0 {
                continue;
            }
            let mut region = Region::default();
            visited[idx] = true;
            stack.push((x, y));
            while let Some((px, py)) = stack.pop() {
                region.push(px, py, mask.get_pixel(px, py)[0] as f64);
                for dy in -1i64..=1 {
                    for dx in -1i64..=1 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        let nx = px as i64 + dx;
                        let ny = py as i64 + dy;
                        if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                            continue;
                        }
                        let (nx, ny) = (nx as u32, ny as u32);
                        let nidx = (ny * w + nx) as usize;
                        if !visited[nidx] && mask.get_pixel(nx, ny)[0] != 0 {
                            visited[nidx] = true;
                            stack.push((nx, ny));
                        }
                    }
                }
            }
            let replace = match &best {
                None => true,
                Some(b) => region.pixel_count > b.pixel_count,
            };
            if replace {
                best = Some(region);
            }
        }
    }
    best
}

/// Outcome of needle detection within the masked sector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NeedleStatus {
    /// Centroid of the largest bright region.
    Found(Point2<f32>),
    /// No bright region at all.
    NotFound,
    /// A region exists but its zeroth moment is zero.
    Indeterminate,
}

/// Threshold the masked frame and reduce to a needle centroid.
pub fn detect_needle(masked: &RgbImage, range: &HsvRange) -> NeedleStatus {
    let mask = threshold_mask(masked, range);
    match largest_region(&mask) {
        None => NeedleStatus::NotFound,
        Some(region) => match region.centroid() {
            Some(c) => NeedleStatus::Found(c),
            None => NeedleStatus::Indeterminate,
        },
    }
}
