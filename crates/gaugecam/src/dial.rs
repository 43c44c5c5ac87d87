//! Dial localization via Hough-gradient circle detection.
//!
//! Each pixel with a strong gradient votes along its gradient line at
//! distances in `[r_min, r_max]`. The circular rim of a gauge face produces
//! a peak in the accumulator at its center because rim gradients point
//! radially. Peaks are extracted with non-maximum suppression; each peak
//! then recovers its radius from a histogram of radially-aligned edge
//! distances. All surviving candidates are reduced to a single [`Dial`] by
//! component-wise averaging.

use image::{GrayImage, ImageBuffer, Luma};
use log::debug;
use serde::{Deserialize, Serialize};

/// Configuration for dial circle detection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DialConfig {
    /// Minimum voting radius (pixels).
    pub r_min: f32,
    /// Maximum voting radius (pixels).
    pub r_max: f32,
    /// Gradient magnitude threshold (fraction of max gradient).
    pub grad_threshold: f32,
    /// NMS radius for peak extraction; also the minimum distance between
    /// candidate centers (pixels).
    pub nms_radius: f32,
    /// Minimum accumulator value for a candidate (fraction of max).
    pub min_vote_frac: f32,
    /// Gaussian sigma for accumulator smoothing.
    pub accum_sigma: f32,
    /// Cap on the number of candidates entering the averaging reduction.
    pub max_candidates: usize,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            r_min: 20.0,
            r_max: 150.0,
            grad_threshold: 0.1,
            nms_radius: 20.0,
            min_vote_frac: 0.5,
            accum_sigma: 2.0,
            max_candidates: 8,
        }
    }
}

/// A candidate circle with its accumulator score.
#[derive(Debug, Clone, Copy)]
pub struct Circle {
    pub cx: f32,
    pub cy: f32,
    pub radius: f32,
    pub score: f32,
}

/// The gauge face: averaged candidate circle, truncated to whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Dial {
    /// Center (x, y) in image pixels.
    pub center: [f32; 2],
    /// Radius in pixels.
    pub radius: f32,
}

/// An edge pixel with its unit gradient direction.
#[derive(Debug, Clone, Copy)]
struct EdgePixel {
    x: f32,
    y: f32,
    dx: f32,
    dy: f32,
}

/// Deposit a weighted vote into the accumulator using bilinear interpolation.
#[inline]
fn bilinear_add(accum: &mut [f32], w: u32, h: u32, x: f32, y: f32, weight: f32) {
    let x0 = x.floor() as u32;
    let y0 = y.floor() as u32;
    if x0 + 1 >= w || y0 + 1 >= h {
        return;
    }
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let stride = w as usize;
    let base = y0 as usize * stride + x0 as usize;
    accum[base] += weight * (1.0 - fx) * (1.0 - fy);
    accum[base + 1] += weight * fx * (1.0 - fy);
    accum[base + stride] += weight * (1.0 - fx) * fy;
    accum[base + stride + 1] += weight * fx * fy;
}

/// Detect candidate dial circles in a grayscale frame.
///
/// Returns candidates sorted by score (highest first); ties keep raster
/// order, so the reduction downstream is deterministic.
pub fn find_circles(gray: &GrayImage, config: &DialConfig) -> Vec<Circle> {
    let (w, h) = gray.dimensions();
    if w < 4 || h < 4 {
        return Vec::new();
    }

    let gx = imageproc::gradients::horizontal_scharr(gray);
    let gy = imageproc::gradients::vertical_scharr(gray);

    let mut max_mag_sq: f32 = 0.0;
    for y in 0..h {
        for x in 0..w {
            let gxv = gx.get_pixel(x, y)[0] as f32;
            let gyv = gy.get_pixel(x, y)[0] as f32;
            let mag_sq = gxv * gxv + gyv * gyv;
            if mag_sq > max_mag_sq {
                max_mag_sq = mag_sq;
            }
        }
    }
    let max_mag = max_mag_sq.sqrt();
    if max_mag < 1e-6 {
        return Vec::new();
    }
    let threshold = config.grad_threshold * max_mag;

    // Vote accumulation; edge pixels are kept for radius recovery.
    let n = (w * h) as usize;
    let mut accum = vec![0.0f32; n];
    let mut edges: Vec<EdgePixel> = Vec::new();

    for y in 0..h {
        for x in 0..w {
            let gxv = gx.get_pixel(x, y)[0] as f32;
            let gyv = gy.get_pixel(x, y)[0] as f32;
            let mag = (gxv * gxv + gyv * gyv).sqrt();
            if mag < threshold {
                continue;
            }

            let dx = gxv / mag;
            let dy = gyv / mag;
            edges.push(EdgePixel {
                x: x as f32,
                y: y as f32,
                dx,
                dy,
            });

            // Vote along +gradient and -gradient directions
            for &sign in &[-1.0f32, 1.0] {
                let mut r = config.r_min;
                while r <= config.r_max {
                    let vx = x as f32 + sign * dx * r;
                    let vy = y as f32 + sign * dy * r;
                    if vx >= 0.0 && vx < (w - 1) as f32 && vy >= 0.0 && vy < (h - 1) as f32 {
                        bilinear_add(&mut accum, w, h, vx, vy, mag);
                    }
                    r += 1.0;
                }
            }
        }
    }

    let accum_img = ImageBuffer::<Luma<f32>, Vec<f32>>::from_raw(w, h, accum)
        .expect("accumulator dimensions match");
    let smoothed = imageproc::filter::gaussian_blur_f32(&accum_img, config.accum_sigma);
    let smoothed_data = smoothed.as_raw();

    let max_val = smoothed_data.iter().cloned().fold(0.0f32, f32::max);
    if max_val < 1e-6 {
        return Vec::new();
    }
    let vote_threshold = config.min_vote_frac * max_val;
    let nms_r = config.nms_radius.ceil() as i32;

    // Non-maximum suppression over the smoothed accumulator.
    let mut circles = Vec::new();
    for y in nms_r..(h as i32 - nms_r) {
        for x in nms_r..(w as i32 - nms_r) {
            let idx = y as usize * w as usize + x as usize;
            let val = smoothed_data[idx];
            if val < vote_threshold {
                continue;
            }
            let mut is_max = true;
            'outer: for dy in -nms_r..=nms_r {
                for dx in -nms_r..=nms_r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    if (dx * dx + dy * dy) as f32 > config.nms_radius * config.nms_radius {
                        continue;
                    }
                    let nidx = (y + dy) as usize * w as usize + (x + dx) as usize;
                    if smoothed_data[nidx] > val || (smoothed_data[nidx] == val && nidx < idx) {
                        is_max = false;
                        break 'outer;
                    }
                }
            }
            if !is_max {
                continue;
            }
            if let Some(radius) = estimate_radius(&edges, x as f32, y as f32, config) {
                circles.push(Circle {
                    cx: x as f32,
                    cy: y as f32,
                    radius,
                    score: val,
                });
            }
        }
    }

    // Score-descending; sort_by is stable, so equal scores keep raster order.
    circles.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap());
    circles.truncate(config.max_candidates);
    debug!("dial detection: {} candidate circle(s)", circles.len());
    circles
}

/// Recover a candidate's radius from the histogram of distances to edge
/// pixels whose gradient is radially aligned with the center.
///
/// Returns `None` when no aligned edge supports the candidate.
fn estimate_radius(edges: &[EdgePixel], cx: f32, cy: f32, config: &DialConfig) -> Option<f32> {
    let n_bins = (config.r_max - config.r_min).ceil() as usize + 1;
    let mut bins = vec![0u32; n_bins];
    for e in edges {
        let rx = e.x - cx;
        let ry = e.y - cy;
        let d = (rx * rx + ry * ry).sqrt();
        if d < config.r_min || d > config.r_max || d < 1e-3 {
            continue;
        }
        let align = (rx / d * e.dx + ry / d * e.dy).abs();
        if align < 0.8 {
            continue;
        }
        bins[(d - config.r_min) as usize] += 1;
    }
    // first-maximal bin
    let mut best = 0;
    for (i, &v) in bins.iter().enumerate() {
        if v > bins[best] {
            best = i;
        }
    }
    if bins[best] == 0 {
        return None;
    }
    Some(config.r_min + best as f32 + 0.5)
}

/// Reduce candidate circles to one dial by component-wise arithmetic mean,
/// truncated to integer pixel coordinates. `None` when the input is empty.
pub fn average_circles(circles: &[Circle]) -> Option<Dial> {
    if circles.is_empty() {
        return None;
    }
    let n = circles.len() as f32;
    let (sx, sy, sr) = circles.iter().fold((0.0f32, 0.0f32, 0.0f32), |acc, c| {
        (acc.0 + c.cx, acc.1 + c.cy, acc.2 + c.radius)
    });
    Some(Dial {
        center: [(sx / n).trunc(), (sy / n).trunc()],
        radius: (sr / n).trunc(),
    })
}

/// Locate the gauge face in a grayscale frame.
///
/// Zero detections map to an explicit `None` ("no dial located"), never an
/// error: the caller annotates the frame and skips the remaining stages.
pub fn locate_dial(gray: &GrayImage, config: &DialConfig) -> Option<Dial> {
    average_circles(&find_circles(gray, config))
}
