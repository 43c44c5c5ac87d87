//! Angular sector masking of the dial face.
//!
//! The needle tip of this instrument travels a fixed arc, so analysis is
//! restricted to that sector of the dial. The sector is a per-gauge
//! constant carried in the configuration, not auto-detected.

use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::dial::Dial;

/// Angular sector in degrees from the positive x-axis, measured with
/// `atan2` on raster coordinates (y grows downward).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct SectorSpec {
    pub start_deg: f32,
    pub end_deg: f32,
}

impl Default for SectorSpec {
    fn default() -> Self {
        // bottom two-sixths of the dial face for the reference instrument
        Self {
            start_deg: 150.0,
            end_deg: 330.0,
        }
    }
}

impl SectorSpec {
    /// Angular extent in degrees, wrap-aware. A degenerate zero extent is
    /// treated as the full circle.
    pub fn span_deg(&self) -> f32 {
        let span = (self.end_deg - self.start_deg).rem_euclid(360.0);
        if span == 0.0 {
            360.0
        } else {
            span
        }
    }

    /// Whether an angle (degrees, any range) falls inside the sector.
    pub fn contains_deg(&self, angle_deg: f32) -> bool {
        (angle_deg - self.start_deg).rem_euclid(360.0) <= self.span_deg()
    }
}

/// Masked copy of the color frame: pixels outside the dial radius or the
/// angular sector are zeroed.
pub fn sector_masked(frame: &RgbImage, dial: &Dial, sector: &SectorSpec) -> RgbImage {
    let (w, h) = frame.dimensions();
    let mut out = RgbImage::new(w, h);
    let [cx, cy] = dial.center;
    let r = dial.radius;

    let x0 = (cx - r).floor().max(0.0) as u32;
    let x1 = ((cx + r).ceil() as u32).min(w.saturating_sub(1));
    let y0 = (cy - r).floor().max(0.0) as u32;
    let y1 = ((cy + r).ceil() as u32).min(h.saturating_sub(1));

    for y in y0..=y1 {
        for x in x0..=x1 {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy > r * r {
                continue;
            }
            let angle = dy.atan2(dx).to_degrees();
            if sector.contains_deg(angle) {
                out.put_pixel(x, y, *frame.get_pixel(x, y));
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn span_of_reference_sector_is_half_turn() {
        let sector = SectorSpec::default();
        assert_eq!(sector.span_deg(), 180.0);
        assert!(sector.contains_deg(180.0));
        assert!(sector.contains_deg(270.0));
        assert!(sector.contains_deg(-90.0)); // same direction as 270
        assert!(!sector.contains_deg(0.0));
        assert!(!sector.contains_deg(90.0));
    }

    #[test]
    fn wrapping_sector_contains_across_zero() {
        let sector = SectorSpec {
            start_deg: 300.0,
            end_deg: 60.0,
        };
        assert_eq!(sector.span_deg(), 120.0);
        assert!(sector.contains_deg(0.0));
        assert!(sector.contains_deg(350.0));
        assert!(!sector.contains_deg(180.0));
    }

    #[test]
    fn mask_keeps_sector_and_zeros_the_rest() {
        let frame = RgbImage::from_pixel(100, 100, Rgb([10, 200, 10]));
        let dial = Dial {
            center: [50.0, 50.0],
            radius: 40.0,
        };
        let masked = sector_masked(&frame, &dial, &SectorSpec::default());

        // 180 deg: inside the sector
        assert_eq!(masked.get_pixel(20, 50), &Rgb([10, 200, 10]));
        // 270 deg (straight up in raster coordinates): inside
        assert_eq!(masked.get_pixel(50, 20), &Rgb([10, 200, 10]));
        // 0 deg and 90 deg: outside the sector
        assert_eq!(masked.get_pixel(80, 50), &Rgb([0, 0, 0]));
        assert_eq!(masked.get_pixel(50, 80), &Rgb([0, 0, 0]));
        // inside the sector direction but beyond the radius
        assert_eq!(masked.get_pixel(5, 50), &Rgb([0, 0, 0]));
    }
}
