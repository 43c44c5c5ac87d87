//! Needle angle to gauge reading.
//!
//! The raw geometric angle from the dial center to the needle centroid is
//! rebased so 0 degrees falls on the sector start, wrapped into
//! `[0, span)`, then mapped linearly onto the gauge's labeled scale.

use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::mask::SectorSpec;

/// Labeled value range of the physical instrument.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScaleSpec {
    pub min_value: f32,
    pub max_value: f32,
    pub units: String,
}

impl Default for ScaleSpec {
    fn default() -> Self {
        Self {
            min_value: 0.0,
            max_value: 160.0,
            units: "knots".to_string(),
        }
    }
}

impl ScaleSpec {
    /// Linear map of a rebased needle angle over the sector span.
    pub fn value_at(&self, needle_angle_deg: f32, span_deg: f32) -> f32 {
        self.min_value + (needle_angle_deg / span_deg) * (self.max_value - self.min_value)
    }
}

/// Raw angle from the dial center to the needle centroid, in degrees,
/// `atan2` convention on raster coordinates (y grows downward).
pub fn needle_angle_deg(center: Point2<f32>, centroid: Point2<f32>) -> f32 {
    (centroid.y - center.y)
        .atan2(centroid.x - center.x)
        .to_degrees()
}

/// Rebase a raw angle so 0 is the sector start, wrapped into `[0, span)`.
pub fn rebase_deg(angle_deg: f32, sector: &SectorSpec) -> f32 {
    let span = sector.span_deg();
    let mut rebased = (angle_deg - sector.start_deg).rem_euclid(span);
    // rem_euclid of a tiny negative can round up to the span itself
    if rebased >= span {
        rebased = 0.0;
    }
    rebased
}
