//! Per-frame analysis pipeline: dial → mask → needle → reading.
//!
//! This is the glue layer; the algorithmic primitives live in `dial`,
//! `mask`, `needle`, and `reading`. A frame always produces a
//! [`FrameAnalysis`] — detection failures degrade to a stage diagnostic,
//! never an error or a panic.

use image::RgbImage;
use log::debug;
use nalgebra::Point2;
use serde::{Deserialize, Serialize};

use crate::config::GaugeConfig;
use crate::dial::{locate_dial, Dial};
use crate::mask::sector_masked;
use crate::needle::{detect_needle, NeedleStatus};
use crate::reading;

/// Outcome of one frame, in stage-specificity order: the most specific
/// failing stage wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Reading,
    NoDial,
    NoNeedle,
    IndeterminateNeedle,
}

impl Outcome {
    /// Operator-facing diagnostic for failed stages; `None` for a reading.
    pub fn diagnostic(&self) -> Option<&'static str> {
        match self {
            Outcome::Reading => None,
            Outcome::NoDial => Some("Can't see the gauge!"),
            Outcome::NoNeedle => Some("Can't find the needle!"),
            Outcome::IndeterminateNeedle => Some("Can't determine needle position!"),
        }
    }
}

/// Everything derived from one frame. Serializable for snapshot reports.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FrameAnalysis {
    /// Frame dimensions [width, height].
    pub image_size: [u32; 2],
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dial: Option<Dial>,
    /// Needle centroid (x, y) in image pixels.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub needle_centroid: Option<[f32; 2]>,
    /// Reading in the gauge's labeled units.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reading: Option<f32>,
    pub outcome: Outcome,
}

impl FrameAnalysis {
    fn failed(image_size: [u32; 2], dial: Option<Dial>, outcome: Outcome) -> Self {
        Self {
            image_size,
            dial,
            needle_centroid: None,
            reading: None,
            outcome,
        }
    }
}

/// Run the full per-frame pipeline. Later stages are skipped as soon as an
/// earlier one fails; the outcome names the failing stage.
pub fn analyze_frame(frame: &RgbImage, config: &GaugeConfig) -> FrameAnalysis {
    let (w, h) = frame.dimensions();
    let size = [w, h];

    let gray = image::imageops::grayscale(frame);
    let Some(dial) = locate_dial(&gray, &config.dial) else {
        debug!("no dial located");
        return FrameAnalysis::failed(size, None, Outcome::NoDial);
    };
    debug!(
        "dial at ({}, {}), radius {}",
        dial.center[0], dial.center[1], dial.radius
    );

    let masked = sector_masked(frame, &dial, &config.sector);
    let centroid = match detect_needle(&masked, &config.needle) {
        NeedleStatus::NotFound => {
            debug!("no needle region in sector");
            return FrameAnalysis::failed(size, Some(dial), Outcome::NoNeedle);
        }
        NeedleStatus::Indeterminate => {
            debug!("needle region has zero moment");
            return FrameAnalysis::failed(size, Some(dial), Outcome::IndeterminateNeedle);
        }
        NeedleStatus::Found(c) => c,
    };

    let center = Point2::new(dial.center[0], dial.center[1]);
    let raw = reading::needle_angle_deg(center, centroid);
    let rebased = reading::rebase_deg(raw, &config.sector);
    let value = config.scale.value_at(rebased, config.sector.span_deg());
    debug!("needle angle {raw:.1} deg, rebased {rebased:.1} deg, reading {value:.1}");

    FrameAnalysis {
        image_size: size,
        dial: Some(dial),
        needle_centroid: Some([centroid.x, centroid.y]),
        reading: Some(value),
        outcome: Outcome::Reading,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dial::DialConfig;
    use crate::test_utils::{draw_gauge_frame, test_dial_config};
    use image::Rgb;

    fn test_config() -> GaugeConfig {
        GaugeConfig {
            dial: test_dial_config(),
            ..GaugeConfig::default()
        }
    }

    #[test]
    fn synthetic_gauge_yields_a_reading() {
        // needle at 200 deg geometric -> rebased 50 deg -> 44.4 knots
        let frame = draw_gauge_frame(200, 200, [100.0, 100.0], 60.0, Some(200.0));
        let analysis = analyze_frame(&frame, &test_config());

        assert_eq!(analysis.outcome, Outcome::Reading);
        let dial = analysis.dial.expect("dial");
        assert!((dial.center[0] - 100.0).abs() <= 5.0);
        assert!((dial.center[1] - 100.0).abs() <= 5.0);
        assert!((dial.radius - 60.0).abs() <= 6.0);

        let reading = analysis.reading.expect("reading");
        assert!(
            (reading - 44.4).abs() < 8.0,
            "reading {reading} should be near 44.4"
        );
    }

    #[test]
    fn blank_frame_skips_every_later_stage() {
        let frame = RgbImage::from_pixel(160, 160, Rgb([128, 128, 128]));
        let analysis = analyze_frame(&frame, &test_config());
        assert_eq!(analysis.outcome, Outcome::NoDial);
        assert!(analysis.dial.is_none());
        assert!(analysis.needle_centroid.is_none());
        assert!(analysis.reading.is_none());
        assert_eq!(analysis.outcome.diagnostic(), Some("Can't see the gauge!"));
    }

    #[test]
    fn gauge_without_needle_reports_no_needle() {
        let frame = draw_gauge_frame(200, 200, [100.0, 100.0], 60.0, None);
        let analysis = analyze_frame(&frame, &test_config());
        assert_eq!(analysis.outcome, Outcome::NoNeedle);
        assert!(analysis.dial.is_some());
        assert!(analysis.reading.is_none());
        assert_eq!(analysis.outcome.diagnostic(), Some("Can't find the needle!"));
    }

    #[test]
    fn needle_outside_sector_is_invisible() {
        // 45 deg is outside the 150..330 sector, so the blob is masked away
        let frame = draw_gauge_frame(200, 200, [100.0, 100.0], 60.0, Some(45.0));
        let analysis = analyze_frame(&frame, &test_config());
        assert_eq!(analysis.outcome, Outcome::NoNeedle);
    }

    #[test]
    fn report_serializes_without_absent_fields() {
        let analysis = FrameAnalysis::failed([10, 10], None, Outcome::NoDial);
        let json = serde_json::to_string(&analysis).unwrap();
        assert!(json.contains("no_dial"));
        assert!(!json.contains("\"reading\""));
        assert!(!json.contains("\"dial\""));
    }

    #[test]
    fn default_dial_config_is_sane() {
        // keep the shipped defaults ordered and within the frame scale
        let config = DialConfig::default();
        assert!(config.r_min < config.r_max);
        assert!(config.min_vote_frac > 0.0 && config.min_vote_frac <= 1.0);
    }
}
