//! Frame annotation: dial outline, needle line, reading overlay.
//!
//! Anti-aliased scanline primitives draw directly into the RGB frame; text
//! is rendered with an embedded DejaVu Sans face. A successful reading is
//! drawn in green, stage diagnostics in red.

use image::{Rgb, RgbImage};
use rusttype::{point, Font, PositionedGlyph, Scale};

use crate::pipeline::FrameAnalysis;

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);

/// Overlay text anchor (baseline) in pixels.
const TEXT_ORIGIN: (i32, i32) = (50, 50);
const TEXT_SIZE: f32 = 32.0;

const DIAL_OUTLINE_THICKNESS: f32 = 3.0;
const CENTER_MARKER_RADIUS: f32 = 3.0;
const NEEDLE_LINE_THICKNESS: f32 = 2.0;

static FONT_DATA: &[u8] = include_bytes!("../assets/DejaVuSans.ttf");

/// Annotation renderer holding the parsed overlay font.
pub struct Overlay {
    font: Font<'static>,
    text_scale: Scale,
}

impl Overlay {
    pub fn new() -> Self {
        Self {
            font: Font::try_from_bytes(FONT_DATA).expect("embedded font parses"),
            text_scale: Scale::uniform(TEXT_SIZE),
        }
    }

    /// Draw the analysis onto the frame: dial outline and center marker,
    /// center-to-needle line, and the reading or the stage diagnostic.
    pub fn annotate(&self, frame: &mut RgbImage, analysis: &FrameAnalysis, units: &str) {
        if let Some(dial) = &analysis.dial {
            let [cx, cy] = dial.center;
            draw_circle_outline(frame, cx, cy, dial.radius, DIAL_OUTLINE_THICKNESS, GREEN);
            draw_disc(frame, cx, cy, CENTER_MARKER_RADIUS, GREEN);
            if let Some([nx, ny]) = analysis.needle_centroid {
                draw_line(frame, cx, cy, nx, ny, NEEDLE_LINE_THICKNESS, RED);
            }
        }

        match (analysis.reading, analysis.outcome.diagnostic()) {
            (Some(value), _) => {
                let text = format!("Speed: {value:.1} {units}");
                self.draw_text(frame, TEXT_ORIGIN.0, TEXT_ORIGIN.1, &text, GREEN);
            }
            (None, Some(message)) => {
                self.draw_text(frame, TEXT_ORIGIN.0, TEXT_ORIGIN.1, message, RED);
            }
            (None, None) => {}
        }
    }

    fn draw_text(&self, frame: &mut RgbImage, x: i32, y: i32, text: &str, color: Rgb<u8>) {
        let glyphs: Vec<PositionedGlyph> = self
            .font
            .layout(text, self.text_scale, point(x as f32, y as f32))
            .collect();
        for glyph in glyphs {
            if let Some(bb) = glyph.pixel_bounding_box() {
                glyph.draw(|gx, gy, v| {
                    blend_pixel(frame, bb.min.x + gx as i32, bb.min.y + gy as i32, color, v);
                });
            }
        }
    }
}

impl Default for Overlay {
    fn default() -> Self {
        Self::new()
    }
}

/// Alpha-blend one pixel, clipping at the frame bounds.
fn blend_pixel(frame: &mut RgbImage, x: i32, y: i32, color: Rgb<u8>, alpha: f32) {
    if x < 0 || y < 0 || x >= frame.width() as i32 || y >= frame.height() as i32 {
        return;
    }
    let dst = frame.get_pixel_mut(x as u32, y as u32);
    for c in 0..3 {
        dst[c] = (color[c] as f32 * alpha + dst[c] as f32 * (1.0 - alpha)).round() as u8;
    }
}

fn draw_circle_outline(frame: &mut RgbImage, cx: f32, cy: f32, radius: f32, thickness: f32, color: Rgb<u8>) {
    let reach = (radius + thickness).ceil() as i32 + 1;
    let (icx, icy) = (cx.round() as i32, cy.round() as i32);
    for y in (icy - reach)..=(icy + reach) {
        for x in (icx - reach)..=(icx + reach) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = (1.0 - ((dist - radius).abs() - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                blend_pixel(frame, x, y, color, aa);
            }
        }
    }
}

fn draw_disc(frame: &mut RgbImage, cx: f32, cy: f32, radius: f32, color: Rgb<u8>) {
    let reach = radius.ceil() as i32 + 1;
    let (icx, icy) = (cx.round() as i32, cy.round() as i32);
    for y in (icy - reach)..=(icy + reach) {
        for x in (icx - reach)..=(icx + reach) {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            let dist = (dx * dx + dy * dy).sqrt();
            let aa = if dist > radius {
                1.0 - (dist - radius).min(1.0)
            } else {
                1.0
            };
            if aa > 0.0 {
                blend_pixel(frame, x, y, color, aa);
            }
        }
    }
}

fn draw_line(frame: &mut RgbImage, x0: f32, y0: f32, x1: f32, y1: f32, thickness: f32, color: Rgb<u8>) {
    let pad = thickness.ceil() as i32 + 1;
    let min_x = x0.min(x1).floor() as i32 - pad;
    let max_x = x0.max(x1).ceil() as i32 + pad;
    let min_y = y0.min(y1).floor() as i32 - pad;
    let max_y = y0.max(y1).ceil() as i32 + pad;
    let dx = x1 - x0;
    let dy = y1 - y0;
    let len_sq = (dx * dx + dy * dy).max(1e-6);
    for y in min_y..=max_y {
        for x in min_x..=max_x {
            let px = x as f32 - x0;
            let py = y as f32 - y0;
            let t = ((px * dx + py * dy) / len_sq).clamp(0.0, 1.0);
            let lx = x0 + t * dx;
            let ly = y0 + t * dy;
            let dist = ((lx - x as f32).powi(2) + (ly - y as f32).powi(2)).sqrt();
            let aa = (1.0 - (dist - thickness / 2.0).clamp(0.0, 1.0)).clamp(0.0, 1.0);
            if aa > 0.01 {
                blend_pixel(frame, x, y, color, aa);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dial::Dial;
    use crate::pipeline::Outcome;

    fn analysis_with_reading() -> FrameAnalysis {
        FrameAnalysis {
            image_size: [200, 200],
            dial: Some(Dial {
                center: [100.0, 100.0],
                radius: 40.0,
            }),
            needle_centroid: Some([120.0, 130.0]),
            reading: Some(44.4),
            outcome: Outcome::Reading,
        }
    }

    #[test]
    fn dial_outline_and_marker_are_green() {
        let mut frame = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        Overlay::new().annotate(&mut frame, &analysis_with_reading(), "knots");
        // exactly on the rim, and on the center marker just off the
        // needle line (the line is drawn last and covers the center)
        assert_eq!(frame.get_pixel(140, 100), &GREEN);
        assert_eq!(frame.get_pixel(97, 100), &GREEN);
    }

    #[test]
    fn needle_line_is_red() {
        let mut frame = RgbImage::from_pixel(200, 200, Rgb([0, 0, 0]));
        Overlay::new().annotate(&mut frame, &analysis_with_reading(), "knots");
        // midpoint of the center-to-centroid segment
        assert_eq!(frame.get_pixel(110, 115), &RED);
    }

    #[test]
    fn diagnostic_text_marks_the_frame() {
        let mut frame = RgbImage::from_pixel(300, 120, Rgb([0, 0, 0]));
        let analysis = FrameAnalysis {
            image_size: [300, 120],
            dial: None,
            needle_centroid: None,
            reading: None,
            outcome: Outcome::NoDial,
        };
        Overlay::new().annotate(&mut frame, &analysis, "knots");
        let red_pixels = frame
            .pixels()
            .filter(|p| p[0] > 180 && p[1] < 60 && p[2] < 60)
            .count();
        assert!(red_pixels > 20, "diagnostic text should render in red");
    }

    #[test]
    fn annotation_clips_at_frame_bounds() {
        let mut frame = RgbImage::from_pixel(60, 60, Rgb([0, 0, 0]));
        let analysis = FrameAnalysis {
            image_size: [60, 60],
            dial: Some(Dial {
                center: [5.0, 5.0],
                radius: 50.0,
            }),
            needle_centroid: Some([59.0, 59.0]),
            reading: Some(10.0),
            outcome: Outcome::Reading,
        };
        // must not panic on out-of-bounds geometry
        Overlay::new().annotate(&mut frame, &analysis, "knots");
    }
}
