//! Shared synthetic-frame helpers for image-based unit tests.

use image::{GrayImage, Luma, Rgb, RgbImage};

use crate::dial::DialConfig;

/// Dial detection tuning matched to the 200x200 synthetic frames below.
pub(crate) fn test_dial_config() -> DialConfig {
    DialConfig {
        r_min: 30.0,
        r_max: 90.0,
        grad_threshold: 0.05,
        nms_radius: 15.0,
        min_vote_frac: 0.5,
        accum_sigma: 2.0,
        max_candidates: 8,
    }
}

/// Render a dark dial rim on a bright background.
///
/// Pixels at distance `d` from `center` take `rim_pix` when
/// `|d - radius| < rim_width`, `bg_pix` otherwise.
pub(crate) fn draw_dial_image(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    rim_width: f32,
    rim_pix: u8,
    bg_pix: u8,
) -> GrayImage {
    let mut img = GrayImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - center[0];
            let dy = y as f32 - center[1];
            let d = (dx * dx + dy * dy).sqrt();
            let pix = if (d - radius).abs() < rim_width {
                rim_pix
            } else {
                bg_pix
            };
            img.put_pixel(x, y, Luma([pix]));
        }
    }
    img
}

/// Render a color gauge frame: bright background, dark face disc with a
/// darker rim, and (optionally) a white needle blob at `needle_angle_deg`
/// geometric degrees, 60% of the radius out from the center.
pub(crate) fn draw_gauge_frame(
    w: u32,
    h: u32,
    center: [f32; 2],
    radius: f32,
    needle_angle_deg: Option<f32>,
) -> RgbImage {
    let mut img = RgbImage::new(w, h);
    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - center[0];
            let dy = y as f32 - center[1];
            let d = (dx * dx + dy * dy).sqrt();
            let pix = if (d - radius).abs() < 3.0 {
                Rgb([30, 30, 30]) // rim
            } else if d < radius {
                Rgb([90, 90, 90]) // face
            } else {
                Rgb([200, 200, 200]) // background
            };
            img.put_pixel(x, y, pix);
        }
    }

    if let Some(angle_deg) = needle_angle_deg {
        let rad = angle_deg.to_radians();
        let bx = center[0] + 0.6 * radius * rad.cos();
        let by = center[1] + 0.6 * radius * rad.sin();
        for y in 0..h {
            for x in 0..w {
                let dx = x as f32 - bx;
                let dy = y as f32 - by;
                if dx * dx + dy * dy <= 36.0 {
                    img.put_pixel(x, y, Rgb([255, 255, 255]));
                }
            }
        }
    }
    img
}
