//! gaugecam — read an analog gauge dial from networked camera snapshots.
//!
//! The per-frame pipeline:
//!
//! 1. **Fetch** – one HTTP GET of a JPEG snapshot, decoded to an RGB raster.
//! 2. **Dial** – Hough-gradient circle detection; candidates are averaged
//!    into the gauge face.
//! 3. **Mask** – restrict analysis to the fixed angular sector the needle
//!    tip travels.
//! 4. **Needle** – HSV near-white threshold, largest connected bright
//!    region, area-weighted centroid.
//! 5. **Reading** – centroid angle rebased to the sector start and mapped
//!    linearly onto the gauge scale.
//! 6. **Annotate** – dial outline, needle line, and reading (or stage
//!    diagnostic) overlay for display.
//!
//! Stages 2–5 are pure raster functions with no network or display access;
//! process glue (window, control loop, CLI) lives in the `gaugecam-cli`
//! crate. Every derived entity is recomputed independently per frame — no
//! state survives an iteration.

pub mod annotate;
pub mod config;
pub mod dial;
pub mod fetch;
pub mod mask;
pub mod needle;
pub mod pipeline;
pub mod reading;

#[cfg(test)]
pub(crate) mod test_utils;

pub use config::GaugeConfig;
pub use pipeline::{analyze_frame, FrameAnalysis, Outcome};
