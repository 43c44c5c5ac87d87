//! Process-wide configuration.
//!
//! [`GaugeConfig`] aggregates the per-stage parameter structs so the whole
//! pipeline can be driven from one value: camera endpoint, dial detection
//! tuning, needle sector, HSV threshold, and the gauge scale. Defaults
//! describe one physical instrument; a different gauge is a different
//! config file, not a code change.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::dial::DialConfig;
use crate::mask::SectorSpec;
use crate::needle::HsvRange;
use crate::reading::ScaleSpec;

/// Camera snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// URL returning one JPEG frame per GET.
    pub url: String,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            url: "http://192.168.2.62/cam-lo.jpg".to_string(),
        }
    }
}

/// Top-level configuration for the gauge reader.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GaugeConfig {
    pub camera: CameraConfig,
    pub dial: DialConfig,
    pub sector: SectorSpec,
    pub needle: HsvRange,
    pub scale: ScaleSpec,
}

impl GaugeConfig {
    /// Load from a JSON file. Missing fields fall back to defaults.
    pub fn from_json_file(path: &Path) -> Result<Self, Box<dyn std::error::Error>> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}
