// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Tool configuration. Every slider and toggle of the inspection tools maps to a
// field here; the structs are passed explicitly into each pipeline call.

use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use std::path::Path;

use crate::error::{LoupeError, Result};
use crate::types::ThresholdMode;

/// Persistent tool settings, loadable from a JSON file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoupeConfig {
    pub extract: ExtractConfig,
    pub lens: LensConfig,
    pub loupe: LoupeLensConfig,
    pub overlay: OverlayConfig,
}

impl LoupeConfig {
    /// Read a config file. Missing fields fall back to their defaults.
    ///
    /// Well-formed JSON carrying a bad value (an unknown threshold mode, a
    /// negative size) is an `InvalidParameter`; malformed JSON stays a
    /// `Serialization` error.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&text).map_err(|err| {
            if err.is_data() {
                LoupeError::InvalidParameter(format!("{}: {err}", path.display()))
            } else {
                LoupeError::Serialization(err)
            }
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.extract.validate()?;
        self.lens.validate()?;
        self.loupe.validate()
    }
}

/// Largest canonical canvas side accepted by [`ExtractConfig::validate`].
pub const MAX_CANVAS_SIZE: u32 = 8192;

/// Silhouette extraction parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractConfig {
    /// Side length of the square canonical canvas.
    pub canvas_size: u32,
    pub threshold_mode: ThresholdMode,
    /// Swap foreground and background after thresholding (dark subject on a light
    /// background).
    pub invert: bool,
    /// Minimum fraction of the frame the detected region must cover.
    pub min_area_ratio: f64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            canvas_size: 512,
            threshold_mode: ThresholdMode::Auto,
            invert: false,
            min_area_ratio: 0.01,
        }
    }
}

impl ExtractConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("canvas_size", self.canvas_size, 1..=MAX_CANVAS_SIZE)?;
        check_range("min_area_ratio", self.min_area_ratio, 0.0..=1.0)
    }
}

/// Forensic microscope: crop under the cursor, CLAHE, then magnify.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LensConfig {
    /// Lens diameter in source pixels (50..=400).
    pub diameter: u32,
    /// Zoom factor applied after equalization (1.0..=8.0).
    pub magnification: f32,
    /// CLAHE clip limit; 0 disables equalization (0.0..=10.0).
    pub clip_limit: f32,
    /// CLAHE tiles per axis.
    pub tile_grid: u32,
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            diameter: 200,
            magnification: 4.0,
            clip_limit: 4.0,
            tile_grid: 8,
        }
    }
}

impl LensConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("lens diameter", self.diameter, 50..=400)?;
        check_range("lens magnification", self.magnification, 1.0..=8.0)?;
        check_range("CLAHE clip limit", self.clip_limit, 0.0..=10.0)?;
        check_range("CLAHE tile grid", self.tile_grid, 1..=64)
    }
}

/// Canvas loupe: sample a window, scale it up to the lens, then blend in a
/// global histogram equalization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoupeLensConfig {
    /// Lens size in output pixels (80..=500).
    pub size: u32,
    /// Zoom factor (1.2..=12.0).
    pub zoom: f32,
    /// Equalization blend, 0 = off, 1 = fully equalized.
    pub strength: f32,
}

impl Default for LoupeLensConfig {
    fn default() -> Self {
        Self {
            size: 220,
            zoom: 3.0,
            strength: 0.45,
        }
    }
}

impl LoupeLensConfig {
    pub fn validate(&self) -> Result<()> {
        check_range("loupe size", self.size, 80..=500)?;
        check_range("loupe zoom", self.zoom, 1.2..=12.0)?;
        check_range("equalizer strength", self.strength, 0.0..=1.0)
    }
}

/// Outline colours used when rendering overlays.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub shape_color: [u8; 3],
    pub consensus_color: [u8; 3],
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            shape_color: [255, 64, 64],
            consensus_color: [64, 200, 255],
        }
    }
}

fn check_range<T>(name: &str, value: T, range: RangeInclusive<T>) -> Result<()>
where
    T: PartialOrd + std::fmt::Display,
{
    if range.contains(&value) {
        Ok(())
    } else {
        Err(LoupeError::InvalidParameter(format!(
            "{name} must be within {}..={}, got {value}",
            range.start(),
            range.end()
        )))
    }
}
