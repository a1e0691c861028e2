// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Core domain types for Loupe.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::error::LoupeError;

/// Unique identifier for an image taken in for processing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ImageId(pub Uuid);

impl ImageId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for ImageId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ImageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Which view of the subject an image shows. Masks are only ever combined
/// within a single category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewCategory {
    Front,
    Profile,
}

impl ViewCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Front => "front",
            Self::Profile => "profile",
        }
    }
}

impl std::fmt::Display for ViewCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ViewCategory {
    type Err = LoupeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "front" => Ok(Self::Front),
            "profile" | "side" => Ok(Self::Profile),
            other => Err(LoupeError::InvalidParameter(format!(
                "view category must be 'front' or 'profile', got '{other}'"
            ))),
        }
    }
}

/// How the blurred intensity image is binarized.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThresholdMode {
    /// Global cut chosen from the intensity histogram (Otsu).
    #[default]
    Auto,
    /// Gaussian-weighted local mean over a 31-pixel span, offset by 2.
    Adaptive,
}

impl ThresholdMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Adaptive => "adaptive",
        }
    }
}

impl std::fmt::Display for ThresholdMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ThresholdMode {
    type Err = LoupeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "auto" => Ok(Self::Auto),
            "adaptive" => Ok(Self::Adaptive),
            other => Err(LoupeError::InvalidParameter(format!(
                "threshold_mode must be 'auto' or 'adaptive', got '{other}'"
            ))),
        }
    }
}

/// Raster formats accepted at the decode boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RasterFormat {
    Png,
    Jpeg,
    Tiff,
    Webp,
    Bmp,
}

impl RasterFormat {
    /// Infer the format from a file extension (with or without the dot).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpeg),
            "tif" | "tiff" => Some(Self::Tiff),
            "webp" => Some(Self::Webp),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_mode_rejects_unknown_strings() {
        assert_eq!("auto".parse::<ThresholdMode>().unwrap(), ThresholdMode::Auto);
        assert_eq!(
            "adaptive".parse::<ThresholdMode>().unwrap(),
            ThresholdMode::Adaptive
        );
        let err = "otsu".parse::<ThresholdMode>().unwrap_err();
        assert!(matches!(err, LoupeError::InvalidParameter(_)));
    }

    #[test]
    fn view_category_accepts_side_alias() {
        assert_eq!("Side".parse::<ViewCategory>().unwrap(), ViewCategory::Profile);
        assert_eq!(" front ".parse::<ViewCategory>().unwrap(), ViewCategory::Front);
        assert!("top".parse::<ViewCategory>().is_err());
    }

    #[test]
    fn raster_format_from_extension() {
        assert_eq!(RasterFormat::from_extension(".JPG"), Some(RasterFormat::Jpeg));
        assert_eq!(RasterFormat::from_extension("tif"), Some(RasterFormat::Tiff));
        assert_eq!(RasterFormat::from_extension("gif"), None);
    }

    #[test]
    fn categories_serialize_lowercase() {
        let json = serde_json::to_string(&ViewCategory::Profile).unwrap();
        assert_eq!(json, "\"profile\"");
    }
}
