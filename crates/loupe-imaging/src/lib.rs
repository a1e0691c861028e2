// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// loupe-imaging — Raster processing for Loupe.
//
// Provides silhouette extraction (threshold, clean, normalize), consensus shapes
// per view category, outline overlays, and the inspection lenses (CLAHE
// microscope, equalizing loupe).

pub mod image;
pub mod lens;
pub mod silhouette;

#[cfg(test)]
mod test_utils;

// Re-export the primary entry points so callers can use `loupe_imaging::Raster` etc.
pub use self::image::{Raster, demo_image};
pub use lens::{LensView, Microscope};
pub use silhouette::{
    BatchOutcome, CategoryBuckets, Consensus, ExtractionResult, Outline, OutlineStats,
    SilhouetteExtractor, SubjectImage, combine_shapes, extract_silhouette, outline_overlay,
};
