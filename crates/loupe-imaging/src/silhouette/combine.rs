// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Shape combiner — per-pixel majority vote over aligned masks.

use image::{GrayImage, Luma};
use imageproc::distance_transform::Norm;
use imageproc::morphology;
use loupe_core::error::{LoupeError, Result};
use tracing::{debug, info, instrument};

use super::outline::{Outline, largest_outline};

/// Mean membership at or above which a consensus pixel is foreground. A pixel
/// that exactly half the masks cover is kept.
pub const MAJORITY: f64 = 0.5;

/// Merged shape of one category.
#[derive(Debug, Clone)]
pub struct Consensus {
    pub mask: GrayImage,
    pub outline: Outline,
    /// Number of masks that were averaged.
    pub contributors: usize,
}

/// Average normalized masks into one consensus mask and outline.
///
/// Every mask must have the dimensions of the first. The result does not
/// depend on the order of `masks`.
#[instrument(skip(masks), fields(count = masks.len()))]
pub fn combine_shapes(masks: &[GrayImage]) -> Result<Consensus> {
    let first = masks.first().ok_or(LoupeError::EmptyInput)?;
    let expected = first.dimensions();
    for (index, mask) in masks.iter().enumerate() {
        if mask.dimensions() != expected {
            return Err(LoupeError::DimensionMismatch {
                index,
                expected,
                actual: mask.dimensions(),
            });
        }
    }

    let (width, height) = expected;
    let mut membership = vec![0.0f64; width as usize * height as usize];
    for mask in masks {
        for (sum, value) in membership.iter_mut().zip(mask.as_raw()) {
            *sum += *value as f64 / 255.0;
        }
    }

    let count = masks.len() as f64;
    let majority = GrayImage::from_fn(width, height, |x, y| {
        let mean = membership[y as usize * width as usize + x as usize] / count;
        Luma([if mean >= MAJORITY { 255 } else { 0 }])
    });

    // 3x3 closing joins fragments split by averaging.
    let consensus = morphology::close(&majority, Norm::LInf, 1);
    debug!(
        majority_px = majority.pixels().filter(|p| p.0[0] > 0).count(),
        closed_px = consensus.pixels().filter(|p| p.0[0] > 0).count(),
        "Consensus mask built"
    );

    let outline = largest_outline(&consensus)?;
    info!(
        contributors = masks.len(),
        area = outline.area(),
        "Consensus shape combined"
    );

    Ok(Consensus {
        mask: consensus,
        outline,
        contributors: masks.len(),
    })
}
