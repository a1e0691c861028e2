// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Silhouette extractor — one colour photo in, one canonical-size binary mask
// and its outline out.

use image::imageops;
use image::{GrayImage, Luma, RgbImage};
use imageproc::rect::Rect;
use loupe_core::config::ExtractConfig;
use loupe_core::error::{LoupeError, Result};
use tracing::{debug, info, instrument};

use super::outline::{Outline, largest_outline};
use super::preprocess::{self, BLUR_SPAN};

/// Longest side of a normalized shape, as a fraction of the canvas side.
pub const FIT_RATIO: f64 = 0.85;

/// Radius of the 5x5 square used to clean the thresholded mask.
const CLEANUP_RADIUS: u8 = 2;

/// Output of a single extraction. Immutable once produced.
#[derive(Debug, Clone)]
pub struct ExtractionResult {
    /// `canvas_size x canvas_size` mask with the shape centred in it.
    pub normalized_mask: GrayImage,
    /// Outline recomputed on `normalized_mask`.
    pub normalized_outline: Outline,
    /// Cleaned mask at the source resolution, before crop and resize.
    pub original_mask: GrayImage,
    /// Enclosed area of the selected region in source pixels.
    pub region_area: f64,
}

/// Turns photos of a head (or any single dominant subject) into masks that
/// can be averaged against each other.
///
/// Pipeline:
///
/// 1. BT.601 intensity, 5-tap Gaussian blur
/// 2. Otsu or adaptive binarization, optional inversion
/// 3. 5x5 opening, then 5x5 closing
/// 4. Largest external region (`NoShapeFound` if there is none)
/// 5. Area check against `min_area_ratio` of the frame (`RegionTooSmall`)
/// 6. Crop to the region's bounding box
/// 7. Uniform scale so the longer side spans 85% of the canvas
/// 8. Nearest-neighbour resize, so mask values stay 0/255
/// 9. Centre on an empty square canvas
/// 10. Outline of the final mask
#[derive(Debug, Clone, Default)]
pub struct SilhouetteExtractor {
    config: ExtractConfig,
}

impl SilhouetteExtractor {
    pub fn new(config: ExtractConfig) -> Self {
        Self { config }
    }

    #[instrument(
        skip(self, image),
        fields(
            width = image.width(),
            height = image.height(),
            mode = %self.config.threshold_mode,
            invert = self.config.invert,
        )
    )]
    pub fn extract(&self, image: &RgbImage) -> Result<ExtractionResult> {
        self.config.validate()?;
        let (width, height) = image.dimensions();
        if width == 0 || height == 0 {
            return Err(LoupeError::InvalidParameter("image is empty".into()));
        }

        // Steps 1-3: binary mask at source resolution.
        let gray = preprocess::to_intensity(image);
        let blurred = preprocess::smooth(&gray, BLUR_SPAN);
        if is_flat(&blurred) {
            debug!("Frame has no contrast");
            return Err(LoupeError::NoShapeFound);
        }
        let mut mask = preprocess::binarize(&blurred, self.config.threshold_mode);
        if self.config.invert {
            imageops::invert(&mut mask);
        }
        let mask = preprocess::open_close(&mask, CLEANUP_RADIUS);

        // Steps 4-5: dominant region.
        let region = largest_outline(&mask)?;
        let area = region.area();
        let min_area = self.config.min_area_ratio * (width as f64 * height as f64);
        if area < min_area {
            debug!(area, min_area, "Region rejected as too small");
            return Err(LoupeError::RegionTooSmall { area, min_area });
        }

        // Steps 6-9: crop, scale, centre.
        let bounds = region.bounding_rect();
        let normalized = normalize(&mask, bounds, self.config.canvas_size);

        // Step 10.
        let outline = largest_outline(&normalized)?;

        info!(
            area,
            crop_w = bounds.width(),
            crop_h = bounds.height(),
            outline_points = outline.len(),
            "Silhouette extracted"
        );

        Ok(ExtractionResult {
            normalized_mask: normalized,
            normalized_outline: outline,
            original_mask: mask,
            region_area: area,
        })
    }
}

/// Free-function form of [`SilhouetteExtractor::extract`].
pub fn extract_silhouette(image: &RgbImage, config: &ExtractConfig) -> Result<ExtractionResult> {
    SilhouetteExtractor::new(config.clone()).extract(image)
}

/// Crop `mask` to `bounds`, scale it uniformly to fit `FIT_RATIO` of the
/// canvas, and paste it centred on a blank `canvas x canvas` mask. An odd
/// leftover margin puts the extra pixel on the bottom/right.
fn normalize(mask: &GrayImage, bounds: Rect, canvas: u32) -> GrayImage {
    let (crop_w, crop_h) = (bounds.width(), bounds.height());
    let cropped = imageops::crop_imm(
        mask,
        bounds.left() as u32,
        bounds.top() as u32,
        crop_w,
        crop_h,
    )
    .to_image();

    let fit = canvas as f64 * FIT_RATIO;
    let scale = (fit / crop_w as f64).min(fit / crop_h as f64);
    let new_w = ((crop_w as f64 * scale) as u32).clamp(1, canvas);
    let new_h = ((crop_h as f64 * scale) as u32).clamp(1, canvas);
    let resized = resize_nearest(&cropped, new_w, new_h);

    let x0 = (canvas - new_w) / 2;
    let y0 = (canvas - new_h) / 2;
    debug!(scale, new_w, new_h, x0, y0, "Shape normalized");

    let mut normalized = GrayImage::new(canvas, canvas);
    imageops::replace(&mut normalized, &resized, x0 as i64, y0 as i64);
    normalized
}

/// Nearest-neighbour resize sampling source pixel `floor(dst * src / dst_len)`.
/// No interpolation, so a 0/255 mask stays 0/255.
fn resize_nearest(src: &GrayImage, width: u32, height: u32) -> GrayImage {
    let (src_w, src_h) = src.dimensions();
    GrayImage::from_fn(width, height, |x, y| {
        let sx = ((x as u64 * src_w as u64) / width as u64).min(src_w as u64 - 1) as u32;
        let sy = ((y as u64 * src_h as u64) / height as u64).min(src_h as u64 - 1) as u32;
        Luma(src.get_pixel(sx, sy).0)
    })
}

/// True when every pixel has the same value: there is no figure/ground split
/// to find.
fn is_flat(gray: &GrayImage) -> bool {
    let mut values = gray.pixels().map(|p| p.0[0]);
    match values.next() {
        Some(first) => values.all(|v| v == first),
        None => true,
    }
}
