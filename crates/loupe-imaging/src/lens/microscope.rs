// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Microscope — magnified, contrast-enhanced views of a point in an image.

use image::imageops::{self, FilterType};
use image::RgbImage;
use imageproc::rect::Rect;
use loupe_core::config::{LensConfig, LoupeLensConfig};
use loupe_core::error::{LoupeError, Result};
use tracing::{debug, instrument};

use super::equalize::{blend_equalize, clahe_rgb};

/// Strength at or below which the loupe skips equalization.
const MIN_STRENGTH: f32 = 0.001;

/// A rendered lens and the source window it was taken from.
#[derive(Debug, Clone)]
pub struct LensView {
    pub image: RgbImage,
    /// Source pixels covered by the lens.
    pub window: Rect,
}

/// Two lenses over one image:
///
/// - [`inspect`](Self::inspect) crops a disc-sized window around the point,
///   runs CLAHE on its lightness and magnifies it.
/// - [`loupe`](Self::loupe) samples a smaller window, scales it up to a fixed
///   lens size and blends in global equalization.
#[derive(Debug, Clone, Default)]
pub struct Microscope {
    lens: LensConfig,
    loupe: LoupeLensConfig,
}

impl Microscope {
    pub fn new(lens: LensConfig, loupe: LoupeLensConfig) -> Self {
        Self { lens, loupe }
    }

    #[instrument(skip(self, image), fields(diameter = self.lens.diameter, magnification = self.lens.magnification))]
    pub fn inspect(&self, image: &RgbImage, center: (u32, u32)) -> Result<LensView> {
        self.lens.validate()?;
        check_center(image, center)?;

        let (width, height) = image.dimensions();
        let radius = self.lens.diameter / 2;
        let x0 = center.0.saturating_sub(radius);
        let y0 = center.1.saturating_sub(radius);
        let x1 = center.0.saturating_add(radius).min(width);
        let y1 = center.1.saturating_add(radius).min(height);
        if x1 <= x0 || y1 <= y0 {
            return Err(LoupeError::InvalidParameter(format!(
                "lens at {center:?} covers no pixels"
            )));
        }
        let window = Rect::at(x0 as i32, y0 as i32).of_size(x1 - x0, y1 - y0);

        let mut crop = imageops::crop_imm(image, x0, y0, x1 - x0, y1 - y0).to_image();
        if self.lens.clip_limit > 0.0 {
            crop = clahe_rgb(&crop, self.lens.clip_limit, self.lens.tile_grid);
        }

        let m = self.lens.magnification;
        let out_w = ((crop.width() as f32 * m).round() as u32).max(1);
        let out_h = ((crop.height() as f32 * m).round() as u32).max(1);
        let magnified = imageops::resize(&crop, out_w, out_h, FilterType::Lanczos3);
        debug!(window_w = window.width(), window_h = window.height(), out_w, out_h, "Lens rendered");

        Ok(LensView { image: magnified, window })
    }

    #[instrument(skip(self, image), fields(size = self.loupe.size, zoom = self.loupe.zoom))]
    pub fn loupe(&self, image: &RgbImage, center: (u32, u32)) -> Result<LensView> {
        self.loupe.validate()?;
        check_center(image, center)?;

        let (width, height) = image.dimensions();
        let side = ((self.loupe.size as f32 / self.loupe.zoom).round() as u32).max(1);
        let (win_w, win_h) = (side.min(width), side.min(height));
        let x0 = center.0.saturating_sub(win_w / 2).min(width - win_w);
        let y0 = center.1.saturating_sub(win_h / 2).min(height - win_h);
        let window = Rect::at(x0 as i32, y0 as i32).of_size(win_w, win_h);

        let sample = imageops::crop_imm(image, x0, y0, win_w, win_h).to_image();
        let out = self.loupe.size.max(2);
        let mut scaled = imageops::resize(&sample, out, out, FilterType::Lanczos3);
        if self.loupe.strength > MIN_STRENGTH {
            blend_equalize(&mut scaled, self.loupe.strength);
        }
        debug!(x0, y0, win_w, win_h, "Loupe rendered");

        Ok(LensView { image: scaled, window })
    }
}

fn check_center(image: &RgbImage, (x, y): (u32, u32)) -> Result<()> {
    if x >= image.width() || y >= image.height() {
        return Err(LoupeError::InvalidParameter(format!(
            "point ({x}, {y}) is outside the {}x{} image",
            image.width(),
            image.height()
        )));
    }
    Ok(())
}
