// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Synthetic rasters shared by the unit tests.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// `w x h` mask with a filled `rw x rh` rectangle at `(x, y)`.
pub(crate) fn filled_rect(w: u32, h: u32, x: u32, y: u32, rw: u32, rh: u32) -> GrayImage {
    GrayImage::from_fn(w, h, |px, py| {
        let inside = px >= x && px < x + rw && py >= y && py < y + rh;
        Luma([if inside { 255 } else { 0 }])
    })
}

/// `w x h` mask with a filled disc.
pub(crate) fn filled_circle(w: u32, h: u32, centre: (i64, i64), radius: i64) -> GrayImage {
    GrayImage::from_fn(w, h, |px, py| {
        let dx = px as i64 - centre.0;
        let dy = py as i64 - centre.1;
        let inside = dx * dx + dy * dy <= radius * radius;
        Luma([if inside { 255 } else { 0 }])
    })
}

/// Colour photo stand-in: a bright ellipse ("head") on a dark background.
pub(crate) fn head_photo(w: u32, h: u32) -> RgbImage {
    let (cx, cy) = (w as f64 / 2.0, h as f64 / 2.0);
    let (rx, ry) = (w as f64 * 0.25, h as f64 * 0.35);
    RgbImage::from_fn(w, h, |x, y| {
        let nx = (x as f64 - cx) / rx;
        let ny = (y as f64 - cy) / ry;
        if nx * nx + ny * ny <= 1.0 {
            Rgb([225, 215, 205])
        } else {
            Rgb([25, 30, 40])
        }
    })
}

/// Expand a binary mask into a black/white colour image.
pub(crate) fn mask_to_rgb(mask: &GrayImage) -> RgbImage {
    RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    })
}

pub(crate) fn foreground_count(mask: &GrayImage) -> usize {
    mask.pixels().filter(|p| p.0[0] > 0).count()
}
