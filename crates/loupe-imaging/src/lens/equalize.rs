// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Histogram equalization — tiled (CLAHE) and blended global variants.

use image::{GrayImage, Luma, RgbImage};

use super::lab::LabPlanes;

/// Contrast-limited adaptive histogram equalization of an 8-bit plane.
///
/// The plane is split into at most `grid x grid` tiles (fewer when the plane
/// is smaller than the grid; the last row and column absorb any remainder).
/// Each tile histogram is clipped at `max(1, clip_limit * tile_pixels / 256)`,
/// the clipped excess is spread over all bins, and the tile's lookup table is
/// its scaled CDF. Pixels blend the four nearest tile tables bilinearly.
pub fn clahe(gray: &GrayImage, clip_limit: f32, grid: u32) -> GrayImage {
    let (width, height) = gray.dimensions();
    if width == 0 || height == 0 || grid == 0 {
        return gray.clone();
    }
    let tiles_x = grid.min(width) as usize;
    let tiles_y = grid.min(height) as usize;
    let tile_w = width as usize / tiles_x;
    let tile_h = height as usize / tiles_y;

    let mut luts = vec![[0u8; 256]; tiles_x * tiles_y];
    for ty in 0..tiles_y {
        for tx in 0..tiles_x {
            let x0 = tx * tile_w;
            let y0 = ty * tile_h;
            let x1 = if tx == tiles_x - 1 { width as usize } else { x0 + tile_w };
            let y1 = if ty == tiles_y - 1 { height as usize } else { y0 + tile_h };

            let mut hist = [0u32; 256];
            for y in y0..y1 {
                for x in x0..x1 {
                    hist[gray.get_pixel(x as u32, y as u32).0[0] as usize] += 1;
                }
            }
            let tile_pixels = ((x1 - x0) * (y1 - y0)) as u32;
            clip_histogram(&mut hist, clip_limit, tile_pixels);
            luts[ty * tiles_x + tx] = cdf_lut(&hist, tile_pixels);
        }
    }

    GrayImage::from_fn(width, height, |x, y| {
        let value = gray.get_pixel(x, y).0[0] as usize;
        let fx = (x as f32 + 0.5) / tile_w as f32 - 0.5;
        let fy = (y as f32 + 0.5) / tile_h as f32 - 0.5;
        let (tx0, tx1) = neighbours(fx, tiles_x);
        let (ty0, ty1) = neighbours(fy, tiles_y);
        let ax = fx - fx.floor();
        let ay = fy - fy.floor();

        let lookup = |tx: usize, ty: usize| luts[ty * tiles_x + tx][value] as f32;
        let top = lookup(tx0, ty0) * (1.0 - ax) + lookup(tx1, ty0) * ax;
        let bottom = lookup(tx0, ty1) * (1.0 - ax) + lookup(tx1, ty1) * ax;
        let blended = top * (1.0 - ay) + bottom * ay;
        Luma([blended.round().clamp(0.0, 255.0) as u8])
    })
}

/// CLAHE on the lightness of a colour image; chroma is left alone.
pub fn clahe_rgb(image: &RgbImage, clip_limit: f32, grid: u32) -> RgbImage {
    let mut planes = LabPlanes::from_rgb(image);
    planes.lightness = clahe(&planes.lightness, clip_limit, grid);
    planes.to_rgb()
}

/// Global histogram equalization of luminance, mixed with the original by
/// `strength` (0 keeps the image, 1 is full equalization). Channels are
/// scaled together so hue is roughly preserved.
pub fn blend_equalize(image: &mut RgbImage, strength: f32) {
    let total = image.width() as f64 * image.height() as f64;
    if total == 0.0 {
        return;
    }

    let mut hist = [0u32; 256];
    let luminance: Vec<u8> = image
        .pixels()
        .map(|p| {
            let [r, g, b] = p.0.map(f32::from);
            let y = (0.2126 * r + 0.7152 * g + 0.0722 * b).round().clamp(0.0, 255.0) as u8;
            hist[y as usize] += 1;
            y
        })
        .collect();

    let mut cdf_map = [0u8; 256];
    let mut running = 0u64;
    for (slot, count) in cdf_map.iter_mut().zip(hist) {
        running += count as u64;
        *slot = ((running as f64 / total) * 255.0).round() as u8;
    }
    let cdf_min = hist
        .iter()
        .position(|&count| count > 0)
        .map_or(0.0, |first| cdf_map[first] as f64);
    let span = if cdf_min >= 255.0 { 1.0 } else { 255.0 - cdf_min };

    let strength = strength.clamp(0.0, 1.0) as f64;
    for (pixel, old) in image.pixels_mut().zip(luminance) {
        let old = old as f64;
        let mapped = (((cdf_map[old as usize] as f64 - cdf_min) / span) * 255.0)
            .round()
            .clamp(0.0, 255.0);
        let target = old + (mapped - old) * strength;
        let factor = target / if old == 0.0 { 1.0 } else { old };
        for channel in pixel.0.iter_mut() {
            *channel = (*channel as f64 * factor).round().clamp(0.0, 255.0) as u8;
        }
    }
}

fn clip_histogram(hist: &mut [u32; 256], clip_limit: f32, tile_pixels: u32) {
    let clip = ((clip_limit * tile_pixels as f32 / 256.0) as u32).max(1);
    let mut excess = 0u32;
    for bin in hist.iter_mut() {
        if *bin > clip {
            excess += *bin - clip;
            *bin = clip;
        }
    }
    let per_bin = excess / 256;
    let remainder = (excess % 256) as usize;
    for (i, bin) in hist.iter_mut().enumerate() {
        *bin += per_bin + u32::from(i < remainder);
    }
}

fn cdf_lut(hist: &[u32; 256], tile_pixels: u32) -> [u8; 256] {
    let scale = 255.0 / tile_pixels.max(1) as f32;
    let mut lut = [0u8; 256];
    let mut sum = 0u32;
    for (slot, count) in lut.iter_mut().zip(hist) {
        sum += count;
        *slot = (sum as f32 * scale).round().clamp(0.0, 255.0) as u8;
    }
    lut
}

/// Indices of the two tiles whose centres bracket position `f`.
fn neighbours(f: f32, tiles: usize) -> (usize, usize) {
    let last = tiles as i32 - 1;
    let lo = f.floor() as i32;
    (lo.clamp(0, last) as usize, (lo + 1).clamp(0, last) as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    fn spread(gray: &GrayImage) -> u8 {
        let min = gray.pixels().map(|p| p.0[0]).min().unwrap_or(0);
        let max = gray.pixels().map(|p| p.0[0]).max().unwrap_or(0);
        max - min
    }

    #[test]
    fn clahe_keeps_dimensions() {
        let gray = GrayImage::from_pixel(80, 60, Luma([128]));
        assert_eq!(clahe(&gray, 2.0, 8).dimensions(), (80, 60));
    }

    #[test]
    fn clahe_uniform_image_stays_uniform() {
        let gray = GrayImage::from_pixel(64, 64, Luma([128]));
        let out = clahe(&gray, 2.0, 8);
        let first = out.get_pixel(0, 0).0[0];
        assert!(out.pixels().all(|p| p.0[0] == first));
    }

    #[test]
    fn clahe_stretches_low_contrast() {
        let gray = GrayImage::from_fn(128, 128, |x, y| Luma([100 + ((x + y) % 12) as u8]));
        let out = clahe(&gray, 10.0, 2);
        assert!(spread(&out) > 3 * spread(&gray), "spread {}", spread(&out));
    }

    #[test]
    fn clahe_handles_planes_smaller_than_grid() {
        let gray = GrayImage::from_fn(3, 5, |x, y| Luma([(x * 40 + y * 10) as u8]));
        let out = clahe(&gray, 4.0, 8);
        assert_eq!(out.dimensions(), (3, 5));
    }

    #[test]
    fn clahe_preserves_ordering_within_a_tile() {
        let gray = GrayImage::from_fn(16, 16, |x, _| Luma([(x * 8) as u8]));
        let out = clahe(&gray, 10.0, 1);
        for x in 1..16 {
            assert!(out.get_pixel(x, 0).0[0] >= out.get_pixel(x - 1, 0).0[0]);
        }
    }

    #[test]
    fn clahe_rgb_keeps_grey_neutral() {
        let img = RgbImage::from_fn(32, 32, |x, _| {
            let v = 90 + (x % 8) as u8;
            Rgb([v, v, v])
        });
        let out = clahe_rgb(&img, 4.0, 4);
        for p in out.pixels() {
            let [r, g, b] = p.0;
            assert!(r.abs_diff(g) <= 2 && g.abs_diff(b) <= 2, "{p:?}");
        }
    }

    #[test]
    fn blend_zero_strength_is_identity_for_lit_pixels() {
        let mut img = RgbImage::from_fn(10, 10, |x, y| Rgb([40 + x as u8 * 5, 60 + y as u8 * 3, 90]));
        let before = img.clone();
        blend_equalize(&mut img, 0.0);
        assert_eq!(img, before);
    }

    #[test]
    fn blend_full_strength_stretches_two_levels() {
        let mut img = RgbImage::from_fn(10, 10, |x, _| if x < 5 { Rgb([100, 100, 100]) } else { Rgb([110, 110, 110]) });
        blend_equalize(&mut img, 1.0);
        assert_eq!(*img.get_pixel(0, 0), Rgb([0, 0, 0]));
        assert_eq!(*img.get_pixel(9, 0), Rgb([255, 255, 255]));
    }

    #[test]
    fn blend_partial_strength_lands_in_between() {
        let mut img = RgbImage::from_fn(10, 10, |x, _| if x < 5 { Rgb([100, 100, 100]) } else { Rgb([110, 110, 110]) });
        blend_equalize(&mut img, 0.5);
        let dark = img.get_pixel(0, 0).0[0];
        let light = img.get_pixel(9, 0).0[0];
        assert!((45..=55).contains(&dark), "dark {dark}");
        assert!((178..=188).contains(&light), "light {light}");
    }
}
