// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Mask preparation — intensity conversion, smoothing, binarization and
// morphological cleanup.

use image::{GrayImage, Luma, RgbImage};
use imageproc::distance_transform::Norm;
use imageproc::filter::separable_filter_equal;
use imageproc::morphology;
use imageproc::stats::histogram;
use loupe_core::types::ThresholdMode;
use tracing::debug;

/// Blur span applied before thresholding.
pub const BLUR_SPAN: usize = 5;
/// Neighbourhood span of the adaptive threshold.
pub const ADAPTIVE_SPAN: usize = 31;
/// Offset subtracted from the local mean in adaptive mode.
pub const ADAPTIVE_BIAS: i32 = 2;

/// Perceptual intensity, `0.299 R + 0.587 G + 0.114 B`, rounded.
pub fn to_intensity(image: &RgbImage) -> GrayImage {
    GrayImage::from_fn(image.width(), image.height(), |x, y| {
        let [r, g, b] = image.get_pixel(x, y).0;
        let luma = 0.299 * r as f32 + 0.587 * g as f32 + 0.114 * b as f32;
        Luma([luma.round().clamp(0.0, 255.0) as u8])
    })
}

/// Normalized 1-D Gaussian taps for an odd `span`. Spans up to 7 use the
/// classic binomial tables; larger spans derive sigma from the span.
pub fn gaussian_kernel(span: usize) -> Vec<f32> {
    match span {
        1 => vec![1.0],
        3 => vec![0.25, 0.5, 0.25],
        5 => vec![0.0625, 0.25, 0.375, 0.25, 0.0625],
        7 => vec![0.03125, 0.109375, 0.21875, 0.28125, 0.21875, 0.109375, 0.03125],
        _ => {
            let sigma = 0.3 * ((span as f32 - 1.0) * 0.5 - 1.0) + 0.8;
            let half = (span / 2) as f32;
            let taps: Vec<f32> = (0..span)
                .map(|i| {
                    let d = i as f32 - half;
                    (-(d * d) / (2.0 * sigma * sigma)).exp()
                })
                .collect();
            let sum: f32 = taps.iter().sum();
            taps.into_iter().map(|t| t / sum).collect()
        }
    }
}

/// Separable Gaussian blur with a fixed tap span.
pub fn smooth(gray: &GrayImage, span: usize) -> GrayImage {
    separable_filter_equal(gray, &gaussian_kernel(span))
}

/// Binarize a smoothed intensity image to 0/255.
pub fn binarize(blurred: &GrayImage, mode: ThresholdMode) -> GrayImage {
    match mode {
        ThresholdMode::Auto => {
            let level = otsu_level(&histogram(blurred).channels[0]);
            debug!(level, "Otsu level computed");
            map_binary(blurred, |_, _, value| value > level)
        }
        ThresholdMode::Adaptive => {
            let local_mean = smooth(blurred, ADAPTIVE_SPAN);
            map_binary(blurred, |x, y, value| {
                let cut = local_mean.get_pixel(x, y).0[0] as i32 - ADAPTIVE_BIAS;
                value as i32 > cut
            })
        }
    }
}

/// Otsu threshold of an 8-bit histogram: the level that maximizes the
/// between-class variance, with pixels `> level` forming the upper class.
/// The first maximum wins. Sums are kept in 64 bits, so camera-sized frames
/// dominated by one bright value do not overflow.
pub fn otsu_level(hist: &[u32; 256]) -> u8 {
    let total: u64 = hist.iter().map(|&h| h as u64).sum();
    let total_sum: u64 = hist
        .iter()
        .enumerate()
        .map(|(value, &h)| value as u64 * h as u64)
        .sum();

    let mut lower_weight = 0u64;
    let mut lower_sum = 0u64;
    let mut best_variance = 0f64;
    let mut best_level = 0u8;
    for (level, &count) in hist.iter().enumerate() {
        lower_weight += count as u64;
        if lower_weight == 0 {
            continue;
        }
        let upper_weight = total - lower_weight;
        if upper_weight == 0 {
            break;
        }
        lower_sum += level as u64 * count as u64;

        let lower_mean = lower_sum as f64 / lower_weight as f64;
        let upper_mean = (total_sum - lower_sum) as f64 / upper_weight as f64;
        let variance = lower_weight as f64 * upper_weight as f64 * (lower_mean - upper_mean).powi(2);
        if variance > best_variance {
            best_variance = variance;
            best_level = level as u8;
        }
    }
    best_level
}

/// Opening then closing with a square structuring element of the given
/// radius (radius 2 is a 5x5 square). Removes speckle, then fills pinholes.
pub fn open_close(mask: &GrayImage, radius: u8) -> GrayImage {
    let opened = morphology::open(mask, Norm::LInf, radius);
    morphology::close(&opened, Norm::LInf, radius)
}

fn map_binary(src: &GrayImage, keep: impl Fn(u32, u32, u8) -> bool) -> GrayImage {
    GrayImage::from_fn(src.width(), src.height(), |x, y| {
        let value = src.get_pixel(x, y).0[0];
        Luma([if keep(x, y, value) { 255 } else { 0 }])
    })
}
