// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// CIE L*a*b* planes for lightness-only contrast work.

use image::{GrayImage, Luma, Rgb, RgbImage};

/// D65 reference white.
const D65: [f32; 3] = [0.95047, 1.0, 1.08883];

/// sRGB to XYZ (D65).
const SRGB_TO_XYZ: [[f32; 3]; 3] = [
    [0.4124564, 0.3575761, 0.1804375],
    [0.2126729, 0.7151522, 0.0721750],
    [0.0193339, 0.119_192, 0.9503041],
];

/// XYZ to sRGB (D65).
const XYZ_TO_SRGB: [[f32; 3]; 3] = [
    [3.2404542, -1.5371385, -0.4985314],
    [-0.969_266, 1.8760108, 0.0415560],
    [0.0556434, -0.2040259, 1.0572252],
];

/// An RGB image split into an 8-bit lightness plane and floating-point
/// chroma planes.
///
/// Lightness uses the usual 8-bit convention, `L * 255 / 100`, so it can be
/// fed straight into a histogram method. Chroma keeps full precision, so a
/// split/merge round trip only loses what lightness quantization loses.
#[derive(Debug, Clone)]
pub struct LabPlanes {
    pub lightness: GrayImage,
    a: Vec<f32>,
    b: Vec<f32>,
}

impl LabPlanes {
    pub fn from_rgb(image: &RgbImage) -> Self {
        let (width, height) = image.dimensions();
        let mut lightness = GrayImage::new(width, height);
        let mut a = Vec::with_capacity(width as usize * height as usize);
        let mut b = Vec::with_capacity(width as usize * height as usize);

        for (x, y, pixel) in image.enumerate_pixels() {
            let [l, pa, pb] = rgb_to_lab(*pixel);
            lightness.put_pixel(x, y, Luma([(l * 255.0 / 100.0).round().clamp(0.0, 255.0) as u8]));
            a.push(pa);
            b.push(pb);
        }
        Self { lightness, a, b }
    }

    pub fn to_rgb(&self) -> RgbImage {
        let width = self.lightness.width();
        RgbImage::from_fn(width, self.lightness.height(), |x, y| {
            let i = y as usize * width as usize + x as usize;
            let l = self.lightness.get_pixel(x, y).0[0] as f32 * 100.0 / 255.0;
            lab_to_rgb([l, self.a[i], self.b[i]])
        })
    }
}

fn rgb_to_lab(pixel: Rgb<u8>) -> [f32; 3] {
    let [r, g, b] = pixel.0.map(|c| srgb_to_linear(c as f32 / 255.0));
    let xyz = SRGB_TO_XYZ.map(|row| row[0] * r + row[1] * g + row[2] * b);
    let [fx, fy, fz] = [0, 1, 2].map(|i| lab_f(xyz[i] / D65[i]));
    [116.0 * fy - 16.0, 500.0 * (fx - fy), 200.0 * (fy - fz)]
}

fn lab_to_rgb([l, a, b]: [f32; 3]) -> Rgb<u8> {
    let fy = (l + 16.0) / 116.0;
    let f = [a / 500.0 + fy, fy, fy - b / 200.0];
    let [x, y, z] = [0, 1, 2].map(|i| D65[i] * lab_f_inv(f[i]));
    let rgb = XYZ_TO_SRGB.map(|row| row[0] * x + row[1] * y + row[2] * z);
    Rgb(rgb.map(|c| (linear_to_srgb(c.clamp(0.0, 1.0)) * 255.0).round().clamp(0.0, 255.0) as u8))
}

fn lab_f(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA * DELTA * DELTA {
        t.cbrt()
    } else {
        t / (3.0 * DELTA * DELTA) + 4.0 / 29.0
    }
}

fn lab_f_inv(t: f32) -> f32 {
    const DELTA: f32 = 6.0 / 29.0;
    if t > DELTA {
        t * t * t
    } else {
        3.0 * DELTA * DELTA * (t - 4.0 / 29.0)
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

fn linear_to_srgb(c: f32) -> f32 {
    if c <= 0.0031308 {
        c * 12.92
    } else {
        1.055 * c.powf(1.0 / 2.4) - 0.055
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn white_and_black_hit_the_lightness_extremes() {
        let img = RgbImage::from_fn(2, 1, |x, _| if x == 0 { Rgb([255, 255, 255]) } else { Rgb([0, 0, 0]) });
        let planes = LabPlanes::from_rgb(&img);
        assert_eq!(planes.lightness.get_pixel(0, 0).0[0], 255);
        assert_eq!(planes.lightness.get_pixel(1, 0).0[0], 0);
    }

    #[test]
    fn greys_have_no_chroma() {
        let [_, a, b] = rgb_to_lab(Rgb([128, 128, 128]));
        assert!(a.abs() < 0.5 && b.abs() < 0.5, "a={a} b={b}");
    }

    #[test]
    fn round_trip_is_close() {
        let img = RgbImage::from_fn(16, 16, |x, y| Rgb([(x * 16) as u8, (y * 16) as u8, 200 - (x * 5) as u8]));
        let back = LabPlanes::from_rgb(&img).to_rgb();
        for (p, q) in img.pixels().zip(back.pixels()) {
            for c in 0..3 {
                let d = (p.0[c] as i32 - q.0[c] as i32).abs();
                assert!(d <= 3, "{p:?} -> {q:?}");
            }
        }
    }
}
