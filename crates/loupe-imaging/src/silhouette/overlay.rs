// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Overlay renderer — draws an outline in colour over its mask.

use image::{GrayImage, Rgb, RgbImage};
use imageproc::drawing::draw_line_segment_mut;

use super::outline::Outline;

/// Pixel offsets that thicken a one-pixel segment into a 2px stroke.
const STROKE: [(f32, f32); 4] = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0), (1.0, 1.0)];

/// Render `outline` as a closed 2px polyline on a colour copy of `mask`.
///
/// The mask itself is not modified.
pub fn outline_overlay(mask: &GrayImage, outline: &Outline, color: Rgb<u8>) -> RgbImage {
    let mut canvas = RgbImage::from_fn(mask.width(), mask.height(), |x, y| {
        let v = mask.get_pixel(x, y).0[0];
        Rgb([v, v, v])
    });
    draw_outline_mut(&mut canvas, outline, color);
    canvas
}

/// Draw `outline` as a closed polyline onto `canvas` in place.
pub fn draw_outline_mut(canvas: &mut RgbImage, outline: &Outline, color: Rgb<u8>) {
    let points = outline.points();
    match points.len() {
        0 => {}
        1 => {
            let p = points[0];
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < canvas.width() && (p.y as u32) < canvas.height() {
                canvas.put_pixel(p.x as u32, p.y as u32, color);
            }
        }
        n => {
            for i in 0..n {
                let a = points[i];
                let b = points[(i + 1) % n];
                for (dx, dy) in STROKE {
                    draw_line_segment_mut(
                        canvas,
                        (a.x as f32 + dx, a.y as f32 + dy),
                        (b.x as f32 + dx, b.y as f32 + dy),
                        color,
                    );
                }
            }
        }
    }
}
