// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Built-in demo subject for trying the lenses without an upload.

use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_line_segment_mut};

const DEMO_WIDTH: u32 = 1080;
const DEMO_HEIGHT: u32 = 720;
const GRID_STEP: usize = 40;
const RING_RADIUS: i32 = 200;
const RING_STROKE: i32 = 6;

/// A 1080x720 gradient with a 40-pixel coloured grid and a white ring at the
/// centre. Fine grid lines and a smooth ramp make equalization and
/// magnification artefacts easy to see.
pub fn demo_image() -> RgbImage {
    let mut canvas = RgbImage::from_fn(DEMO_WIDTH, DEMO_HEIGHT, |_, y| {
        Rgb([
            (90 + y / 3).min(255) as u8,
            (30 + y / 5).min(255) as u8,
            (40 + y / 4).min(255) as u8,
        ])
    });

    let (w, h) = (DEMO_WIDTH as f32, DEMO_HEIGHT as f32);
    for x in (0..DEMO_WIDTH as usize).step_by(GRID_STEP) {
        let color = Rgb([220, 160, (x % 255) as u8]);
        draw_line_segment_mut(&mut canvas, (x as f32, 0.0), (x as f32, h), color);
    }
    for y in (0..DEMO_HEIGHT as usize).step_by(GRID_STEP) {
        let color = Rgb([120, (y % 255) as u8, 220]);
        draw_line_segment_mut(&mut canvas, (0.0, y as f32), (w, y as f32), color);
    }

    let centre = ((DEMO_WIDTH / 2) as i32, (DEMO_HEIGHT / 2) as i32);
    let white = Rgb([255, 255, 255]);
    for offset in -(RING_STROKE / 2)..(RING_STROKE / 2) {
        draw_hollow_circle_mut(&mut canvas, centre, RING_RADIUS + offset, white);
    }

    canvas
}
