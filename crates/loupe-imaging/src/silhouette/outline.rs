// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Outlines — external boundaries of foreground regions in a binary mask.

use image::GrayImage;
use imageproc::contours::{BorderType, find_contours};
use imageproc::point::Point;
use imageproc::rect::Rect;
use loupe_core::error::{LoupeError, Result};
use serde::Serialize;
use tracing::{debug, instrument};

/// Ordered boundary points of one connected foreground region.
///
/// Straight horizontal, vertical and diagonal runs are compressed to their end
/// points, so consecutive points may be more than one pixel apart. The
/// polygon is implicitly closed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outline {
    points: Vec<Point<i32>>,
}

/// Serializable measurements of an outline.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct OutlineStats {
    pub area: f64,
    pub points: usize,
    /// `[left, top, width, height]`
    pub bounds: [i64; 4],
}

impl Outline {
    fn from_border(points: Vec<Point<i32>>) -> Self {
        Self {
            points: compress_straight_runs(points),
        }
    }

    pub fn points(&self) -> &[Point<i32>] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Enclosed polygon area (shoelace formula). Boundaries run through pixel
    /// centres, so a filled `n x n` square measures `(n - 1)^2`.
    pub fn area(&self) -> f64 {
        let n = self.points.len();
        if n < 3 {
            return 0.0;
        }
        let mut twice_area = 0i64;
        for i in 0..n {
            let a = self.points[i];
            let b = self.points[(i + 1) % n];
            twice_area += a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64;
        }
        twice_area.abs() as f64 / 2.0
    }

    /// Smallest axis-aligned rectangle containing every boundary pixel.
    pub fn bounding_rect(&self) -> Rect {
        let (mut min_x, mut min_y) = (i32::MAX, i32::MAX);
        let (mut max_x, mut max_y) = (i32::MIN, i32::MIN);
        for p in &self.points {
            min_x = min_x.min(p.x);
            min_y = min_y.min(p.y);
            max_x = max_x.max(p.x);
            max_y = max_y.max(p.y);
        }
        if self.points.is_empty() {
            return Rect::at(0, 0).of_size(1, 1);
        }
        Rect::at(min_x, min_y).of_size((max_x - min_x + 1) as u32, (max_y - min_y + 1) as u32)
    }

    pub fn stats(&self) -> OutlineStats {
        let rect = self.bounding_rect();
        OutlineStats {
            area: self.area(),
            points: self.points.len(),
            bounds: [
                rect.left() as i64,
                rect.top() as i64,
                rect.width() as i64,
                rect.height() as i64,
            ],
        }
    }
}

/// Outer boundaries of all top-level regions. Islands inside holes are not
/// reported.
pub fn external_outlines(mask: &GrayImage) -> Vec<Outline> {
    find_contours::<i32>(mask)
        .into_iter()
        .filter(|c| c.border_type == BorderType::Outer && c.parent.is_none())
        .map(|c| Outline::from_border(c.points))
        .collect()
}

/// Outline of the region with the greatest enclosed area. Ties keep the
/// region found first in raster order.
#[instrument(skip(mask), fields(width = mask.width(), height = mask.height()))]
pub fn largest_outline(mask: &GrayImage) -> Result<Outline> {
    let mut best: Option<(f64, Outline)> = None;
    let mut candidates = 0usize;
    for outline in external_outlines(mask) {
        candidates += 1;
        let area = outline.area();
        if best.as_ref().is_none_or(|(best_area, _)| area > *best_area) {
            best = Some((area, outline));
        }
    }
    let (area, outline) = best.ok_or(LoupeError::NoShapeFound)?;
    debug!(candidates, area, points = outline.len(), "Largest region selected");
    Ok(outline)
}

/// Keep only the points where the boundary changes direction.
fn compress_straight_runs(points: Vec<Point<i32>>) -> Vec<Point<i32>> {
    let n = points.len();
    if n < 3 {
        return points;
    }
    let step = |a: Point<i32>, b: Point<i32>| (b.x - a.x, b.y - a.y);
    let kept: Vec<Point<i32>> = (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let next = points[(i + 1) % n];
            step(prev, points[i]) != step(points[i], next)
        })
        .map(|i| points[i])
        .collect();
    // A closed loop always turns somewhere; an empty result means the border
    // was degenerate, so fall back to the raw trace.
    if kept.is_empty() { points } else { kept }
}
