// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Inspection lenses — CLAHE microscope and equalizing loupe.

pub mod equalize;
pub mod lab;
pub mod microscope;

pub use equalize::{blend_equalize, clahe, clahe_rgb};
pub use microscope::{LensView, Microscope};
