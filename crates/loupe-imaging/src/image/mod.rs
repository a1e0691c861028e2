// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Image module — decode/encode boundary and the built-in demo subject.

pub mod codec;
pub mod demo;

pub use codec::Raster;
pub use demo::demo_image;
