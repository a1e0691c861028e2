// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Silhouette pipeline — extraction, consensus and overlay rendering.

pub mod batch;
pub mod combine;
pub mod extract;
pub mod outline;
pub mod overlay;
pub mod preprocess;

pub use batch::{BatchOutcome, CategoryBuckets, SubjectImage};
pub use combine::{Consensus, combine_shapes};
pub use extract::{ExtractionResult, SilhouetteExtractor, extract_silhouette};
pub use outline::{Outline, OutlineStats, largest_outline};
pub use overlay::{draw_outline_mut, outline_overlay};
