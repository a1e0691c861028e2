// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch extraction and per-category grouping of normalized masks.

use std::collections::BTreeMap;

use image::{GrayImage, RgbImage};
use loupe_core::error::Result;
use loupe_core::types::{ImageId, ViewCategory};
use rayon::prelude::*;
use tracing::{info, instrument, warn};

use super::combine::{Consensus, combine_shapes};
use super::extract::{ExtractionResult, SilhouetteExtractor};

/// A decoded photo waiting to be extracted.
#[derive(Debug, Clone)]
pub struct SubjectImage {
    pub id: ImageId,
    /// Display name, usually the file stem.
    pub name: String,
    pub category: ViewCategory,
    pub image: RgbImage,
}

impl SubjectImage {
    pub fn new(name: impl Into<String>, category: ViewCategory, image: RgbImage) -> Self {
        Self {
            id: ImageId::new(),
            name: name.into(),
            category,
            image,
        }
    }
}

/// Extraction outcome for one [`SubjectImage`]. A failure is reported here
/// and does not abort the rest of the batch.
#[derive(Debug)]
pub struct BatchOutcome {
    pub id: ImageId,
    pub name: String,
    pub category: ViewCategory,
    pub result: Result<ExtractionResult>,
}

impl SilhouetteExtractor {
    /// Extract every subject in parallel. Outcomes come back in input order.
    #[instrument(skip_all, fields(count = subjects.len()))]
    pub fn extract_batch(&self, subjects: &[SubjectImage]) -> Vec<BatchOutcome> {
        let outcomes: Vec<BatchOutcome> = subjects
            .par_iter()
            .map(|subject| BatchOutcome {
                id: subject.id,
                name: subject.name.clone(),
                category: subject.category,
                result: self.extract(&subject.image),
            })
            .collect();

        let mut failed = 0usize;
        for outcome in &outcomes {
            if let Err(e) = &outcome.result {
                failed += 1;
                warn!(name = %outcome.name, category = %outcome.category, error = %e, "Extraction failed");
            }
        }
        info!(total = outcomes.len(), failed, "Batch extraction finished");
        outcomes
    }
}

/// Normalized masks grouped by view category, ready to be combined.
#[derive(Debug, Clone, Default)]
pub struct CategoryBuckets {
    buckets: BTreeMap<ViewCategory, Vec<GrayImage>>,
}

impl CategoryBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, category: ViewCategory, mask: GrayImage) {
        self.buckets.entry(category).or_default().push(mask);
    }

    /// Collect the masks of every successful outcome.
    pub fn from_outcomes(outcomes: &[BatchOutcome]) -> Self {
        let mut buckets = Self::new();
        for outcome in outcomes {
            if let Ok(result) = &outcome.result {
                buckets.push(outcome.category, result.normalized_mask.clone());
            }
        }
        buckets
    }

    pub fn get(&self, category: ViewCategory) -> &[GrayImage] {
        self.buckets.get(&category).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Categories holding at least one mask, in display order.
    pub fn categories(&self) -> impl Iterator<Item = ViewCategory> + '_ {
        self.buckets
            .iter()
            .filter(|(_, masks)| !masks.is_empty())
            .map(|(category, _)| *category)
    }

    /// Combine each non-empty category on its own. Categories with no masks
    /// are skipped rather than reported as errors.
    pub fn combine_all(&self) -> BTreeMap<ViewCategory, Result<Consensus>> {
        self.buckets
            .par_iter()
            .filter(|(_, masks)| !masks.is_empty())
            .map(|(category, masks)| (*category, combine_shapes(masks)))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{filled_circle, head_photo};
    use image::Rgb;
    use loupe_core::error::LoupeError;

    #[test]
    fn batch_keeps_input_order_and_isolates_failures() {
        let subjects = vec![
            SubjectImage::new("a", ViewCategory::Front, head_photo(120, 160)),
            SubjectImage::new("blank", ViewCategory::Front, RgbImage::from_pixel(50, 50, Rgb([255, 255, 255]))),
            SubjectImage::new("b", ViewCategory::Profile, head_photo(160, 200)),
        ];
        let outcomes = SilhouetteExtractor::default().extract_batch(&subjects);

        let names: Vec<&str> = outcomes.iter().map(|o| o.name.as_str()).collect();
        assert_eq!(names, ["a", "blank", "b"]);
        assert_eq!(outcomes[0].id, subjects[0].id);
        assert!(outcomes[0].result.is_ok());
        assert!(matches!(outcomes[1].result, Err(LoupeError::NoShapeFound)));
        assert!(outcomes[2].result.is_ok());
    }

    #[test]
    fn buckets_group_successful_masks_by_category() {
        let subjects = vec![
            SubjectImage::new("f1", ViewCategory::Front, head_photo(120, 160)),
            SubjectImage::new("f2", ViewCategory::Front, head_photo(130, 170)),
            SubjectImage::new("bad", ViewCategory::Profile, RgbImage::new(40, 40)),
        ];
        let outcomes = SilhouetteExtractor::default().extract_batch(&subjects);
        let buckets = CategoryBuckets::from_outcomes(&outcomes);

        assert_eq!(buckets.get(ViewCategory::Front).len(), 2);
        assert!(buckets.get(ViewCategory::Profile).is_empty());
        assert_eq!(buckets.categories().collect::<Vec<_>>(), [ViewCategory::Front]);
    }

    #[test]
    fn combine_all_skips_empty_categories() {
        let mut buckets = CategoryBuckets::new();
        buckets.push(ViewCategory::Profile, filled_circle(64, 64, (32, 32), 20));
        buckets.push(ViewCategory::Profile, filled_circle(64, 64, (33, 32), 20));

        let combined = buckets.combine_all();
        assert_eq!(combined.len(), 1);
        let consensus = combined[&ViewCategory::Profile].as_ref().unwrap();
        assert_eq!(consensus.contributors, 2);
        assert!(!combined.contains_key(&ViewCategory::Front));
    }

    #[test]
    fn combine_all_reports_per_category_errors() {
        let mut buckets = CategoryBuckets::new();
        buckets.push(ViewCategory::Front, filled_circle(64, 64, (32, 32), 20));
        buckets.push(ViewCategory::Front, filled_circle(48, 48, (24, 24), 10));
        buckets.push(ViewCategory::Profile, filled_circle(64, 64, (32, 32), 20));

        let combined = buckets.combine_all();
        assert!(matches!(
            combined[&ViewCategory::Front],
            Err(LoupeError::DimensionMismatch { index: 1, .. })
        ));
        assert!(combined[&ViewCategory::Profile].is_ok());
    }
}
