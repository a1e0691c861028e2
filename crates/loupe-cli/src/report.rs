// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Batch report — what went in, what came out, and what failed, as JSON.
//
// Inputs are fingerprinted with SHA-256 so a report can be matched to the
// exact evidence files it was produced from.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use loupe_core::config::ExtractConfig;
use loupe_core::error::{LoupeError, Result};
use loupe_core::human_errors::{HumanError, humanize_error};
use loupe_core::types::{ImageId, ViewCategory};
use loupe_imaging::OutlineStats;
use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, instrument};

/// Lowercase hex SHA-256 digest of `data`.
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchReport {
    pub generated_at: DateTime<Utc>,
    pub settings: ExtractConfig,
    /// One entry per input, in the order the inputs were given.
    pub images: Vec<ImageReport>,
    /// One entry per category that had at least one usable mask.
    pub categories: Vec<CategoryReport>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ImageReport {
    /// Absent when the input never decoded.
    pub id: Option<ImageId>,
    pub path: PathBuf,
    pub category: ViewCategory,
    /// Absent when the input could not be read.
    pub sha256: Option<String>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

#[derive(Debug, Clone, Serialize)]
pub struct CategoryReport {
    pub category: ViewCategory,
    pub contributors: usize,
    #[serde(flatten)]
    pub outcome: Outcome,
}

/// Result of one step, tagged by `status` in the JSON.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum Outcome {
    Ok {
        /// Enclosed area before normalization, in source pixels. Not set for
        /// consensus shapes.
        #[serde(skip_serializing_if = "Option::is_none")]
        region_area: Option<f64>,
        outline: OutlineStats,
        outputs: Vec<PathBuf>,
    },
    Failed {
        error: HumanError,
        detail: String,
    },
}

impl Outcome {
    pub fn failed(err: &LoupeError) -> Self {
        Self::Failed {
            error: humanize_error(err),
            detail: err.to_string(),
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, Self::Ok { .. })
    }
}

impl BatchReport {
    pub fn new(settings: ExtractConfig) -> Self {
        Self {
            generated_at: Utc::now(),
            settings,
            images: Vec::new(),
            categories: Vec::new(),
        }
    }

    pub fn failed_images(&self) -> usize {
        self.images.iter().filter(|image| !image.outcome.is_ok()).count()
    }

    /// Write the report as pretty-printed JSON.
    #[instrument(skip(self), fields(path = %path.display()))]
    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        debug!(images = self.images.len(), "Report written");
        Ok(())
    }
}
