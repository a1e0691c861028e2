// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Unified error types for Loupe.

use thiserror::Error;

/// Top-level error type for all Loupe operations.
///
/// Every variant is local and recoverable by the caller: a failure affects one
/// image or one combination step, never the rest of a batch.
#[derive(Debug, Error)]
pub enum LoupeError {
    // -- Validation --
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    // -- Shape pipeline --
    #[error("no visible shape was found")]
    NoShapeFound,

    #[error("detected region is too small: area {area:.1} below minimum {min_area:.1}")]
    RegionTooSmall { area: f64, min_area: f64 },

    #[error("no masks were provided for combination")]
    EmptyInput,

    #[error("mask {index} is {}x{}, expected {}x{}", actual.0, actual.1, expected.0, expected.1)]
    DimensionMismatch {
        index: usize,
        expected: (u32, u32),
        actual: (u32, u32),
    },

    // -- Codec boundary --
    #[error("image decoding failed: {0}")]
    DecodeFailure(String),

    #[error("image encoding failed: {0}")]
    EncodeFailure(String),

    // -- Storage / persistence --
    #[error("file I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, LoupeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dimension_mismatch_message_names_both_sizes() {
        let err = LoupeError::DimensionMismatch {
            index: 2,
            expected: (512, 512),
            actual: (256, 300),
        };
        assert_eq!(err.to_string(), "mask 2 is 256x300, expected 512x512");
    }

    #[test]
    fn io_errors_convert() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: LoupeError = io.into();
        assert!(matches!(err, LoupeError::Io(_)));
    }
}
