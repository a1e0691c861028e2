// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Plain-language error messages, shown inline next to the image that failed.
//
// A batch keeps going after a per-image failure, so each message must tell the
// user what to change about that one image.

use serde::Serialize;

use crate::error::LoupeError;

/// Who can fix the problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// The user can fix it by changing the image or a setting.
    ActionRequired,
    /// Retrying with the same input will not help.
    Permanent,
}

/// A human-readable error with a plain message and an actionable suggestion.
#[derive(Debug, Clone, Serialize)]
pub struct HumanError {
    /// Short summary (shown as a heading).
    pub message: String,
    /// What the user should try (shown as body text).
    pub suggestion: String,
    pub severity: Severity,
}

/// Convert a `LoupeError` into a `HumanError`.
pub fn humanize_error(err: &LoupeError) -> HumanError {
    match err {
        LoupeError::InvalidParameter(detail) => HumanError {
            message: "One of the settings is out of range.".into(),
            suggestion: format!("Adjust the setting and try again. ({detail})"),
            severity: Severity::ActionRequired,
        },

        // -- Shape pipeline --
        LoupeError::NoShapeFound => HumanError {
            message: "No visible shape was found.".into(),
            suggestion: "Try increasing contrast or changing threshold mode.".into(),
            severity: Severity::ActionRequired,
        },

        LoupeError::RegionTooSmall { .. } => HumanError {
            message: "Detected contour is too small.".into(),
            suggestion: "Crop tighter around the head/silhouette.".into(),
            severity: Severity::ActionRequired,
        },

        LoupeError::EmptyInput => HumanError {
            message: "There are no shapes to combine.".into(),
            suggestion: "Label at least one image with this view before building a consensus shape.".into(),
            severity: Severity::ActionRequired,
        },

        LoupeError::DimensionMismatch { index, .. } => HumanError {
            message: "The shapes are not the same size.".into(),
            suggestion: format!(
                "Shape {} was not produced on the shared canvas. Re-extract it with the same canvas size.",
                index + 1
            ),
            severity: Severity::ActionRequired,
        },

        // -- Codec boundary --
        LoupeError::DecodeFailure(_) => HumanError {
            message: "This image couldn't be opened.".into(),
            suggestion: "The file may be damaged or in an unusual format. Try saving it as a JPEG or PNG first.".into(),
            severity: Severity::Permanent,
        },

        LoupeError::EncodeFailure(_) => HumanError {
            message: "The result couldn't be saved in that format.".into(),
            suggestion: "Try exporting as PNG instead.".into(),
            severity: Severity::Permanent,
        },

        // -- Storage --
        LoupeError::Io(io_err) => {
            if io_err.kind() == std::io::ErrorKind::NotFound {
                HumanError {
                    message: "The file couldn't be found.".into(),
                    suggestion: "It may have been moved or deleted. Try choosing the file again.".into(),
                    severity: Severity::ActionRequired,
                }
            } else if io_err.kind() == std::io::ErrorKind::PermissionDenied {
                HumanError {
                    message: "Loupe doesn't have permission to use that file.".into(),
                    suggestion: "Check the file permissions, or copy the file somewhere else first.".into(),
                    severity: Severity::ActionRequired,
                }
            } else {
                HumanError {
                    message: "There was a problem reading or writing a file.".into(),
                    suggestion: "Check that the output folder exists and the disk is not full.".into(),
                    severity: Severity::Permanent,
                }
            }
        }

        LoupeError::Serialization(_) => HumanError {
            message: "The settings file couldn't be read.".into(),
            suggestion: "Check the file is valid JSON with the expected field names.".into(),
            severity: Severity::ActionRequired,
        },
    }
}
