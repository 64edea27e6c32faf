// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Scoring errors.
//!
//! **DDD Context:** Scoring

use thiserror::Error;

/// Failure while scoring arguments against a reaching spec.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    /// The spec awards no points, so there is nothing to normalize by.
    #[error("reaching spec has no scoring points")]
    EmptySpec,

    /// The observed argument list does not fit the recorded one.
    #[error("argument count mismatch: spec has {expected}, call has {actual}")]
    ArityMismatch { expected: usize, actual: usize },

    /// A computed similarity fell outside `[0, 1]`.
    ///
    /// This means the partition accounting is wrong and is never clamped.
    #[error("similarity {value} outside [0, 1] ({accumulated} points of {total})")]
    InvalidSimilarity {
        value: f64,
        accumulated: f64,
        total: usize,
    },
}

impl ScoreError {
    /// Returns true for errors that must abort the run.
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::InvalidSimilarity { .. })
    }
}
