// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Reaching-spec inference and matching.
//!
//! This crate contains the engine behind reachability goals in search-based
//! test generation:
//! - Capability introspection (which inspectors a runtime type answers)
//! - Recording a reaching spec from the arguments of a reached target call
//! - Scoring later calls against it (continuous similarity and a discrete
//!   satisfaction verdict)
//! - Persisting specs and turning scores into fitness values
//!
//! The search engine, bytecode instrumentation and test execution harness are
//! collaborators; they hand the engine entry events and consume fitness values.

#![doc = include_str!("../../../README.md")]

pub mod comparator;
pub mod config;
pub mod error;
pub mod fitness;
pub mod introspection;
pub mod persist;
pub mod recorder;
pub mod satisfaction;
pub mod similarity;
pub mod sink;
pub mod spec;
pub mod value;

#[cfg(test)]
pub(crate) mod test_helpers;

/// Re-export commonly used types.
pub mod prelude {
    pub use crate::comparator::Comparator;
    pub use crate::config::{InferenceOptions, TargetConfig};
    pub use crate::error::ScoreError;
    pub use crate::fitness::{
        CandidateExecution, EntryEvent, ExecutionTrace, FitnessEngine, ReachabilityGoal,
    };
    pub use crate::introspection::{Inspector, Introspector, ReturnShape, TypeRegistry};
    pub use crate::recorder::Recorder;
    pub use crate::satisfaction::{Satisfaction, SatisfactionChecker};
    pub use crate::spec::{ExpectedText, NestedSpec, ReachingSpec};
    pub use crate::value::{Inspectable, Record, Value};
}
