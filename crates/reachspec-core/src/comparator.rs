// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Scores how closely observed arguments match a recorded [`ReachingSpec`].
//!
//! **DDD Context:** Scoring
//!
//! Each argument earns at most its partition size in points; the similarity
//! is the sum of earned points over [`ReachingSpec::total_possible`]. A result
//! outside `[0, 1]` means the partition accounting is broken and is reported
//! as [`ScoreError::InvalidSimilarity`] rather than clamped.

use crate::config::InferenceOptions;
use crate::error::ScoreError;
use crate::introspection::{Inspector, Introspector};
use crate::similarity::{best_similarity, edit_similarity};
use crate::spec::{ExpectedText, NestedSpec, ReachingSpec};
use crate::value::{InvokeError, Value};
use ecow::EcoString;
use tracing::{debug, trace, warn};

/// Computes similarity scores against recorded specs.
#[derive(Debug)]
pub struct Comparator<'a> {
    introspector: &'a Introspector,
    options: &'a InferenceOptions,
    timed_out: Vec<(EcoString, Inspector)>,
}

impl<'a> Comparator<'a> {
    pub fn new(introspector: &'a Introspector, options: &'a InferenceOptions) -> Self {
        Self {
            introspector,
            options,
            timed_out: Vec::new(),
        }
    }

    /// Inspectors that timed out since the last call, with their runtime type.
    pub fn take_timed_out(&mut self) -> Vec<(EcoString, Inspector)> {
        std::mem::take(&mut self.timed_out)
    }

    /// Similarity of `args` to `spec`, in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// - [`ScoreError::EmptySpec`] if the spec awards no points.
    /// - [`ScoreError::ArityMismatch`] if the argument counts differ.
    /// - [`ScoreError::InvalidSimilarity`] if the result leaves `[0, 1]`.
    #[allow(clippy::cast_precision_loss)]
    pub fn similarity(&mut self, spec: &ReachingSpec, args: &[Value]) -> Result<f64, ScoreError> {
        let total = spec.total_possible();
        if total == 0 {
            return Err(ScoreError::EmptySpec);
        }
        if args.len() != spec.arg_count() {
            return Err(ScoreError::ArityMismatch {
                expected: spec.arg_count(),
                actual: args.len(),
            });
        }

        let accumulated: f64 = args
            .iter()
            .enumerate()
            .map(|(index, arg)| self.score_argument(spec, index, arg))
            .sum();

        let value = accumulated / total as f64;
        if !(0.0..=1.0).contains(&value) {
            return Err(ScoreError::InvalidSimilarity {
                value,
                accumulated,
                total,
            });
        }
        debug!(similarity = value, accumulated, total, "Scored arguments");
        Ok(value)
    }

    #[allow(clippy::cast_precision_loss)]
    fn score_argument(&mut self, spec: &ReachingSpec, index: usize, arg: &Value) -> f64 {
        let weight = spec.partition_sizes[index];
        if weight == 0 {
            return 0.0;
        }
        if spec.arg_is_null[index] {
            return if arg.is_null() { weight as f64 } else { 0.0 };
        }
        if arg.is_null() {
            return 0.0;
        }
        if let Some(text) = arg.as_text() {
            let literals = &spec.arg_string_value[index];
            if literals.is_empty() {
                return 0.0;
            }
            return best_similarity(literals, &text) * weight as f64;
        }
        match arg {
            Value::Object(object) if !self.introspector.is_mock_type(object.type_name()) => {
                self.score_object(spec, index, arg, object.type_name())
            }
            _ => 0.0,
        }
    }

    fn score_object(&mut self, spec: &ReachingSpec, index: usize, arg: &Value, runtime_type: &str) -> f64 {
        let introspector = self.introspector;
        let mut points = 0.0;

        for inspector in introspector.inspectors_for(runtime_type) {
            if let Some(expected) = spec.arg_string_inspectors[index].get(inspector) {
                let Some(output) = self.invoke(arg, runtime_type, inspector) else {
                    continue;
                };
                points += score_text(expected, &output);
            } else if let Some(&expected) = spec.arg_bool_inspectors[index].get(inspector) {
                if let Some(Value::Bool(actual)) = self.invoke(arg, runtime_type, inspector) {
                    if actual == expected {
                        points += 1.0;
                    }
                }
            } else if let Some(expected) = spec.arg_enum_inspectors[index].get(inspector) {
                if let Some(actual) = self
                    .invoke(arg, runtime_type, inspector)
                    .and_then(|output| output.enum_text())
                {
                    points += edit_similarity(expected, &actual);
                }
            } else if let Some(nested) = spec.nested_inspectors[index].get(inspector) {
                if !self.options.nested_checks {
                    continue;
                }
                if let Some(output) = self.invoke(arg, runtime_type, inspector) {
                    points += self.check_nested(nested, &output);
                }
            }
        }

        trace!(index, runtime_type, points, "Scored object argument");
        points
    }

    /// Points earned by `actual` against `expected`, at most its weight.
    #[allow(clippy::cast_precision_loss)]
    fn check_nested(&mut self, expected: &NestedSpec, actual: &Value) -> f64 {
        let cap = expected.weight() as f64;
        let points = if actual.is_null() {
            1.0
        } else if expected.is_null {
            0.0
        } else if let Some(text) = actual.as_text() {
            if expected.string_values.is_empty() {
                2.0
            } else {
                1.0 + best_similarity(&expected.string_values, &text)
            }
        } else if let Value::Object(object) = actual {
            if expected.go_deeper && !self.introspector.is_mock_type(object.type_name()) {
                self.check_children(expected, actual, object.type_name())
            } else {
                0.0
            }
        } else {
            0.0
        };
        points.min(cap)
    }

    fn check_children(&mut self, expected: &NestedSpec, actual: &Value, runtime_type: &str) -> f64 {
        let introspector = self.introspector;
        let mut points = 0.0;
        for inspector in introspector.inspectors_for(runtime_type) {
            let Some(child) = expected.children.get(inspector) else {
                continue;
            };
            if let Some(output) = self.invoke(actual, runtime_type, inspector) {
                points += self.check_nested(child, &output);
            }
        }
        points
    }

    fn invoke(&mut self, target: &Value, runtime_type: &str, inspector: &Inspector) -> Option<Value> {
        match self.introspector.invoke(target, inspector) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(inspector = %inspector, runtime_type, error = %err, "Inspector invocation failed");
                if matches!(err, InvokeError::Timeout { .. }) {
                    self.timed_out.push((runtime_type.into(), inspector.clone()));
                }
                None
            }
        }
    }
}

/// Points for a string inspector output.
fn score_text(expected: &ExpectedText, actual: &Value) -> f64 {
    match (expected, actual.as_text()) {
        (ExpectedText::Null, None) if actual.is_null() => 1.0,
        (ExpectedText::Values(values), Some(text)) => 1.0 + best_similarity(values, &text),
        _ => 0.0,
    }
}
