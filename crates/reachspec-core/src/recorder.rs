// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Records a [`ReachingSpec`] from the arguments of a reached target call.
//!
//! **DDD Context:** Recording
//!
//! Recording is a single pass over the arguments. Each argument slot earns
//! points for what was observed:
//!
//! | Observation | Points |
//! |---|---|
//! | null argument | 1 |
//! | string-like argument (literal) | 1 |
//! | string inspector returning null | 1 |
//! | string inspector returning admissible text | 2 |
//! | boolean inspector | 1 |
//! | enum inspector | 1 |
//! | numeric inspector | 0 |
//! | object inspector | weight of its nested tree |
//!
//! Inspector failures are logged and skipped; timeouts are reported back so
//! the caller can deactivate the inspector.

use crate::config::InferenceOptions;
use crate::introspection::{Inspector, Introspector, ReturnShape, canonical_name};
use crate::spec::{ExpectedText, NestedSpec, ReachingSpec};
use crate::value::{InvokeError, Value};
use ecow::EcoString;
use std::collections::BTreeMap;
use tracing::{debug, instrument, warn};

/// Side observations collected while recording.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordReport {
    /// Inspectors that timed out, with the runtime type they were invoked on.
    pub timed_out: Vec<(EcoString, Inspector)>,
    /// Declared parameter type → observed runtime type, when they differ.
    pub type_hints: Vec<(EcoString, EcoString)>,
}

/// Builds reaching specs from observed arguments.
#[derive(Debug)]
pub struct Recorder<'a> {
    introspector: &'a Introspector,
    options: &'a InferenceOptions,
    declared_types: Vec<EcoString>,
}

impl<'a> Recorder<'a> {
    pub fn new(introspector: &'a Introspector, options: &'a InferenceOptions) -> Self {
        Self {
            introspector,
            options,
            declared_types: Vec::new(),
        }
    }

    /// Sets the declared parameter types of the target, for type hints.
    #[must_use]
    pub fn with_declared_types(mut self, declared_types: Vec<EcoString>) -> Self {
        self.declared_types = declared_types;
        self
    }

    /// Fills `spec` from `args`. A spec that already holds data is replaced.
    #[instrument(skip_all, fields(args = args.len()))]
    pub fn record(&self, spec: &mut ReachingSpec, args: &[Value]) -> RecordReport {
        if !spec.is_empty() {
            warn!(
                slots = spec.arg_count(),
                "Reaching spec already recorded; overwriting"
            );
            spec.reset();
        }
        spec.ensure_slots(args.len());

        let mut report = RecordReport::default();
        for (index, arg) in args.iter().enumerate() {
            self.note_type_hint(index, arg, &mut report);
            self.record_argument(spec, index, arg, &mut report);
        }

        debug!(
            partitions = ?spec.partition_sizes(),
            total = spec.total_possible(),
            "Recorded reaching spec"
        );
        report
    }

    fn note_type_hint(&self, index: usize, arg: &Value, report: &mut RecordReport) {
        let (Some(declared), Some(runtime)) = (self.declared_types.get(index), arg.runtime_type())
        else {
            return;
        };
        if canonical_name(declared) != canonical_name(runtime) {
            report.type_hints.push((declared.clone(), runtime.into()));
        }
    }

    fn record_argument(
        &self,
        spec: &mut ReachingSpec,
        index: usize,
        arg: &Value,
        report: &mut RecordReport,
    ) {
        if arg.is_null() {
            spec.arg_is_null[index] = true;
            spec.partition_sizes[index] = 1;
            return;
        }

        if let Some(text) = arg.as_text() {
            spec.arg_string_value[index].insert(text.to_string());
            spec.partition_sizes[index] += 1;
            return;
        }

        let Value::Object(object) = arg else {
            return;
        };
        let runtime_type = object.type_name();
        if self.introspector.is_mock_type(runtime_type) {
            debug!(index, runtime_type, "Skipping mock argument");
            return;
        }

        for inspector in self.introspector.inspectors_for(runtime_type) {
            match inspector.shape() {
                ReturnShape::NumericIgnored => continue,
                ReturnShape::ObjectLike if !self.options.nested_checks => continue,
                _ => {}
            }
            let Some(output) = self.invoke(arg, runtime_type, inspector, report) else {
                continue;
            };
            let points = match inspector.shape() {
                ReturnShape::StringLike => self.record_string(spec, index, inspector, &output),
                ReturnShape::BoolLike => {
                    let Value::Bool(flag) = output else {
                        continue;
                    };
                    spec.arg_bool_inspectors[index].insert(inspector.clone(), flag);
                    1
                }
                ReturnShape::EnumLike => {
                    let Some(text) = output.enum_text() else {
                        continue;
                    };
                    spec.arg_enum_inspectors[index].insert(inspector.clone(), text.to_string());
                    1
                }
                ReturnShape::ObjectLike => {
                    let nested = self.build_nested(&output, 0, report);
                    let weight = nested.weight();
                    spec.nested_inspectors[index].insert(inspector.clone(), nested);
                    weight
                }
                ReturnShape::NumericIgnored => 0,
            };
            spec.partition_sizes[index] += points;
        }
    }

    fn record_string(
        &self,
        spec: &mut ReachingSpec,
        index: usize,
        inspector: &Inspector,
        output: &Value,
    ) -> usize {
        let expected = if output.is_null() {
            ExpectedText::Null
        } else {
            match output.as_text() {
                Some(text) if self.admissible(&text) => ExpectedText::single(text.as_str()),
                _ => {
                    debug!(inspector = %inspector, "String output filtered");
                    return 0;
                }
            }
        };
        let weight = expected.weight();
        spec.arg_string_inspectors[index].insert(inspector.clone(), expected);
        weight
    }

    /// Builds the expectation for an object-like output found at `depth`.
    ///
    /// String children are recorded at every depth; object children only
    /// below `max_depth`.
    fn build_nested(&self, output: &Value, depth: usize, report: &mut RecordReport) -> NestedSpec {
        match output {
            Value::Null => NestedSpec::null_leaf(),
            Value::Object(object) => {
                let runtime_type = object.type_name();
                if self.introspector.is_mock_type(runtime_type) {
                    return NestedSpec::capped();
                }
                let mut children = BTreeMap::new();
                for inspector in self.introspector.inspectors_for(runtime_type) {
                    if canonical_name(inspector.return_type()) == canonical_name(runtime_type) {
                        continue;
                    }
                    let shape = inspector.shape();
                    match shape {
                        ReturnShape::StringLike => {}
                        ReturnShape::ObjectLike if depth < self.options.max_depth => {}
                        _ => continue,
                    }
                    let Some(child) = self.invoke(output, runtime_type, inspector, report) else {
                        continue;
                    };
                    let child_spec = if shape == ReturnShape::StringLike {
                        match self.string_leaf(&child) {
                            Some(leaf) => leaf,
                            None => continue,
                        }
                    } else {
                        self.build_nested(&child, depth + 1, report)
                    };
                    children.insert(inspector.clone(), child_spec);
                }
                NestedSpec::expanded(children)
            }
            other => self.string_leaf(other).unwrap_or_default(),
        }
    }

    fn string_leaf(&self, output: &Value) -> Option<NestedSpec> {
        if output.is_null() {
            return Some(NestedSpec::null_leaf());
        }
        let text = output.as_text()?;
        self.admissible(&text)
            .then(|| NestedSpec::string_leaf(text.as_str()))
    }

    fn admissible(&self, text: &str) -> bool {
        self.options.admits_length(text) && !self.introspector.contains_mock_marker(text)
    }

    fn invoke(
        &self,
        target: &Value,
        runtime_type: &str,
        inspector: &Inspector,
        report: &mut RecordReport,
    ) -> Option<Value> {
        match self.introspector.invoke(target, inspector) {
            Ok(value) => Some(value),
            Err(err) => {
                warn!(inspector = %inspector, runtime_type, error = %err, "Inspector invocation failed");
                if matches!(err, InvokeError::Timeout { .. }) {
                    report
                        .timed_out
                        .push((runtime_type.into(), inspector.clone()));
                }
                None
            }
        }
    }
}
