// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Discrete satisfaction verdict for a call against a [`ReachingSpec`].
//!
//! **DDD Context:** Scoring
//!
//! Where [`crate::comparator`] yields a continuous score, this module counts
//! violations:
//!
//! - null argument: one per recorded string and boolean inspector
//! - object without inspectors where some were expected: one per expectation
//! - string inspector mismatch: one each, unless any string inspector of the
//!   same argument matched exactly, which clears them all; outputs the
//!   recorder would filter are skipped
//! - boolean inspector mismatch: two
//! - literal string set not containing the argument: one
//!
//! Structural mismatches (no call, wrong argument count) are `Failed`, never
//! a high `Partial`.

use crate::config::InferenceOptions;
use crate::introspection::{Inspector, Introspector};
use crate::spec::ReachingSpec;
use crate::value::{InvokeError, Value};
use ecow::EcoString;
use std::fmt;
use tracing::{debug, warn};

/// Verdict of a satisfaction check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Satisfaction {
    Met,
    /// Reached with the given number of violations.
    Partial(usize),
    /// Not reached, or the argument list does not fit the spec.
    Failed,
}

impl Satisfaction {
    fn from_violations(violations: usize) -> Self {
        if violations == 0 {
            Self::Met
        } else {
            Self::Partial(violations)
        }
    }

    #[must_use]
    pub fn is_met(self) -> bool {
        self == Self::Met
    }

    /// Violation count; `None` for `Failed`.
    #[must_use]
    pub fn violations(self) -> Option<usize> {
        match self {
            Self::Met => Some(0),
            Self::Partial(n) => Some(n),
            Self::Failed => None,
        }
    }
}

impl fmt::Display for Satisfaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Met => write!(f, "met"),
            Self::Partial(n) => write!(f, "partial ({n} violations)"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Counts violations of a spec by a concrete call.
#[derive(Debug)]
pub struct SatisfactionChecker<'a> {
    introspector: &'a Introspector,
    options: InferenceOptions,
    timed_out: Vec<(EcoString, Inspector)>,
}

impl<'a> SatisfactionChecker<'a> {
    pub fn new(introspector: &'a Introspector) -> Self {
        Self {
            introspector,
            options: InferenceOptions::default(),
            timed_out: Vec::new(),
        }
    }

    /// Uses the string filters of `options` instead of the defaults.
    #[must_use]
    pub fn with_options(mut self, options: &InferenceOptions) -> Self {
        self.options = options.clone();
        self
    }

    /// Inspectors that timed out since the last call, with their runtime type.
    pub fn take_timed_out(&mut self) -> Vec<(EcoString, Inspector)> {
        std::mem::take(&mut self.timed_out)
    }

    /// Checks `call_args` against `spec`.
    ///
    /// For instance calls the receiver is at index 0 and is not compared.
    /// A spec without slots is given empty slots for the call's arguments
    /// first, so the first check fixes the expected argument count.
    pub fn check(
        &mut self,
        spec: &mut ReachingSpec,
        call_args: Option<&[Value]>,
        is_static: bool,
    ) -> Satisfaction {
        let Some(call_args) = call_args else {
            return Satisfaction::Failed;
        };
        let args = if is_static {
            call_args
        } else {
            match call_args.split_first() {
                Some((_receiver, rest)) => rest,
                None => return Satisfaction::Failed,
            }
        };

        if spec.is_empty() {
            spec.ensure_slots(args.len());
        }
        if args.len() != spec.arg_count() {
            debug!(
                expected = spec.arg_count(),
                actual = args.len(),
                "Argument count mismatch"
            );
            return Satisfaction::Failed;
        }

        let spec: &ReachingSpec = spec;
        let violations: usize = args
            .iter()
            .enumerate()
            .map(|(index, arg)| {
                self.argument_violations(spec, index, arg) + literal_violations(spec, index, arg)
            })
            .sum();
        Satisfaction::from_violations(violations)
    }

    fn argument_violations(&mut self, spec: &ReachingSpec, index: usize, arg: &Value) -> usize {
        let strings = &spec.arg_string_inspectors[index];
        let bools = &spec.arg_bool_inspectors[index];
        let expected = strings.len() + bools.len();

        if arg.is_null() {
            return expected;
        }
        if let Value::Object(object) = arg {
            if self.introspector.is_mock_type(object.type_name()) {
                return 0;
            }
        }

        let introspector = self.introspector;
        let available = introspector.inspectors_for_value(arg);
        if available.is_empty() {
            return expected;
        }
        let runtime_type = arg.runtime_type().unwrap_or_default();

        let mut string_violations = 0;
        let mut any_string_matched = false;
        for (inspector, expected_text) in strings {
            if !available.contains(inspector) {
                string_violations += 1;
                continue;
            }
            match self.invoke(arg, runtime_type, inspector) {
                Some(output) if output.is_null() => {
                    if expected_text.matches(None) {
                        any_string_matched = true;
                    } else {
                        string_violations += 1;
                    }
                }
                Some(output) => {
                    let text = output.as_text();
                    if text.as_deref().is_some_and(|t| !self.admissible(t)) {
                        debug!(inspector = %inspector, "Observed string output filtered");
                        continue;
                    }
                    if expected_text.matches(text.as_deref()) {
                        any_string_matched = true;
                    } else {
                        string_violations += 1;
                    }
                }
                None => string_violations += 1,
            }
        }
        if any_string_matched {
            string_violations = 0;
        }

        let mut bool_violations = 0;
        for (inspector, &expected_flag) in bools {
            let matched = available.contains(inspector)
                && matches!(
                    self.invoke(arg, runtime_type, inspector),
                    Some(Value::Bool(actual)) if actual == expected_flag
                );
            if !matched {
                bool_violations += 2;
            }
        }

        string_violations + bool_violations
    }

    fn admissible(&self, text: &str) -> bool {
        self.options.admits_length(text) && !self.introspector.contains_mock_marker(text)
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

/// One violation if the argument misses a recorded literal set.
fn literal_violations(spec: &ReachingSpec, index: usize, arg: &Value) -> usize {
    let literals = &spec.arg_string_value[index];
    if literals.is_empty() {
        return 0;
    }
    if arg.is_null() {
        return 1;
    }
    match arg.as_text() {
        Some(text) if !literals.contains(text.as_str()) => 1,
        _ => 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::recorder::Recorder;
    use crate::test_helpers::{fixture_introspector, flag, person};
    use crate::value::Record;

    fn recorded(introspector: &Introspector, args: &[Value]) -> ReachingSpec {
        let options = InferenceOptions::default();
        let mut spec = ReachingSpec::new();
        Recorder::new(introspector, &options).record(&mut spec, args);
        spec
    }

    fn region_pair(first: Value, second: Value) -> Value {
        Record::new("Pair")
            .with("getLeft", first)
            .with("getRight", second)
            .into_value()
    }

    #[test]
    fn absent_call_fails() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[flag(true)]);
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, None, true);
        assert_eq!(verdict, Satisfaction::Failed);
        assert_eq!(verdict.violations(), None);
    }

    #[test]
    fn arity_mismatch_fails() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[flag(true)]);
        let mut checker = SatisfactionChecker::new(&introspector);
        let call = [Value::Null, flag(true), flag(true)];
        assert_eq!(checker.check(&mut spec, Some(&call[..]), false), Satisfaction::Failed);
        assert_eq!(checker.check(&mut spec, Some(&[] as &[Value]), false), Satisfaction::Failed);
    }

    #[test]
    fn receiver_is_skipped_for_instance_calls() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[flag(true)]);
        let call = [Record::new("Service").into_value(), flag(true)];
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, Some(&call[..]), false);
        assert!(verdict.is_met());
    }

    #[test]
    fn bool_mismatch_costs_two() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[flag(true)]);
        let verdict =
            SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[flag(false)][..]), true);
        assert_eq!(verdict, Satisfaction::Partial(2));
    }

    #[test]
    fn null_argument_counts_each_expected_inspector() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[person("ada", true, Value::Null)]);
        // getName, describe, isActive
        let verdict =
            SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[Value::Null][..]), true);
        assert_eq!(verdict, Satisfaction::Partial(3));
    }

    #[test]
    fn object_without_inspectors_counts_each_expected_inspector() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[person("ada", true, Value::Null)]);
        let verdict = SatisfactionChecker::new(&introspector).check(
            &mut spec,
            Some(&[Record::new("Unknown").into_value()][..]),
            true,
        );
        assert_eq!(verdict, Satisfaction::Partial(3));
    }

    #[test]
    fn any_exact_string_match_clears_string_violations() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[person("ada", true, Value::Null)]);
        // describe differs but getName matches exactly
        let observed = Record::new("Person")
            .with("getName", Value::text("ada"))
            .with("isActive", Value::Bool(true))
            .with("describe", Value::text("someone else"))
            .into_value();
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[observed][..]), true);
        assert_eq!(verdict, Satisfaction::Met);
    }

    #[test]
    fn string_violations_stay_without_a_match() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[person("ada", true, Value::Null)]);
        let observed = Record::new("Person")
            .with("getName", Value::text("bob"))
            .with("isActive", Value::Bool(false))
            .with("describe", Value::Null)
            .into_value();
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[observed][..]), true);
        // getName 1 + describe (null where text expected) 1 + isActive 2
        assert_eq!(verdict, Satisfaction::Partial(4));
    }

    #[test]
    fn filtered_outputs_are_not_violations() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[person("ada", true, Value::Null)]);
        let observed = Record::new("Person")
            .with("getName", Value::text("x".repeat(2000)))
            .with("isActive", Value::Bool(true))
            .with("describe", Value::text("Person$$EnhancerByMockito$$1"))
            .into_value();
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[observed][..]), true);
        assert_eq!(verdict, Satisfaction::Met);
    }

    #[test]
    fn configured_length_cap_applies() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[person("ada", true, Value::Null)]);
        let options = InferenceOptions {
            max_string_length: 4,
            ..InferenceOptions::default()
        };
        let observed = Record::new("Person")
            .with("getName", Value::text("bob"))
            .with("isActive", Value::Bool(true))
            .with("describe", Value::text("someone"))
            .into_value();
        let mut checker = SatisfactionChecker::new(&introspector).with_options(&options);
        // describe is over the cap and skipped; getName still misses
        assert_eq!(
            checker.check(&mut spec, Some(&[observed][..]), true),
            Satisfaction::Partial(1)
        );
    }

    #[test]
    fn null_output_matches_recorded_null() {
        let introspector = fixture_introspector();
        let region = Record::new("Region").with("getCode", Value::Null).into_value();
        let mut spec = recorded(&introspector, &[region.clone()]);
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[region][..]), true);
        assert!(verdict.is_met());
    }

    #[test]
    fn literal_set_violations() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[Value::text("hello")]);
        let mut checker = SatisfactionChecker::new(&introspector);
        assert!(checker.check(&mut spec, Some(&[Value::text("hello")][..]), true).is_met());
        assert_eq!(
            checker.check(&mut spec, Some(&[Value::text("hullo")][..]), true),
            Satisfaction::Partial(1)
        );
        assert_eq!(
            checker.check(&mut spec, Some(&[Value::Null][..]), true),
            Satisfaction::Partial(1)
        );
    }

    #[test]
    fn empty_spec_takes_baseline_from_first_check() {
        let introspector = fixture_introspector();
        let mut spec = ReachingSpec::new();
        let mut checker = SatisfactionChecker::new(&introspector);
        let call = [Record::new("Service").into_value(), flag(true), Value::Null];
        assert!(checker.check(&mut spec, Some(&call[..]), false).is_met());
        assert_eq!(spec.arg_count(), 2);
        assert_eq!(
            checker.check(&mut spec, Some(&call[..2]), false),
            Satisfaction::Failed
        );
    }

    #[test]
    fn mock_arguments_have_no_violations() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[flag(true)]);
        let mock = Record::new("Flag$$EnhancerByMockito$$3").into_value();
        let verdict = SatisfactionChecker::new(&introspector).check(&mut spec, Some(&[mock][..]), true);
        assert!(verdict.is_met());
    }

    #[test]
    fn unknown_pair_type_counts_expectations() {
        let introspector = fixture_introspector();
        let mut spec = recorded(&introspector, &[flag(true)]);
        let verdict = SatisfactionChecker::new(&introspector).check(
            &mut spec,
            Some(&[region_pair(Value::Null, Value::Null)][..]),
            true,
        );
        assert_eq!(verdict, Satisfaction::Partial(1));
    }
}
