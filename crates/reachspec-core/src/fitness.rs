// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Turns reaching specs into a fitness signal for test generation.
//!
//! **DDD Context:** Fitness
//!
//! Each configured test name is a [`ReachabilityGoal`]. The first execution
//! evaluated for a goal is the *recording* run: its call into the target
//! fixes the goal's [`ReachingSpec`] and expected output. Every later
//! execution is *compared* against it:
//!
//! ```text
//! w       = 1 / (1 + argument count)
//! fitness = (1 - w) * (1 - similarity) + (output matched ? 0 : w)
//! ```
//!
//! Fitness 0 means the execution reproduces the recorded call; 1 means no
//! resemblance. Improvements are written to an [`OutputSink`].

use crate::comparator::Comparator;
use crate::config::TargetConfig;
use crate::error::ScoreError;
use crate::introspection::{Inspector, Introspector};
use crate::recorder::Recorder;
use crate::satisfaction::{Satisfaction, SatisfactionChecker};
use crate::sink::OutputSink;
use crate::spec::ReachingSpec;
use crate::value::Value;
use ecow::EcoString;
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, info, instrument, warn};

/// Similarity given to a reached call that earned no points.
pub const REACHED_FLOOR: f64 = 0.01;

/// A call into an instrumented method, as reported by the tracing layer.
#[derive(Debug, Clone)]
pub struct EntryEvent {
    pub declaring_type: EcoString,
    pub method_signature: String,
    /// `None` for static methods.
    pub receiver: Option<Value>,
    pub args: Vec<Value>,
}

impl EntryEvent {
    /// Arguments in satisfaction-check layout: receiver first for instance calls.
    #[must_use]
    pub fn call_arguments(&self, is_static: bool) -> Vec<Value> {
        let mut values = Vec::with_capacity(self.args.len() + 1);
        if !is_static {
            values.push(self.receiver.clone().unwrap_or(Value::Null));
        }
        values.extend(self.args.iter().cloned());
        values
    }
}

/// Entry events of one execution, filtered to the target.
#[derive(Debug, Clone, Default)]
pub struct ExecutionTrace {
    entry: Option<EntryEvent>,
}

impl ExecutionTrace {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Offers an entry event. Keeps it if it is the first one into the target.
    ///
    /// Returns true if the event was kept.
    pub fn observe(&mut self, config: &TargetConfig, event: EntryEvent) -> bool {
        if self.entry.is_some() || !config.matches(&event.declaring_type, &event.method_signature) {
            return false;
        }
        self.entry = Some(event);
        true
    }

    /// The first entry into the target, if it was reached.
    #[must_use]
    pub fn target_entry(&self) -> Option<&EntryEvent> {
        self.entry.as_ref()
    }

    #[must_use]
    pub fn is_reached(&self) -> bool {
        self.entry.is_some()
    }
}

/// An exception that escaped a test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrownException {
    pub type_name: EcoString,
    pub message: Option<String>,
}

/// One evaluated test.
#[derive(Debug, Clone)]
pub struct CandidateExecution {
    /// Source form of the test, written to the sink on improvement.
    pub test: String,
    pub trace: ExecutionTrace,
    pub thrown: Option<ThrownException>,
    /// The test invokes the target itself instead of reaching it through a caller.
    pub calls_target_directly: bool,
}

/// Lifecycle of a goal's spec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Recording,
    Comparing,
}

/// Reproduce the target call made by one named test.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ReachabilityGoal {
    pub name: EcoString,
}

impl ReachabilityGoal {
    pub fn new(name: impl Into<EcoString>) -> Self {
        Self { name: name.into() }
    }
}

/// Recorded state for one goal.
#[derive(Debug, Clone)]
pub struct GoalState {
    pub spec: ReachingSpec,
    pub phase: Phase,
    /// Exception thrown by the recording run, if any.
    pub expected_output: Option<ThrownException>,
    pub output_weight: f64,
    pub best_fitness: f64,
}

impl Default for GoalState {
    fn default() -> Self {
        Self {
            spec: ReachingSpec::new(),
            phase: Phase::Recording,
            expected_output: None,
            output_weight: 1.0,
            best_fitness: f64::INFINITY,
        }
    }
}

/// Per-goal specs for the duration of a run.
#[derive(Debug, Clone, Default)]
pub struct SpecStore {
    goals: HashMap<EcoString, GoalState>,
}

impl SpecStore {
    #[must_use]
    pub fn get(&self, goal: &str) -> Option<&GoalState> {
        self.goals.get(goal)
    }

    /// State for `goal`, created empty in the recording phase.
    pub fn entry(&mut self, goal: &str) -> &mut GoalState {
        self.goals.entry(goal.into()).or_default()
    }

    #[must_use]
    pub fn phase(&self, goal: &str) -> Phase {
        self.goals.get(goal).map_or(Phase::Recording, |state| state.phase)
    }

    /// Forgets everything recorded for `goal`.
    pub fn reset(&mut self, goal: &str) {
        self.goals.remove(goal);
    }
}

/// Computes fitness values for reachability goals.
#[derive(Debug)]
pub struct FitnessEngine<S> {
    config: TargetConfig,
    introspector: Introspector,
    store: SpecStore,
    type_hints: BTreeMap<EcoString, EcoString>,
    sink: S,
}

impl<S: OutputSink> FitnessEngine<S> {
    /// Creates an engine. The introspector adopts the configured mock markers.
    pub fn new(config: TargetConfig, introspector: Introspector, sink: S) -> Self {
        let markers = config.inference.mock_markers.iter().map(|m| m.as_str().into());
        let introspector = introspector.with_mock_markers(markers);
        Self {
            config,
            introspector,
            store: SpecStore::default(),
            type_hints: BTreeMap::new(),
            sink,
        }
    }

    /// One goal per configured test name.
    #[must_use]
    pub fn goals(&self) -> Vec<ReachabilityGoal> {
        self.config
            .target
            .tests
            .iter()
            .map(|name| ReachabilityGoal::new(name.as_str()))
            .collect()
    }

    #[must_use]
    pub fn config(&self) -> &TargetConfig {
        &self.config
    }

    #[must_use]
    pub fn introspector(&self) -> &Introspector {
        &self.introspector
    }

    #[must_use]
    pub fn phase(&self, goal: &ReachabilityGoal) -> Phase {
        self.store.phase(&goal.name)
    }

    #[must_use]
    pub fn spec(&self, goal: &ReachabilityGoal) -> Option<&ReachingSpec> {
        self.store.get(&goal.name).map(|state| &state.spec)
    }

    /// Lowest fitness seen for `goal` while comparing.
    #[must_use]
    pub fn best_fitness(&self, goal: &ReachabilityGoal) -> Option<f64> {
        self.store
            .get(&goal.name)
            .map(|state| state.best_fitness)
            .filter(|best| best.is_finite())
    }

    /// Declared parameter type → first concrete runtime type observed.
    #[must_use]
    pub fn type_hints(&self) -> &BTreeMap<EcoString, EcoString> {
        &self.type_hints
    }

    #[must_use]
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Installs a previously saved spec for `goal` and starts comparing.
    pub fn install_spec(&mut self, goal: &ReachabilityGoal, spec: ReachingSpec) {
        let state = self.store.entry(&goal.name);
        state.output_weight = output_weight(spec.arg_count());
        state.spec = spec;
        state.phase = Phase::Comparing;
    }

    /// Discards the spec of `goal`; the next execution records again.
    pub fn restart_recording(&mut self, goal: &ReachabilityGoal) {
        info!(goal = %goal.name, "Restarting recording");
        self.store.reset(&goal.name);
    }

    /// Fitness of `execution` for `goal`, in `[0, 1]`.
    ///
    /// # Errors
    ///
    /// Returns [`ScoreError::InvalidSimilarity`] if the spec's accounting is
    /// broken. Arity mismatches are scored as dissimilar, not returned.
    #[instrument(skip_all, fields(goal = %goal.name))]
    pub fn fitness(
        &mut self,
        goal: &ReachabilityGoal,
        execution: &CandidateExecution,
    ) -> Result<f64, ScoreError> {
        match self.store.phase(&goal.name) {
            Phase::Recording => Ok(self.record(goal, execution)),
            Phase::Comparing => self.compare(goal, execution),
        }
    }

    fn record(&mut self, goal: &ReachabilityGoal, execution: &CandidateExecution) -> f64 {
        let Some(entry) = execution.trace.target_entry() else {
            warn!("Recording run did not reach the target");
            return 1.0;
        };

        let state = self.store.entry(&goal.name);
        let report = Recorder::new(&self.introspector, &self.config.inference)
            .with_declared_types(self.config.declared_parameter_types())
            .record(&mut state.spec, &entry.args);
        state.expected_output = execution.thrown.clone();
        state.output_weight = output_weight(entry.args.len());
        state.phase = Phase::Comparing;
        debug!(
            total = state.spec.total_possible(),
            known = state.spec.is_known(),
            "Recorded goal"
        );

        for (declared, concrete) in report.type_hints {
            self.type_hints.entry(declared).or_insert(concrete);
        }
        self.deactivate_all(report.timed_out);
        0.0
    }

    fn compare(
        &mut self,
        goal: &ReachabilityGoal,
        execution: &CandidateExecution,
    ) -> Result<f64, ScoreError> {
        if execution.calls_target_directly {
            debug!("Candidate calls the target directly");
            return Ok(1.0);
        }

        let state = self.store.entry(&goal.name);
        let mut comparator = Comparator::new(&self.introspector, &self.config.inference);
        let similarity = match execution.trace.target_entry() {
            None => 0.0,
            Some(_) if state.spec.total_possible() == 0 => 1.0,
            Some(entry) => match comparator.similarity(&state.spec, &entry.args) {
                Ok(value) if value <= 0.0 => REACHED_FLOOR,
                Ok(value) => value,
                Err(ScoreError::ArityMismatch { expected, actual }) => {
                    warn!(expected, actual, "Reached call has a different arity");
                    0.0
                }
                Err(err) => return Err(err),
            },
        };
        let timed_out = comparator.take_timed_out();

        let matched = outputs_match(state.expected_output.as_ref(), execution.thrown.as_ref());
        let weight = state.output_weight;
        let fitness = (1.0 - weight) * (1.0 - similarity) + if matched { 0.0 } else { weight };
        debug!(similarity, matched, fitness, "Compared execution");

        let improved = fitness < state.best_fitness;
        if improved {
            state.best_fitness = fitness;
        }
        let covering = matched && similarity >= 1.0;
        if improved || covering {
            if let Err(err) = self.sink.write_test(&execution.test, fitness) {
                warn!(error = %err, "Failed to write test to output sink");
            }
        }

        self.deactivate_all(timed_out);
        Ok(fitness)
    }

    /// Satisfaction of a call into the target for `goal`.
    ///
    /// `call_args` holds the receiver first for instance targets; `None`
    /// means the target was not reached.
    pub fn is_satisfied(
        &mut self,
        goal: &ReachabilityGoal,
        call_args: Option<&[Value]>,
    ) -> Satisfaction {
        let state = self.store.entry(&goal.name);
        let mut checker =
            SatisfactionChecker::new(&self.introspector).with_options(&self.config.inference);
        let verdict = checker.check(&mut state.spec, call_args, self.config.is_static());
        let timed_out = checker.take_timed_out();
        self.deactivate_all(timed_out);
        verdict
    }

    fn deactivate_all(&mut self, timed_out: Vec<(EcoString, Inspector)>) {
        for (runtime_type, inspector) in timed_out {
            if self.introspector.deactivate(&runtime_type, &inspector) {
                warn!(runtime_type = %runtime_type, inspector = %inspector, "Deactivated inspector after timeout");
            }
        }
    }
}

/// Weight of the output match in the fitness blend.
#[allow(clippy::cast_precision_loss)]
fn output_weight(arg_count: usize) -> f64 {
    1.0 / (1.0 + arg_count as f64)
}

fn outputs_match(expected: Option<&ThrownException>, actual: Option<&ThrownException>) -> bool {
    match (expected, actual) {
        (None, None) => true,
        (Some(expected), Some(actual)) => expected == actual,
        _ => false,
    }
}
