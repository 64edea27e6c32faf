// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Score an observed call against a saved spec.

use super::Session;
use crate::input::{self, ObservedCall};
use camino::Utf8Path;
use miette::{IntoDiagnostic, Result};
use reachspec_core::comparator::Comparator;
use reachspec_core::error::ScoreError;
use reachspec_core::fitness::{
    CandidateExecution, EntryEvent, ExecutionTrace, FitnessEngine, ReachabilityGoal,
};
use reachspec_core::sink::MemorySink;
use reachspec_core::spec::ReachingSpec;
use tracing::{instrument, warn};

/// Similarity and fitness of one call.
#[derive(Debug, Clone, PartialEq)]
pub struct Score {
    /// The comparator's error when the call cannot be scored against the spec.
    pub similarity: Result<f64, ScoreError>,
    pub fitness: f64,
}

#[instrument(skip_all, fields(spec = %spec, call = %call))]
pub fn run(config: &Utf8Path, types: &Utf8Path, spec: &Utf8Path, call: &Utf8Path) -> Result<()> {
    let session = Session::load(config, types)?;
    let reaching_spec = session.load_spec(spec)?;
    let observed = input::load_call(call)?;
    let score = score(&session, &reaching_spec, &observed, call.as_str())?;

    match &score.similarity {
        Ok(similarity) => println!("similarity: {similarity:.4}"),
        Err(err) => println!("similarity: n/a ({err})"),
    }
    println!("fitness: {:.4}", score.fitness);
    Ok(())
}

/// Score `observed` against `spec` as a comparing-phase goal would.
pub fn score(
    session: &Session,
    spec: &ReachingSpec,
    observed: &ObservedCall,
    test: &str,
) -> Result<Score> {
    let similarity = match Comparator::new(&session.introspector, &session.config.inference)
        .similarity(spec, &observed.args)
    {
        Err(err) if err.is_fatal() => return Err(err).into_diagnostic(),
        Err(err) => {
            warn!(error = %err, "Call has no similarity against the spec");
            Err(err)
        }
        ok => ok,
    };

    let mut engine = FitnessEngine::new(
        session.config.clone(),
        session.introspector.clone(),
        MemorySink::default(),
    );
    let goal = engine
        .goals()
        .into_iter()
        .next()
        .unwrap_or_else(|| ReachabilityGoal::new(test));
    engine.install_spec(&goal, spec.clone());

    let execution = CandidateExecution {
        test: test.to_string(),
        trace: trace_of(session, observed),
        thrown: observed.thrown.clone(),
        calls_target_directly: false,
    };
    let fitness = engine.fitness(&goal, &execution).into_diagnostic()?;
    Ok(Score {
        similarity,
        fitness,
    })
}

/// A trace in which `observed` is the entry into the configured target.
fn trace_of(session: &Session, observed: &ObservedCall) -> ExecutionTrace {
    let target = &session.config.target;
    let mut trace = ExecutionTrace::new();
    trace.observe(
        &session.config,
        EntryEvent {
            declaring_type: target.type_name.as_str().into(),
            method_signature: target.method.clone(),
            receiver: observed.receiver.clone(),
            args: observed.args.clone(),
        },
    );
    trace
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::record::record;
    use crate::commands::tests::fixture;

    const RECORDED: &str = r#"{"args": [
        {"$type": "com.acme.Order", "getId": "A-1", "isPaid": true},
        "express"
    ]}"#;

    fn recorded(session: &Session) -> ReachingSpec {
        record(session, &input::parse_call(RECORDED).unwrap())
    }

    #[test]
    fn identical_call_scores_zero() {
        let fixture = fixture();
        let session = Session::load(&fixture.config, &fixture.types).unwrap();
        let spec = recorded(&session);
        let observed = input::parse_call(RECORDED).unwrap();
        let score = score(&session, &spec, &observed, "same").unwrap();
        assert!((score.similarity.unwrap() - 1.0).abs() < 1e-9);
        assert!(score.fitness.abs() < 1e-9);
    }

    #[test]
    fn partial_match() {
        let fixture = fixture();
        let session = Session::load(&fixture.config, &fixture.types).unwrap();
        let spec = recorded(&session);
        let observed = input::parse_call(
            r#"{"args": [{"$type": "com.acme.Order", "getId": "A-1", "isPaid": false}, "express"]}"#,
        )
        .unwrap();
        let score = score(&session, &spec, &observed, "unpaid").unwrap();
        assert!((score.similarity.unwrap() - 0.75).abs() < 1e-9);
        // output weight 1/3: (2/3) * (1 - 0.75)
        assert!((score.fitness - 1.0 / 6.0).abs() < 1e-9, "got {}", score.fitness);
    }

    #[test]
    fn thrown_exception_adds_the_output_weight() {
        let fixture = fixture();
        let session = Session::load(&fixture.config, &fixture.types).unwrap();
        let spec = recorded(&session);
        let observed = input::parse_call(
            r#"{"args": [{"$type": "com.acme.Order", "getId": "A-1", "isPaid": true}, "express"],
                "thrown": {"type": "java.lang.IllegalStateException"}}"#,
        )
        .unwrap();
        let score = score(&session, &spec, &observed, "throws").unwrap();
        assert!((score.fitness - 1.0 / 3.0).abs() < 1e-9, "got {}", score.fitness);
    }

    #[test]
    fn arity_mismatch_has_no_similarity() {
        let fixture = fixture();
        let session = Session::load(&fixture.config, &fixture.types).unwrap();
        let spec = recorded(&session);
        let observed = input::parse_call(r#"{"args": ["express"]}"#).unwrap();
        let score = score(&session, &spec, &observed, "short").unwrap();
        assert_eq!(
            score.similarity,
            Err(ScoreError::ArityMismatch {
                expected: 2,
                actual: 1
            })
        );
        assert!((score.fitness - 2.0 / 3.0).abs() < 1e-9, "got {}", score.fitness);
    }

    #[test]
    fn empty_spec_is_reported_but_still_scored() {
        let fixture = fixture();
        let session = Session::load(&fixture.config, &fixture.types).unwrap();
        let blank = input::parse_call(r#"{"args": [{"$type": "com.acme.Unlisted"}, 3]}"#).unwrap();
        let spec = record(&session, &blank);
        assert_eq!(spec.total_possible(), 0);
        let score = score(&session, &spec, &blank, "blank").unwrap();
        assert_eq!(score.similarity, Err(ScoreError::EmptySpec));
        assert!(score.fitness.abs() < 1e-9, "got {}", score.fitness);
    }

    #[test]
    fn run_scores_saved_spec() {
        let fixture = fixture();
        let recorded_call = fixture.write("recorded.json", RECORDED);
        let spec = fixture.path("spec.json");
        crate::commands::record::run(&fixture.config, &fixture.types, &recorded_call, &spec)
            .unwrap();
        run(&fixture.config, &fixture.types, &spec, &recorded_call).unwrap();
    }
}
