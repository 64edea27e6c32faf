// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! End-to-end tests for reaching-spec inference through the public API.
//!
//! Each test builds a type registry from JSON, loads a target configuration
//! from TOML, and drives recording, scoring, persistence and fitness the way
//! a search engine would.

use reachspec_core::fitness::{
    CandidateExecution, EntryEvent, ExecutionTrace, FitnessEngine, Phase, ReachabilityGoal,
    ThrownException,
};
use reachspec_core::introspection::{Introspector, TypeRegistry};
use reachspec_core::persist;
use reachspec_core::prelude::*;
use reachspec_core::sink::FileSink;
use std::fs;
use tempfile::TempDir;

const TYPES: &str = r#"[
    {"name": "com.acme.Currency", "kind": "enum"},
    {"name": "com.acme.Customer", "methods": [
        {"name": "getEmail", "returns": "java.lang.String"},
        {"name": "isVerified", "returns": "boolean"}
    ]},
    {"name": "com.acme.Order", "methods": [
        {"name": "getId", "returns": "java.lang.String"},
        {"name": "getCurrency", "returns": "com.acme.Currency"},
        {"name": "getCustomer", "returns": "com.acme.Customer"},
        {"name": "getTotal", "returns": "long"},
        {"name": "isPaid", "returns": "boolean"}
    ]},
    {"name": "com.acme.RushOrder", "supertype": "com.acme.Order", "methods": [
        {"name": "getDeadline", "returns": "java.lang.String"}
    ]}
]"#;

const CONFIG: &str = r#"
[target]
type = "com.acme.OrderService"
method = "process(com.acme.Order, java.lang.String)"
tests = ["checkoutTest"]
"#;

fn introspector() -> Introspector {
    Introspector::new(TypeRegistry::from_json(TYPES).unwrap())
}

fn order(id: &str, currency: &str, email: Option<&str>, paid: bool) -> Value {
    let customer = email.map_or(Value::Null, |email| {
        Record::new("com.acme.Customer")
            .with("getEmail", Value::text(email))
            .with("isVerified", Value::Bool(true))
            .into_value()
    });
    Record::new("com.acme.Order")
        .with("getId", Value::text(id))
        .with("getCurrency", Value::enumeration("com.acme.Currency", currency))
        .with("getCustomer", customer)
        .with("getTotal", Value::Int(1200))
        .with("isPaid", Value::Bool(paid))
        .into_value()
}

fn execution(config: &TargetConfig, test: &str, args: Option<Vec<Value>>) -> CandidateExecution {
    let mut trace = ExecutionTrace::new();
    if let Some(args) = args {
        trace.observe(
            config,
            EntryEvent {
                declaring_type: "com.acme.OrderService".into(),
                method_signature: "process(com.acme.Order, String)".to_string(),
                receiver: Some(Record::new("com.acme.OrderService").into_value()),
                args,
            },
        );
    }
    CandidateExecution {
        test: test.to_string(),
        trace,
        thrown: None,
        calls_target_directly: false,
    }
}

#[test]
fn record_then_score_order_arguments() {
    let introspector = introspector();
    let options = InferenceOptions::default();
    let recorded = [order("A-1", "EUR", Some("ada@acme.test"), true), Value::text("express")];
    let mut spec = ReachingSpec::new();
    Recorder::new(&introspector, &options).record(&mut spec, &recorded);

    // getId 2, getCurrency 1, getCustomer {getEmail 2}, isPaid 1; literal 1
    assert_eq!(spec.partition_sizes(), &[6, 1]);
    assert!(spec.is_known());

    let mut comparator = Comparator::new(&introspector, &options);
    let same = comparator.similarity(&spec, &recorded).unwrap();
    assert!((same - 1.0).abs() < 1e-9);

    let other = [order("A-1", "EUR", Some("ada@acme.test"), false), Value::text("express")];
    let lower = comparator.similarity(&spec, &other).unwrap();
    assert!((lower - 6.0 / 7.0).abs() < 1e-9, "got {lower}");
}

#[test]
fn subtype_arguments_share_supertype_inspectors() {
    let introspector = introspector();
    let options = InferenceOptions::default();
    let mut spec = ReachingSpec::new();
    Recorder::new(&introspector, &options)
        .record(&mut spec, &[order("A-1", "EUR", None, true), Value::Null]);

    let rush = Record::new("com.acme.RushOrder")
        .with("getId", Value::text("A-1"))
        .with("getCurrency", Value::enumeration("com.acme.Currency", "EUR"))
        .with("getCustomer", Value::Null)
        .with("isPaid", Value::Bool(true))
        .with("getDeadline", Value::text("tomorrow"))
        .into_value();
    let s = Comparator::new(&introspector, &options)
        .similarity(&spec, &[rush, Value::Null])
        .unwrap();
    assert!((s - 1.0).abs() < 1e-9, "got {s}");
}

#[test]
fn persisted_spec_scores_like_the_original() {
    let introspector = introspector();
    let options = InferenceOptions::default();
    let recorded = [order("A-1", "USD", Some("bob@acme.test"), false), Value::text("slow")];
    let mut spec = ReachingSpec::new();
    Recorder::new(&introspector, &options).record(&mut spec, &recorded);

    let temp = TempDir::new().unwrap();
    let path = temp.path().join("checkoutTest.json");
    persist::save(&spec, &path).unwrap();
    let text = fs::read_to_string(&path).unwrap();
    assert!(text.contains("com.acme.Order:getId"));
    assert!(text.contains("com.acme.Customer:getEmail"));
    let reloaded = persist::load(&path, &introspector).unwrap();
    assert_eq!(reloaded, spec);

    let candidate = [order("A-2", "USD", Some("bob@acme.test"), false), Value::text("slow")];
    let mut comparator = Comparator::new(&introspector, &options);
    assert_eq!(
        comparator.similarity(&spec, &candidate).unwrap(),
        comparator.similarity(&reloaded, &candidate).unwrap()
    );
}

#[test]
fn persisted_spec_needs_the_same_types() {
    let introspector = introspector();
    let options = InferenceOptions::default();
    let mut spec = ReachingSpec::new();
    Recorder::new(&introspector, &options)
        .record(&mut spec, &[order("A-1", "USD", None, false), Value::Null]);
    let json = persist::to_json(&spec).unwrap();

    let bare = Introspector::new(TypeRegistry::with_builtins());
    let err = persist::from_json(&json, &bare).unwrap_err();
    assert!(matches!(err, persist::PersistError::UnresolvedInspector(_)));
}

#[test]
fn fitness_run_writes_improvements_to_the_sink() {
    let config = TargetConfig::from_toml(CONFIG).unwrap();
    let temp = TempDir::new().unwrap();
    let best = temp.path().join("best.txt");
    let mut engine = FitnessEngine::new(config.clone(), introspector(), FileSink::new(&best));
    let goal = engine.goals().remove(0);
    assert_eq!(goal, ReachabilityGoal::new("checkoutTest"));

    let recording = execution(
        &config,
        "checkoutTest",
        Some(vec![order("A-1", "EUR", Some("ada@acme.test"), true), Value::text("express")]),
    );
    assert_eq!(engine.fitness(&goal, &recording).unwrap(), 0.0);
    assert_eq!(engine.phase(&goal), Phase::Comparing);
    assert!(!best.exists());

    let missed = execution(&config, "missesTarget", None);
    let worst = engine.fitness(&goal, &missed).unwrap();
    assert!((worst - 2.0 / 3.0).abs() < 1e-9, "got {worst}");
    assert!(fs::read_to_string(&best).unwrap().contains("missesTarget"));

    let close = execution(
        &config,
        "closeCall",
        Some(vec![order("A-1", "EUR", Some("ada@acme.test"), false), Value::text("express")]),
    );
    let better = engine.fitness(&goal, &close).unwrap();
    assert!(better < worst);
    assert!(better > 0.0);
    assert!(fs::read_to_string(&best).unwrap().contains("closeCall"));

    let mut throwing = execution(
        &config,
        "throws",
        Some(vec![order("A-1", "EUR", Some("ada@acme.test"), true), Value::text("express")]),
    );
    throwing.thrown = Some(ThrownException {
        type_name: "java.lang.IllegalStateException".into(),
        message: Some("closed".to_string()),
    });
    let thrown_fitness = engine.fitness(&goal, &throwing).unwrap();
    assert!((thrown_fitness - 1.0 / 3.0).abs() < 1e-9, "got {thrown_fitness}");

    let exact = execution(
        &config,
        "reproduces",
        Some(vec![order("A-1", "EUR", Some("ada@acme.test"), true), Value::text("express")]),
    );
    assert_eq!(engine.fitness(&goal, &exact).unwrap(), 0.0);
    assert!(fs::read_to_string(&best).unwrap().contains("reproduces"));
    assert_eq!(engine.best_fitness(&goal), Some(0.0));
}

#[test]
fn satisfaction_through_the_engine() {
    let config = TargetConfig::from_toml(CONFIG).unwrap();
    let temp = TempDir::new().unwrap();
    let mut engine = FitnessEngine::new(
        config.clone(),
        introspector(),
        FileSink::new(temp.path().join("best.txt")),
    );
    let goal = ReachabilityGoal::new("checkoutTest");
    let recording = execution(
        &config,
        "checkoutTest",
        Some(vec![order("A-1", "EUR", None, true), Value::text("express")]),
    );
    engine.fitness(&goal, &recording).unwrap();

    let receiver = Record::new("com.acme.OrderService").into_value();
    let same = vec![receiver.clone(), order("A-1", "EUR", None, true), Value::text("express")];
    assert_eq!(engine.is_satisfied(&goal, Some(&same[..])), Satisfaction::Met);

    let unpaid = vec![receiver.clone(), order("B-7", "EUR", None, false), Value::text("express")];
    assert_eq!(engine.is_satisfied(&goal, Some(&unpaid[..])), Satisfaction::Partial(3));

    let short = vec![receiver, order("A-1", "EUR", None, true)];
    assert_eq!(engine.is_satisfied(&goal, Some(&short[..])), Satisfaction::Failed);
}
