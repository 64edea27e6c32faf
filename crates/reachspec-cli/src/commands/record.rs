// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Record a reaching spec from an observed call.

use super::Session;
use crate::input::{self, ObservedCall};
use camino::Utf8Path;
use miette::{Context, IntoDiagnostic, Result};
use reachspec_core::persist;
use reachspec_core::recorder::Recorder;
use reachspec_core::spec::ReachingSpec;
use tracing::{info, instrument, warn};

/// Record the call in `call` and write the spec to `out`.
#[instrument(skip_all, fields(call = %call, out = %out))]
pub fn run(config: &Utf8Path, types: &Utf8Path, call: &Utf8Path, out: &Utf8Path) -> Result<()> {
    let session = Session::load(config, types)?;
    let observed = input::load_call(call)?;
    let spec = record(&session, &observed);

    persist::save(&spec, out.as_std_path())
        .into_diagnostic()
        .wrap_err_with(|| format!("Failed to write spec '{out}'"))?;
    info!(total = spec.total_possible(), "Saved spec");

    println!(
        "Recorded {} argument(s) into '{out}': partitions {:?}, {} expectation point(s)",
        spec.arg_count(),
        spec.partition_sizes(),
        spec.total_possible()
    );
    if !spec.is_known() {
        println!("Nothing observable was recorded; every reached call will match");
    }
    Ok(())
}

/// Build a spec from the arguments of `observed`.
pub fn record(session: &Session, observed: &ObservedCall) -> ReachingSpec {
    let mut spec = ReachingSpec::new();
    let report = Recorder::new(&session.introspector, &session.config.inference)
        .with_declared_types(session.config.declared_parameter_types())
        .record(&mut spec, &observed.args);

    for (runtime_type, inspector) in &report.timed_out {
        warn!(runtime_type = %runtime_type, inspector = %inspector, "Inspector timed out while recording");
    }
    for (declared, concrete) in &report.type_hints {
        info!(declared = %declared, concrete = %concrete, "Observed concrete argument type");
    }
    spec
}
