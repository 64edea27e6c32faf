// Copyright 2026 James Casey
// SPDX-License-Identifier: Apache-2.0

//! Check whether an observed call satisfies a saved spec.

use super::Session;
use crate::input::{self, ObservedCall};
use camino::Utf8Path;
use miette::Result;
use reachspec_core::fitness::EntryEvent;
use reachspec_core::satisfaction::{Satisfaction, SatisfactionChecker};
use reachspec_core::spec::ReachingSpec;
use tracing::{instrument, warn};

#[instrument(skip_all, fields(spec = %spec, call = %call))]
pub fn run(
    config: &Utf8Path,
    types: &Utf8Path,
    spec: &Utf8Path,
    call: &Utf8Path,
    strict: bool,
) -> Result<()> {
    let session = Session::load(config, types)?;
    let mut reaching_spec = session.load_spec(spec)?;
    let observed = input::load_call(call)?;

    let verdict = check(&session, &mut reaching_spec, &observed);
    println!("{verdict}");
    if strict && !verdict.is_met() {
        miette::bail!("Call '{call}' does not satisfy spec '{spec}': {verdict}");
    }
    Ok(())
}

/// Satisfaction of `observed`, with the receiver first for instance targets.
pub fn check(session: &Session, spec: &mut ReachingSpec, observed: &ObservedCall) -> Satisfaction {
    let target = &session.config.target;
    let event = EntryEvent {
        declaring_type: target.type_name.as_str().into(),
        method_signature: target.method.clone(),
        receiver: observed.receiver.clone(),
        args: observed.args.clone(),
    };
    let call_args = event.call_arguments(session.config.is_static());

    let mut checker =
        SatisfactionChecker::new(&session.introspector).with_options(&session.config.inference);
    let verdict = checker.check(spec, Some(&call_args[..]), session.config.is_static());
    for (runtime_type, inspector) in checker.take_timed_out() {
        warn!(runtime_type = %runtime_type, inspector = %inspector, "Inspector timed out while checking");
    }
    verdict
}
