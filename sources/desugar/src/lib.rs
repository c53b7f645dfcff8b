//! Interface desugaring: rewrites a class hierarchy that uses default,
//! private and static interface methods into one that runs on VMs which only
//! know abstract interface methods, and hands downstream passes a single
//! lens describing every rename it performed.

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{anyhow, Result};
use model::{class::MethodRef, repo::ClassRepo};
use rayon::prelude::*;
use support::{descriptor::FieldType, intern::Interner};
use tracing::{debug, info};

pub mod check;
pub mod error;
pub mod lens;
pub mod naming;
pub mod plan;
pub mod resolve;
pub mod retarget;
pub mod rewrite;
pub mod synth;

use crate::{
    error::Diagnostics,
    lens::{LensBuilder, LensChain, MoveKind, RecordedMove},
    plan::{InterfacePlan, Planner, PinnedOracle},
    retarget::{RetargetMapping, RetargetPlanner, RetargetSpec},
    synth::Synthesizer,
};

#[derive(Debug, Default, Clone)]
pub struct DesugarOptions {
    pub encode_checksums: bool,
    /// Interfaces whose lowering is owned by the emulated-dispatch layer.
    /// The planner defers to it wholesale.
    pub emulated_interfaces: HashSet<FieldType>,
    /// Platform members redirected into the compatibility library.
    pub retargets: Vec<RetargetSpec>,
}

/// Runs the pass. Planning reads the frozen repository in parallel; the
/// synthesis that follows is the only writer. Returns the prior chain with
/// this run's lens appended.
pub fn run(
    repo: &mut ClassRepo,
    options: &DesugarOptions,
    pinned: &dyn PinnedOracle,
    prior: LensChain,
    cancel: &AtomicBool,
    diagnostics: &Diagnostics,
) -> Result<LensChain> {
    let refs: Interner<MethodRef> = Interner::new();

    let (plans, dispatch_plans, retargets) = {
        let planner = Planner::new(repo, pinned, options, diagnostics);
        let interfaces = repo.program_interfaces();
        info!("planning {} program interface(s)", interfaces.len());

        // Per-interface plan buffers; no cross-interface ordering here. The
        // input list is sorted and collect keeps it that way, so the merge
        // below is deterministic whatever the thread count.
        let plans: Vec<InterfacePlan> = interfaces
            .par_iter()
            .filter_map(|def| {
                if cancel.load(Ordering::Relaxed) {
                    return None;
                }

                planner.plan_interface(def)
            })
            .collect();

        if cancel.load(Ordering::Relaxed) {
            // Partial plans are dropped on the floor; the repository has not
            // been touched yet.
            return Err(anyhow!("desugaring was aborted"));
        }

        let dispatch_plans = planner.plan_dispatch_classes()?;
        let retargets = RetargetPlanner::new(repo, options).plan()?;

        (plans, dispatch_plans, retargets)
    };

    let mut builder = LensBuilder::new(&refs);
    for plan in &plans {
        for record in &plan.records {
            builder.record(record);
        }
    }
    for plan in &dispatch_plans {
        for record in &plan.records {
            builder.record(record);
        }
    }
    for mapping in &retargets {
        match mapping {
            RetargetMapping::Static { from, to } => builder.record(&RecordedMove {
                from: from.clone(),
                to: to.clone(),
                kind: MoveKind::StaticRetarget,
            }),
            RetargetMapping::NonEmulatedVirtual { from, to } => builder.record(&RecordedMove {
                from: from.clone(),
                to: to.clone(),
                kind: MoveKind::NonEmulatedVirtualRetarget,
            }),
            RetargetMapping::EmulatedVirtual {
                from,
                stub,
                forwarder,
                ..
            } => {
                builder.record(&RecordedMove {
                    from: from.clone(),
                    to: forwarder.clone(),
                    kind: MoveKind::EmulatedVirtualRetarget,
                });
                builder.record_stub(from, stub);
            }
        }
    }
    let lens = builder.build();

    let mut synthesizer = Synthesizer::new(repo, options);
    for plan in plans {
        synthesizer.apply_interface_plan(plan)?;
    }
    for plan in dispatch_plans {
        synthesizer.apply_dispatch_plan(plan)?;
    }
    synthesizer.apply_retargets(&retargets)?;

    let rewritten = rewrite::rewrite_program(repo, &lens)?;
    debug!("{} bodies rewritten through the lens", rewritten);

    if !diagnostics.is_empty() {
        // Offending interfaces were skipped, everything else went through;
        // the run as a whole still failed.
        return Err(anyhow!(
            "interface desugaring failed with {} error(s)",
            diagnostics.len()
        ));
    }

    check::enforce(check::verify(repo, &lens, &retargets, pinned))?;

    let mut chain = prior;
    chain.push(Arc::new(lens));

    Ok(chain)
}
