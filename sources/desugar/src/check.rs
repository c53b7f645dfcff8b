//! Post-synthesis invariant checking. Anything reported here is a bug in
//! this subsystem, not in the input: fatal in debug builds, a warning
//! otherwise.

use model::repo::ClassRepo;
use tracing::warn;

use crate::{
    error::DesugarError,
    internal,
    lens::InterfaceLens,
    naming,
    plan::PinnedOracle,
    resolve::Resolver,
    retarget::RetargetMapping,
};

pub fn verify(
    repo: &ClassRepo,
    lens: &InterfaceLens,
    retargets: &[RetargetMapping],
    pinned: &dyn PinnedOracle,
) -> Vec<String> {
    let resolver = Resolver::new(repo);
    let mut findings = vec![];

    for def in repo.program_classes() {
        if def.is_interface() {
            for method in &def.virtual_methods {
                if !method.is_abstract() {
                    findings.push(format!(
                        "interface {} still has a non-abstract virtual {}",
                        def.ty, method.descriptor
                    ));
                }

                let shim_shaped = method.is_abstract() && !method.is_bridge();
                if !shim_shaped && !pinned.is_pinned(&def.method_ref(method)) {
                    findings.push(format!(
                        "interface {} keeps {} which is neither a shim nor pinned",
                        def.ty, method.descriptor
                    ));
                }
            }

            for method in &def.direct_methods {
                if !method.is_initialiser() {
                    findings.push(format!(
                        "interface {} still has the direct method {}",
                        def.ty, method.descriptor
                    ));
                }
            }
        }

        if let Some(interface) = naming::interface_of_companion(&def.ty) {
            if !def.virtual_methods.is_empty() || !def.fields.is_empty() {
                findings.push(format!(
                    "companion {} must hold direct methods only",
                    def.ty
                ));
            }

            for method in &def.direct_methods {
                if !method.is_public() || !method.is_static() {
                    findings.push(format!(
                        "companion method {}.{} is not public static",
                        def.ty, method.descriptor
                    ));
                }

                let moved_instance = method.descriptor.name().ends_with(naming::MOVED_DEFAULT_SUFFIX)
                    || method.descriptor.name().ends_with(naming::MOVED_PRIVATE_SUFFIX);
                let receiver_first = method
                    .descriptor
                    .descriptor()
                    .parameters
                    .first()
                    .map(|first| first == &interface)
                    .unwrap_or(false);

                if moved_instance && !receiver_first {
                    findings.push(format!(
                        "companion method {}.{} does not take {} as parameter zero",
                        def.ty, method.descriptor, interface
                    ));
                }
            }
        }
    }

    // Totality: every forward entry must be answerable in reverse, and the
    // reverse must land back on the same original.
    for (from, to) in lens.moved() {
        match lens.original_method_signature(to) {
            None => findings.push(format!("lens has no inverse for {}", to)),
            Some(original) if original.as_ref() != from.as_ref() => findings.push(format!(
                "lens inverse of {} is {} instead of {}",
                to, original, from
            )),
            Some(_) => {}
        }
    }

    // A subtype override would silently bypass the emulated dispatch.
    for mapping in retargets {
        let RetargetMapping::EmulatedVirtual { from, .. } = mapping else {
            continue;
        };

        for subtype in resolver.subtypes_of(&from.holder) {
            let Some(entry) = repo.get(&subtype) else {
                continue;
            };

            if entry.def.declares_virtual(&from.descriptor) {
                findings.push(format!(
                    "emulated retarget {} is overridden by {}",
                    from, subtype
                ));
            }
        }
    }

    findings
}

pub fn enforce(findings: Vec<String>) -> Result<(), DesugarError> {
    if findings.is_empty() {
        return Ok(());
    }

    if cfg!(debug_assertions) {
        return Err(internal!(
            "desugaring invariants violated:\n{}",
            findings.join("\n")
        ));
    }

    for finding in findings {
        warn!("{}", finding);
    }

    Ok(())
}
