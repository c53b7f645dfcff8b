//! Retargeting: redirecting references from a platform member to its
//! compatibility-library shim. Shares the lens substrate with interface
//! desugaring but selects between three mapping shapes.

use model::{
    class::MethodRef,
    flags::ClassAccessFlag,
    repo::ClassRepo,
};
use support::descriptor::FieldType;
use tracing::{debug, warn};

use crate::{error::DesugarError, naming, DesugarOptions};

/// One configured redirection: this platform method is served by a static on
/// the replacement holder from now on.
#[derive(Debug, Clone)]
pub struct RetargetSpec {
    pub method: MethodRef,
    pub replacement: FieldType,
}

#[derive(Debug, Clone)]
pub enum RetargetMapping {
    /// static -> static, same signature on the replacement holder.
    Static { from: MethodRef, to: MethodRef },
    /// Final virtual -> static with the receiver prepended. No override can
    /// exist, so every call site can be redirected directly.
    NonEmulatedVirtual { from: MethodRef, to: MethodRef },
    /// Non-final virtual: polymorphic call sites need the full triple of
    /// interface stub, dispatch class and forwarder.
    EmulatedVirtual {
        from: MethodRef,
        stub: MethodRef,
        dispatch: FieldType,
        forwarder: MethodRef,
        /// The compatibility-library static the forwarder body invokes.
        target: MethodRef,
    },
}

impl RetargetMapping {
    pub fn original(&self) -> &MethodRef {
        match self {
            RetargetMapping::Static { from, .. } => from,
            RetargetMapping::NonEmulatedVirtual { from, .. } => from,
            RetargetMapping::EmulatedVirtual { from, .. } => from,
        }
    }
}

pub struct RetargetPlanner<'a> {
    repo: &'a ClassRepo,
    options: &'a DesugarOptions,
}

impl<'a> RetargetPlanner<'a> {
    pub fn new(repo: &'a ClassRepo, options: &'a DesugarOptions) -> Self {
        Self { repo, options }
    }

    pub fn plan(&self) -> Result<Vec<RetargetMapping>, DesugarError> {
        let mut specs = self.options.retargets.clone();
        specs.sort_by_key(|spec| spec.method.to_string());

        let mut mappings = vec![];
        for spec in specs {
            let holder = &spec.method.holder;

            if self.options.emulated_interfaces.contains(holder) {
                debug!("{} is owned by emulated dispatch, skipping", spec.method);
                continue;
            }

            let Some(entry) = self.repo.get(holder) else {
                warn!("retarget holder {} is outside the closure", holder);
                continue;
            };

            let def = &entry.def;
            let Some(method) = def
                .find_direct(&spec.method.descriptor)
                .or_else(|| def.find_virtual(&spec.method.descriptor))
            else {
                warn!("retarget method {} is not declared on its holder", spec.method);
                continue;
            };

            let mapping = if method.is_static() {
                RetargetMapping::Static {
                    from: spec.method.clone(),
                    to: MethodRef::new(spec.replacement.clone(), spec.method.descriptor.clone()),
                }
            } else if def.flags.has(ClassAccessFlag::FINAL) || method.is_final() {
                RetargetMapping::NonEmulatedVirtual {
                    from: spec.method.clone(),
                    to: MethodRef::new(
                        spec.replacement.clone(),
                        spec.method.descriptor.prepend_parameter(holder.clone()),
                    ),
                }
            } else {
                RetargetMapping::EmulatedVirtual {
                    stub: naming::as_emulated_stub(holder, &spec.method.descriptor)?,
                    dispatch: naming::emulated_dispatch_of(holder)?,
                    forwarder: naming::as_emulated_forward(holder, &spec.method.descriptor)?,
                    target: MethodRef::new(
                        spec.replacement.clone(),
                        spec.method.descriptor.prepend_parameter(holder.clone()),
                    ),
                    from: spec.method,
                }
            };

            mappings.push(mapping);
        }

        Ok(mappings)
    }
}
