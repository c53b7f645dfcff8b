//! Materialization. Consumes merged plans, rewrites the interfaces in place
//! and publishes the synthetic holder classes. This is the only phase that
//! writes to the repository.

use anyhow::{anyhow, Result};
use model::{
    class::{ClassDef, MethodDef, MethodRef, Origin},
    code::{Code, CodeBody, InvokeKind, StackCode, StackOp},
    flags::{ClassAccessFlag, ClassAccessFlags, MethodAccessFlag, MethodAccessFlags},
    repo::{ClassKind, ClassRepo},
};
use support::{descriptor::FieldType, types::MethodDescriptor};
use tracing::{debug, info};

use crate::{
    naming,
    plan::{DispatchPlan, InterfacePlan},
    retarget::RetargetMapping,
    DesugarOptions,
};

/// Companion and dispatch classes share one skeleton: public final synthetic,
/// object-rooted, no interfaces, no fields.
fn skeleton(
    ty: FieldType,
    parent: &FieldType,
    source_file: Option<String>,
    checksum: Option<u64>,
) -> ClassDef {
    let mut flags = ClassAccessFlags::empty();
    flags.add(ClassAccessFlag::PUBLIC | ClassAccessFlag::FINAL | ClassAccessFlag::SYNTHETIC);

    let mut def = ClassDef::new(
        ty,
        flags,
        Origin::Synthetic {
            parent: parent.clone(),
        },
    );
    def.source_file = source_file;

    match checksum {
        Some(checksum) => def.with_checksum(checksum),
        None => def,
    }
}

/// Builds static forwarder bodies: load every parameter slot, invoke the
/// target statically, hand the result back.
pub struct ForwardMethodBuilder {
    target: MethodRef,
    interface_target: bool,
}

impl ForwardMethodBuilder {
    pub fn new(target: MethodRef) -> Self {
        Self {
            target,
            interface_target: false,
        }
    }

    /// Mark the invocation as naming an interface holder. VMs below the
    /// static-interface-method API level reject the call without this.
    pub fn interface_target(mut self) -> Self {
        self.interface_target = true;
        self
    }

    pub fn build(&self, descriptor: &MethodDescriptor) -> MethodDef {
        let proto = descriptor.descriptor();

        let mut ops = vec![];
        let mut slot = 0u16;
        for parameter in &proto.parameters {
            ops.push(StackOp::LoadLocal(slot));
            slot += parameter.slot_width();
        }

        ops.push(StackOp::Invoke {
            kind: InvokeKind::Static,
            target: self.target.clone(),
            interface: self.interface_target,
        });
        ops.push(if proto.returns_void() {
            StackOp::Return
        } else {
            StackOp::ReturnValue
        });

        let slots = proto.parameter_slots();
        let code = Code::new(CodeBody::Stack(StackCode {
            max_stack: slots.max(1),
            max_locals: slots,
            ops,
        }));

        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::STATIC | MethodAccessFlag::SYNTHETIC);

        MethodDef::new(descriptor.clone(), flags, Some(code))
    }
}

pub struct Synthesizer<'a> {
    repo: &'a mut ClassRepo,
    options: &'a DesugarOptions,
}

impl<'a> Synthesizer<'a> {
    pub fn new(repo: &'a mut ClassRepo, options: &'a DesugarOptions) -> Self {
        Self { repo, options }
    }

    pub fn apply_interface_plan(&mut self, plan: InterfacePlan) -> Result<()> {
        let InterfacePlan {
            interface,
            companion_methods,
            virtual_methods,
            direct_methods,
            records: _,
            touched,
        } = plan;

        if !touched {
            debug!("{} has nothing to desugar", interface);
            return Ok(());
        }

        let (source_file, checksum) = {
            let entry = self
                .repo
                .get(&interface)
                .ok_or_else(|| anyhow!("{} vanished before synthesis", interface))?;

            let checksum = if self.options.encode_checksums {
                // Deterministic and distinguishable from the identity scheme
                // used for classes that were not synthesized.
                Some(entry.def.checksum()?.wrapping_mul(7))
            } else {
                None
            };

            (entry.def.source_file.clone(), checksum)
        };

        // The interface keeps its identity; bodies leave, shims stay.
        self.repo.replace(&interface, |def| {
            def.virtual_methods = virtual_methods;
            def.direct_methods = direct_methods;
        })?;

        if companion_methods.is_empty() {
            return Ok(());
        }

        let companion_ty = naming::companion_of(&interface)?;
        let mut companion = skeleton(companion_ty.clone(), &interface, source_file, checksum);
        companion.direct_methods = companion_methods;

        info!(
            "synthesized companion {} with {} method(s)",
            companion_ty,
            companion.direct_methods.len()
        );
        self.repo.publish(ClassKind::Program, companion)?;

        Ok(())
    }

    pub fn apply_dispatch_plan(&mut self, plan: DispatchPlan) -> Result<()> {
        let dispatch_ty = naming::dispatch_of(&plan.interface)?;
        let mut dispatch = skeleton(dispatch_ty.clone(), &plan.interface, None, None);

        for descriptor in &plan.methods {
            let target = MethodRef::new(plan.interface.clone(), descriptor.clone());
            dispatch.direct_methods.push(
                ForwardMethodBuilder::new(target)
                    .interface_target()
                    .build(descriptor),
            );
        }

        info!(
            "synthesized dispatch {} for {} invoked static(s)",
            dispatch_ty,
            dispatch.direct_methods.len()
        );
        self.repo.publish(ClassKind::Program, dispatch)?;

        Ok(())
    }

    /// Materializes the emulated-virtual triples: one stub interface and one
    /// dispatch class per retargeted holder, shared by its methods.
    pub fn apply_retargets(&mut self, mappings: &[RetargetMapping]) -> Result<()> {
        for mapping in mappings {
            let RetargetMapping::EmulatedVirtual {
                from,
                stub,
                dispatch,
                forwarder,
                target,
            } = mapping
            else {
                continue;
            };

            if self.repo.get(&stub.holder).is_none() {
                let mut flags = ClassAccessFlags::empty();
                flags.add(
                    ClassAccessFlag::PUBLIC
                        | ClassAccessFlag::INTERFACE
                        | ClassAccessFlag::ABSTRACT
                        | ClassAccessFlag::SYNTHETIC,
                );

                let def = ClassDef::new(
                    stub.holder.clone(),
                    flags,
                    Origin::Synthetic {
                        parent: from.holder.clone(),
                    },
                );
                self.repo.publish(ClassKind::Program, def)?;
            }

            let stub_descriptor = stub.descriptor.clone();
            self.repo.replace(&stub.holder, move |def| {
                if !def.declares_virtual(&stub_descriptor) {
                    let mut flags = MethodAccessFlags::empty();
                    flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT);
                    def.virtual_methods
                        .push(MethodDef::new(stub_descriptor, flags, None));
                }
            })?;

            if self.repo.get(dispatch).is_none() {
                let def = skeleton(dispatch.clone(), &from.holder, None, None);
                self.repo.publish(ClassKind::Program, def)?;
            }

            let forward = ForwardMethodBuilder::new(target.clone()).build(&forwarder.descriptor);
            self.repo.replace(dispatch, move |def| {
                if def.find_direct(&forward.descriptor).is_none() {
                    def.direct_methods.push(forward);
                }
            })?;
        }

        Ok(())
    }
}
