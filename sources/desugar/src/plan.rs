//! The move planner. One interface in, one plan out: which bodies leave for
//! the companion, which declarations stay behind, and the rename records the
//! lens will be built from. Plans are computed independently per interface
//! against a frozen repository, so the whole pass can fan out.

use std::collections::{BTreeMap, HashSet};

use model::{
    class::{ClassDef, MethodDef, MethodRef},
    code::InvokeKind,
    flags::MethodAccessFlag,
    repo::ClassRepo,
};
use support::{descriptor::FieldType, types::MethodDescriptor};
use tracing::{debug, info};

use crate::{
    error::{DesugarError, Diagnostics},
    internal,
    lens::{MoveKind, RecordedMove},
    naming,
    resolve::Resolver,
    DesugarOptions,
};

/// The shrinker's liveness answers. A pinned method is reachable from the
/// kept API surface and must keep its declaration.
pub trait PinnedOracle: Sync {
    fn is_pinned(&self, method: &MethodRef) -> bool;
}

/// Stand-in when no shrinker ran: nothing is pinned.
pub struct NothingPinned;

impl PinnedOracle for NothingPinned {
    fn is_pinned(&self, _method: &MethodRef) -> bool {
        false
    }
}

/// Everything the planner decided about one program interface.
#[derive(Debug)]
pub struct InterfacePlan {
    pub interface: FieldType,
    /// Methods the companion class will carry, already re-signed.
    pub companion_methods: Vec<MethodDef>,
    /// The interface's revised virtual method list (abstract shims only).
    pub virtual_methods: Vec<MethodDef>,
    /// The interface's revised direct method list (`<clinit>` only).
    pub direct_methods: Vec<MethodDef>,
    pub records: Vec<RecordedMove>,
    /// Whether anything moved or was dropped. Untouched interfaces skip
    /// synthesis entirely.
    pub touched: bool,
}

impl InterfacePlan {
    fn new(interface: FieldType) -> Self {
        Self {
            interface,
            companion_methods: vec![],
            virtual_methods: vec![],
            direct_methods: vec![],
            records: vec![],
            touched: false,
        }
    }
}

/// A dispatch class to synthesize for a library interface whose statics are
/// invoked from program code.
#[derive(Debug)]
pub struct DispatchPlan {
    pub interface: FieldType,
    pub methods: Vec<MethodDescriptor>,
    pub records: Vec<RecordedMove>,
}

pub struct Planner<'a> {
    repo: &'a ClassRepo,
    resolver: Resolver<'a>,
    pinned: &'a dyn PinnedOracle,
    options: &'a DesugarOptions,
    diagnostics: &'a Diagnostics,
}

impl<'a> Planner<'a> {
    pub fn new(
        repo: &'a ClassRepo,
        pinned: &'a dyn PinnedOracle,
        options: &'a DesugarOptions,
        diagnostics: &'a Diagnostics,
    ) -> Self {
        Self {
            repo,
            resolver: Resolver::new(repo),
            pinned,
            options,
            diagnostics,
        }
    }

    /// Plans one program interface. Fatal findings are reported and sink the
    /// interface, never the run.
    pub fn plan_interface(&self, def: &ClassDef) -> Option<InterfacePlan> {
        if self.options.emulated_interfaces.contains(&def.ty) {
            debug!("{} is owned by emulated dispatch, skipping", def.ty);
            return None;
        }

        match self.build_plan(def) {
            Ok(plan) => {
                if plan.touched {
                    info!(
                        "{}: {} member(s) move to the companion",
                        def.ty,
                        plan.companion_methods.len()
                    );
                }
                Some(plan)
            }
            Err(err) => {
                self.diagnostics.report(def.origin.clone(), err);
                None
            }
        }
    }

    fn build_plan(&self, def: &ClassDef) -> Result<InterfacePlan, DesugarError> {
        let mut plan = InterfacePlan::new(def.ty.clone());

        self.plan_virtuals(def, &mut plan)?;
        self.plan_directs(def, &mut plan)?;

        // The mangled names make a collision impossible for inputs that obey
        // the class file rules; anything else is refused, not papered over.
        let mut seen: HashSet<&MethodDescriptor> = HashSet::new();
        for method in &plan.companion_methods {
            if !seen.insert(&method.descriptor) {
                return Err(DesugarError::CompanionNameCollision {
                    interface: def.ty.clone(),
                    descriptor: method.descriptor.clone(),
                });
            }
        }

        Ok(plan)
    }

    fn plan_virtuals(&self, def: &ClassDef, plan: &mut InterfacePlan) -> Result<(), DesugarError> {
        let super_interfaces: HashSet<FieldType> =
            self.resolver.super_interfaces(&def.ty).into_iter().collect();

        for method in &def.virtual_methods {
            if method.is_native() {
                return Err(DesugarError::NativeNotSupported {
                    method: def.method_ref(method),
                });
            }

            if method.is_abstract() {
                plan.virtual_methods.push(method.clone());
                continue;
            }

            // A default method. The body has to be movable: a super-invoke
            // into one of our super-interfaces only means something from the
            // interface itself.
            let code = method.code.as_ref().ok_or_else(|| DesugarError::DefaultWithoutBody {
                method: def.method_ref(method),
            })?;

            if let Some(target) = code
                .body
                .super_invoke_target(&|holder| super_interfaces.contains(holder))
            {
                return Err(DesugarError::UnmovableDefault {
                    method: def.method_ref(method),
                    target: target.clone(),
                });
            }

            let moved = naming::as_moved_default(&def.ty, &method.descriptor)?;

            let mut flags = method.flags.clone();
            flags
                .add(MethodAccessFlag::PUBLIC | MethodAccessFlag::STATIC)
                .remove(MethodAccessFlag::BRIDGE);

            plan.companion_methods.push(MethodDef::new(
                moved.descriptor.clone(),
                flags,
                Some(code.as_moved_instance(naming::RECEIVER_NAME)),
            ));
            plan.records.push(RecordedMove {
                from: def.method_ref(method),
                to: moved,
                kind: MoveKind::Default,
            });
            plan.touched = true;

            if self.keeps_shim(def, method) {
                plan.virtual_methods.push(method.as_abstract_shim());
            } else {
                debug!("dropping dead bridge {} from {}", method.descriptor, def.ty);
            }
        }

        Ok(())
    }

    /// Whether the interface keeps an abstract declaration for a moved
    /// default. Only an unpinned bridge that some supertype already declares
    /// can go; anything else stays part of the API.
    fn keeps_shim(&self, def: &ClassDef, method: &MethodDef) -> bool {
        if self.pinned.is_pinned(&def.method_ref(method)) {
            return true;
        }

        if !method.is_bridge() {
            return true;
        }

        !self.bridge_is_dead(def, method)
    }

    /// A bridge is dead when some supertype declares the same signature and
    /// that declaration survives the pass. A program bridge that is itself
    /// removable does not count; conservatively keeping ours is always
    /// resolution-preserving, and deciding locally keeps planning parallel.
    fn bridge_is_dead(&self, def: &ClassDef, method: &MethodDef) -> bool {
        for (ty, _) in self.resolver.supertypes_of(&def.ty) {
            let Some(entry) = self.repo.get(&ty) else {
                continue;
            };

            if let Some(existing) = entry.def.find_virtual(&method.descriptor) {
                let survives = !entry.kind.is_program()
                    || !existing.is_bridge()
                    || self.pinned.is_pinned(&entry.def.method_ref(existing));

                if survives {
                    return true;
                }
            }
        }

        false
    }

    fn plan_directs(&self, def: &ClassDef, plan: &mut InterfacePlan) -> Result<(), DesugarError> {
        for method in &def.direct_methods {
            // Interfaces may carry `<clinit>` with side-effecting static
            // field initialization; moving it would change initialization
            // order. It stays.
            if method.is_initialiser() {
                plan.direct_methods.push(method.clone());
                continue;
            }

            if method.is_native() {
                return Err(DesugarError::NativeNotSupported {
                    method: def.method_ref(method),
                });
            }

            if method.is_static() {
                if !method.is_public() && !method.is_private() {
                    return Err(DesugarError::MalformedStaticVisibility {
                        method: def.method_ref(method),
                    });
                }

                let moved = naming::as_moved_static(&def.ty, &method.descriptor)?;

                let mut flags = method.flags.clone();
                flags
                    .remove(MethodAccessFlag::PRIVATE)
                    .add(MethodAccessFlag::PUBLIC);

                plan.companion_methods.push(MethodDef::new(
                    moved.descriptor.clone(),
                    flags,
                    method.code.clone(),
                ));
                plan.records.push(RecordedMove {
                    from: def.method_ref(method),
                    to: moved,
                    kind: MoveKind::Static,
                });
                plan.touched = true;
                continue;
            }

            if method.is_private() {
                // Private instance method: moves like a default.
                let code = method.code.as_ref().ok_or_else(|| {
                    internal!("private instance method {} has no body", def.method_ref(method))
                })?;

                let moved = naming::as_moved_private(&def.ty, &method.descriptor)?;

                let mut flags = method.flags.clone();
                flags
                    .remove(MethodAccessFlag::PRIVATE)
                    .add(MethodAccessFlag::PUBLIC | MethodAccessFlag::STATIC);

                plan.companion_methods.push(MethodDef::new(
                    moved.descriptor.clone(),
                    flags,
                    Some(code.as_moved_instance(naming::RECEIVER_NAME)),
                ));
                plan.records.push(RecordedMove {
                    from: def.method_ref(method),
                    to: moved,
                    kind: MoveKind::PrivateInstance,
                });
                plan.touched = true;
                continue;
            }

            return Err(internal!(
                "unexpected direct method {} on interface {}",
                method.descriptor,
                def.ty
            ));
        }

        Ok(())
    }

    /// The library pass. Only methods actually observed as invoked get a
    /// forwarder; synthesizing for the whole library interface would make
    /// separate compilations disagree about the dispatch class contents.
    pub fn plan_dispatch_classes(&self) -> Result<Vec<DispatchPlan>, DesugarError> {
        let mut invoked: BTreeMap<String, (FieldType, BTreeMap<String, MethodDescriptor>)> =
            BTreeMap::new();

        for def in self.repo.program_classes() {
            for method in def.methods() {
                let Some(code) = &method.code else {
                    continue;
                };

                for (kind, target) in code.body.invocations() {
                    if kind != InvokeKind::Static || !target.holder.is_class() {
                        continue;
                    }

                    if self.options.emulated_interfaces.contains(&target.holder) {
                        debug!("{} is owned by emulated dispatch, skipping", target);
                        continue;
                    }

                    let Some(entry) = self.repo.get(&target.holder) else {
                        continue;
                    };

                    if !entry.kind.is_library() || !entry.def.is_interface() {
                        continue;
                    }

                    let Some(declared) = entry.def.find_direct(&target.descriptor) else {
                        continue;
                    };

                    if !declared.is_static() || !declared.is_public() {
                        continue;
                    }

                    invoked
                        .entry(target.holder.to_string())
                        .or_insert_with(|| (target.holder.clone(), BTreeMap::new()))
                        .1
                        .insert(target.descriptor.to_string(), target.descriptor.clone());
                }
            }
        }

        let mut plans = vec![];
        for (interface, methods) in invoked.into_values() {
            let methods: Vec<MethodDescriptor> = methods.into_values().collect();

            let mut records = vec![];
            for method in &methods {
                records.push(RecordedMove {
                    from: MethodRef::new(interface.clone(), method.clone()),
                    to: naming::as_dispatch_forward(&interface, method)?,
                    kind: MoveKind::DispatchForward,
                });
            }

            plans.push(DispatchPlan {
                interface,
                methods,
                records,
            });
        }

        Ok(plans)
    }
}
