//! The bidirectional member-rename table produced by this pass. Downstream
//! passes compose over it: call sites are pushed forward, stack traces and
//! diagnostics are mapped back.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use model::{
    class::{FieldRef, MethodRef},
    code::InvokeKind,
};
use support::intern::Interner;

/// Why a member was moved. Decides which inverse map the record lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKind {
    Default,
    Static,
    PrivateInstance,
    DispatchForward,
    StaticRetarget,
    NonEmulatedVirtualRetarget,
    EmulatedVirtualRetarget,
}

/// One planned move, as accumulated in the per-interface buffers.
#[derive(Debug, Clone)]
pub struct RecordedMove {
    pub from: MethodRef,
    pub to: MethodRef,
    pub kind: MoveKind,
}

pub struct LensBuilder<'a> {
    refs: &'a Interner<MethodRef>,
    forward: HashMap<Arc<MethodRef>, Arc<MethodRef>>,
    backward: HashMap<Arc<MethodRef>, Arc<MethodRef>>,
    extra_backward: HashMap<Arc<MethodRef>, Arc<MethodRef>>,
    invoke_kinds: HashMap<Arc<MethodRef>, InvokeKind>,
    field_forward: HashMap<FieldRef, FieldRef>,
    field_backward: HashMap<FieldRef, FieldRef>,
}

impl<'a> LensBuilder<'a> {
    pub fn new(refs: &'a Interner<MethodRef>) -> Self {
        Self {
            refs,
            forward: HashMap::new(),
            backward: HashMap::new(),
            extra_backward: HashMap::new(),
            invoke_kinds: HashMap::new(),
            field_forward: HashMap::new(),
            field_backward: HashMap::new(),
        }
    }

    /// Field renames. Interface desugaring itself moves no fields (companions
    /// carry none), but the lens shape supports them for the passes that
    /// compose over this one.
    pub fn record_field(&mut self, from: FieldRef, to: FieldRef) {
        self.field_backward.insert(to.clone(), from.clone());
        self.field_forward.insert(from, to);
    }

    /// Records `from -> to` plus the inverse. Moved defaults keep their
    /// inverse in the extra map: the abstract shim on the interface and the
    /// companion body both claim the same origin, and which of the two is
    /// authoritative changes over the compilation (see
    /// [`InterfaceLens::toggle_mapping_to_extra_methods`]).
    pub fn record(&mut self, mv: &RecordedMove) {
        let from = self.refs.intern(mv.from.clone());
        let to = self.refs.intern(mv.to.clone());

        self.forward.insert(Arc::clone(&from), Arc::clone(&to));

        let inverse = match mv.kind {
            MoveKind::Default => &mut self.extra_backward,
            _ => &mut self.backward,
        };
        inverse.insert(Arc::clone(&to), from);

        self.invoke_kinds.insert(to, InvokeKind::Static);
    }

    /// The emulated-virtual triple: the stub is a second synthesized name
    /// claiming the same origin, so it lands in the inverse map alongside
    /// the forwarder.
    pub fn record_stub(&mut self, original: &MethodRef, stub: &MethodRef) {
        let from = self.refs.intern(original.clone());
        let stub = self.refs.intern(stub.clone());

        self.backward.insert(stub, from);
    }

    pub fn build(self) -> InterfaceLens {
        InterfaceLens {
            forward: self.forward,
            backward: self.backward,
            extra_backward: self.extra_backward,
            invoke_kinds: self.invoke_kinds,
            field_forward: self.field_forward,
            field_backward: self.field_backward,
            extra_is_authoritative: AtomicBool::new(false),
        }
    }
}

/// The finished lens. Total over the moved set: every moved original has a
/// forward entry, every synthesized name an inverse entry.
pub struct InterfaceLens {
    forward: HashMap<Arc<MethodRef>, Arc<MethodRef>>,
    backward: HashMap<Arc<MethodRef>, Arc<MethodRef>>,
    extra_backward: HashMap<Arc<MethodRef>, Arc<MethodRef>>,
    invoke_kinds: HashMap<Arc<MethodRef>, InvokeKind>,
    field_forward: HashMap<FieldRef, FieldRef>,
    field_backward: HashMap<FieldRef, FieldRef>,
    extra_is_authoritative: AtomicBool,
}

impl InterfaceLens {
    /// Pushes a call site forward. None means the lens does not own the
    /// target and the call site stands as written.
    pub fn lookup_method(
        &self,
        target: &MethodRef,
        _context: Option<&MethodRef>,
        invoke_kind: InvokeKind,
    ) -> Option<(Arc<MethodRef>, InvokeKind)> {
        let to = self.forward.get(target)?;
        let kind = self.map_invocation_type(to, target, invoke_kind);

        Some((Arc::clone(to), kind))
    }

    /// Maps a synthesized reference back to its origin, consulting the
    /// authoritative inverse map first.
    pub fn original_method_signature(&self, new_ref: &MethodRef) -> Option<Arc<MethodRef>> {
        let (primary, secondary) = if self.extra_is_authoritative.load(Ordering::SeqCst) {
            (&self.extra_backward, &self.backward)
        } else {
            (&self.backward, &self.extra_backward)
        };

        primary
            .get(new_ref)
            .or_else(|| secondary.get(new_ref))
            .cloned()
    }

    pub fn next_method_signature(&self, old_ref: &MethodRef) -> Option<Arc<MethodRef>> {
        self.forward.get(old_ref).cloned()
    }

    pub fn lookup_field(&self, field: &FieldRef) -> Option<&FieldRef> {
        self.field_forward.get(field)
    }

    pub fn original_field_signature(&self, new_field: &FieldRef) -> Option<&FieldRef> {
        self.field_backward.get(new_field)
    }

    /// Invocation kind at a rewritten call site. Members owned by this lens
    /// are static from here on, whatever opcode named them before.
    pub fn map_invocation_type(
        &self,
        new_ref: &MethodRef,
        _old_ref: &MethodRef,
        original: InvokeKind,
    ) -> InvokeKind {
        match self.invoke_kinds.get(new_ref) {
            Some(kind) => *kind,
            None => original,
        }
    }

    /// Swaps which inverse map is authoritative. The lambda rewriter flips
    /// this exactly once, after which the companion implementations (not the
    /// interface shims) answer origin queries first.
    pub fn toggle_mapping_to_extra_methods(&self) {
        self.extra_is_authoritative.fetch_xor(true, Ordering::SeqCst);
    }

    pub fn owns_target(&self, new_ref: &MethodRef) -> bool {
        self.backward.contains_key(new_ref) || self.extra_backward.contains_key(new_ref)
    }

    pub fn moved(&self) -> impl Iterator<Item = (&Arc<MethodRef>, &Arc<MethodRef>)> {
        self.forward.iter()
    }

    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}

/// The lens chain handed from pass to pass. Ordered, immutable entries;
/// `find` returns the most recent interface-desugaring lens.
#[derive(Default)]
pub struct LensChain {
    lenses: Vec<Arc<InterfaceLens>>,
}

impl LensChain {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn push(&mut self, lens: Arc<InterfaceLens>) {
        self.lenses.push(lens);
    }

    pub fn find(&self) -> Option<&Arc<InterfaceLens>> {
        self.lenses.last()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<InterfaceLens>> {
        self.lenses.iter()
    }

    pub fn len(&self) -> usize {
        self.lenses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lenses.is_empty()
    }
}
