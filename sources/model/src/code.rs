use std::{fmt, sync::Arc};

use enum_as_inner::EnumAsInner;
use support::descriptor::FieldType;

use crate::class::{FieldRef, MethodRef};

/// How a call site names its target. Moved members are always re-invoked
/// statically, whatever the original opcode was.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvokeKind {
    Virtual,
    Interface,
    Super,
    Direct,
    Static,
}

impl fmt::Display for InvokeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            InvokeKind::Virtual => "virtual",
            InvokeKind::Interface => "interface",
            InvokeKind::Super => "super",
            InvokeKind::Direct => "direct",
            InvokeKind::Static => "static",
        };

        write!(f, "{}", name)
    }
}

/// Names and line info carried per definition. When an instance method turns
/// into a static one the receiver becomes parameter zero and has to show up
/// here, or debuggers would mis-slot every parameter after it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DebugInfo {
    pub line_start: u32,
    pub parameter_names: Vec<String>,
}

impl DebugInfo {
    pub fn prepend_receiver(&mut self, name: &str) {
        self.parameter_names.insert(0, name.to_string());
    }
}

/// A method body. The instructions are shared; moving a body between holders
/// transfers the `Arc` and only ever touches the (small) debug info.
#[derive(Debug, Clone)]
pub struct Code {
    pub body: Arc<CodeBody>,
    pub debug: Option<DebugInfo>,
}

impl Code {
    pub fn new(body: CodeBody) -> Self {
        Self {
            body: Arc::new(body),
            debug: None,
        }
    }

    pub fn with_debug(mut self, debug: DebugInfo) -> Self {
        self.debug = Some(debug);
        self
    }

    /// The moved form of an instance body: same instructions (parameter zero
    /// already lines up with the old `this` slot), debug info gains the
    /// receiver name.
    pub fn as_moved_instance(&self, receiver_name: &str) -> Code {
        let mut debug = self.debug.clone();
        if let Some(debug) = debug.as_mut() {
            debug.prepend_receiver(receiver_name);
        }

        Code {
            body: Arc::clone(&self.body),
            debug,
        }
    }
}

#[derive(EnumAsInner, Debug, Clone, PartialEq)]
pub enum CodeBody {
    Stack(StackCode),
    Register(RegisterCode),
}

impl CodeBody {
    /// "Do you contain a super-invoke whose holder satisfies this
    /// predicate?" Each code format answers for itself.
    pub fn super_invoke_target(&self, holder_matches: &dyn Fn(&FieldType) -> bool) -> Option<&MethodRef> {
        match self {
            CodeBody::Stack(code) => code.super_invoke_target(holder_matches),
            CodeBody::Register(code) => code.super_invoke_target(holder_matches),
        }
    }

    /// Every call site in the body, in instruction order.
    pub fn invocations(&self) -> Vec<(InvokeKind, &MethodRef)> {
        match self {
            CodeBody::Stack(code) => code.invocations(),
            CodeBody::Register(code) => code.invocations(),
        }
    }

    /// Rewrites call sites through `map`. Returns None when nothing changed,
    /// so unchanged bodies keep their shared allocation.
    pub fn map_invocations(
        &self,
        map: &dyn Fn(InvokeKind, &MethodRef) -> Option<(InvokeKind, MethodRef)>,
    ) -> Option<CodeBody> {
        match self {
            CodeBody::Stack(code) => code.map_invocations(map).map(CodeBody::Stack),
            CodeBody::Register(code) => code.map_invocations(map).map(CodeBody::Register),
        }
    }
}

/// Stack machine format, as read from class files.
#[derive(Debug, Clone, PartialEq)]
pub struct StackCode {
    pub max_stack: u16,
    pub max_locals: u16,
    pub ops: Vec<StackOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StackOp {
    LoadLocal(u16),
    StoreLocal(u16),
    PushInt(i32),
    PushNull,
    Dup,
    Pop,
    New(FieldType),
    GetField(FieldRef),
    PutField(FieldRef),
    GetStatic(FieldRef),
    PutStatic(FieldRef),
    Invoke {
        kind: InvokeKind,
        target: MethodRef,
        /// Whether the constant pool names the holder as an interface.
        interface: bool,
    },
    Return,
    ReturnValue,
}

impl StackCode {
    fn super_invoke_target(&self, holder_matches: &dyn Fn(&FieldType) -> bool) -> Option<&MethodRef> {
        self.ops.iter().find_map(|op| match op {
            StackOp::Invoke {
                kind: InvokeKind::Super,
                target,
                ..
            } if holder_matches(&target.holder) => Some(target),
            _ => None,
        })
    }

    fn invocations(&self) -> Vec<(InvokeKind, &MethodRef)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                StackOp::Invoke { kind, target, .. } => Some((*kind, target)),
                _ => None,
            })
            .collect()
    }

    fn map_invocations(
        &self,
        map: &dyn Fn(InvokeKind, &MethodRef) -> Option<(InvokeKind, MethodRef)>,
    ) -> Option<StackCode> {
        let mut changed = false;
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                StackOp::Invoke {
                    kind,
                    target,
                    interface,
                } => match map(*kind, target) {
                    Some((new_kind, new_target)) => {
                        changed = true;
                        StackOp::Invoke {
                            kind: new_kind,
                            target: new_target,
                            interface: *interface,
                        }
                    }
                    None => op.clone(),
                },
                _ => op.clone(),
            })
            .collect();

        changed.then(|| StackCode {
            max_stack: self.max_stack,
            max_locals: self.max_locals,
            ops,
        })
    }
}

/// Register machine format, as emitted for Dalvik.
#[derive(Debug, Clone, PartialEq)]
pub struct RegisterCode {
    pub registers: u16,
    pub ins: u16,
    pub ops: Vec<RegOp>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum RegOp {
    Const {
        dest: u16,
        value: i32,
    },
    Move {
        dest: u16,
        src: u16,
    },
    SGet {
        dest: u16,
        field: FieldRef,
    },
    SPut {
        src: u16,
        field: FieldRef,
    },
    Invoke {
        kind: InvokeKind,
        target: MethodRef,
        args: Vec<u16>,
    },
    ReturnVoid,
    Return {
        src: u16,
    },
}

impl RegisterCode {
    fn super_invoke_target(&self, holder_matches: &dyn Fn(&FieldType) -> bool) -> Option<&MethodRef> {
        self.ops.iter().find_map(|op| match op {
            RegOp::Invoke {
                kind: InvokeKind::Super,
                target,
                ..
            } if holder_matches(&target.holder) => Some(target),
            _ => None,
        })
    }

    fn invocations(&self) -> Vec<(InvokeKind, &MethodRef)> {
        self.ops
            .iter()
            .filter_map(|op| match op {
                RegOp::Invoke { kind, target, .. } => Some((*kind, target)),
                _ => None,
            })
            .collect()
    }

    fn map_invocations(
        &self,
        map: &dyn Fn(InvokeKind, &MethodRef) -> Option<(InvokeKind, MethodRef)>,
    ) -> Option<RegisterCode> {
        let mut changed = false;
        let ops = self
            .ops
            .iter()
            .map(|op| match op {
                RegOp::Invoke { kind, target, args } => match map(*kind, target) {
                    Some((new_kind, new_target)) => {
                        changed = true;
                        RegOp::Invoke {
                            kind: new_kind,
                            target: new_target,
                            args: args.clone(),
                        }
                    }
                    None => op.clone(),
                },
                _ => op.clone(),
            })
            .collect();

        changed.then(|| RegisterCode {
            registers: self.registers,
            ins: self.ins,
            ops,
        })
    }
}
