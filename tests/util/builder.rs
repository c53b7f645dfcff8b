// Programmatic class construction for the scenario tests. Inputs are built
// the way the upstream reader would deliver them: already classified, with
// descriptors parsed and bodies attached.

use model::{
    class::{ClassDef, MethodDef, MethodRef, Origin, CLASS_INITIALISER, OBJECT_CLASS},
    code::{Code, CodeBody, InvokeKind, RegOp, RegisterCode, StackCode, StackOp},
    flags::{ClassAccessFlag, ClassAccessFlags, MethodAccessFlag, MethodAccessFlags},
    repo::{ClassKind, ClassRepo},
};
use support::{descriptor::FieldType, types::MethodDescriptor};

pub fn cls(name: &str) -> FieldType {
    FieldType::object(name)
}

pub fn sig(name: &str, descriptor: &str) -> MethodDescriptor {
    (name, descriptor)
        .try_into()
        .unwrap_or_else(|_| panic!("bad descriptor {}", descriptor))
}

pub fn method_ref(holder: &str, name: &str, descriptor: &str) -> MethodRef {
    MethodRef::new(cls(holder), sig(name, descriptor))
}

/// Minimal stack body: push a constant, return it.
pub fn returning_int(value: i32) -> Code {
    Code::new(CodeBody::Stack(StackCode {
        max_stack: 1,
        max_locals: 1,
        ops: vec![StackOp::PushInt(value), StackOp::ReturnValue],
    }))
}

/// Stack body whose only interesting instruction is one call.
pub fn calling(kind: InvokeKind, target: MethodRef) -> Code {
    Code::new(CodeBody::Stack(StackCode {
        max_stack: 1,
        max_locals: 1,
        ops: vec![
            StackOp::LoadLocal(0),
            StackOp::Invoke {
                kind,
                target,
                interface: false,
            },
            StackOp::Return,
        ],
    }))
}

/// Same shape in the register format.
pub fn register_calling(kind: InvokeKind, target: MethodRef) -> Code {
    Code::new(CodeBody::Register(RegisterCode {
        registers: 1,
        ins: 1,
        ops: vec![
            RegOp::Invoke {
                kind,
                target,
                args: vec![0],
            },
            RegOp::ReturnVoid,
        ],
    }))
}

pub struct ClassBuilder {
    kind: ClassKind,
    def: ClassDef,
}

impl ClassBuilder {
    pub fn interface(name: &str) -> Self {
        let mut flags = ClassAccessFlags::empty();
        flags.add(ClassAccessFlag::PUBLIC | ClassAccessFlag::INTERFACE | ClassAccessFlag::ABSTRACT);

        Self {
            kind: ClassKind::Program,
            def: ClassDef::new(cls(name), flags, Origin::Unknown),
        }
    }

    pub fn class(name: &str) -> Self {
        let mut flags = ClassAccessFlags::empty();
        flags.add(ClassAccessFlag::PUBLIC | ClassAccessFlag::SUPER);

        let mut def = ClassDef::new(cls(name), flags, Origin::Unknown);
        if name == OBJECT_CLASS {
            def.super_class = None;
        }

        Self {
            kind: ClassKind::Program,
            def,
        }
    }

    pub fn library(mut self) -> Self {
        self.kind = ClassKind::Library;
        self
    }

    pub fn classpath(mut self) -> Self {
        self.kind = ClassKind::Classpath;
        self
    }

    pub fn final_class(mut self) -> Self {
        self.def.flags.add(ClassAccessFlag::FINAL);
        self
    }

    pub fn extends(mut self, name: &str) -> Self {
        self.def.super_class = Some(cls(name));
        self
    }

    pub fn implements(mut self, name: &str) -> Self {
        self.def.interfaces.push(cls(name));
        self
    }

    pub fn checksum(mut self, value: u64) -> Self {
        self.def = self.def.with_checksum(value);
        self
    }

    fn push_virtual(mut self, flags: MethodAccessFlags, name: &str, descriptor: &str, code: Option<Code>) -> Self {
        self.def
            .virtual_methods
            .push(MethodDef::new(sig(name, descriptor), flags, code));
        self
    }

    fn push_direct(mut self, flags: MethodAccessFlags, name: &str, descriptor: &str, code: Option<Code>) -> Self {
        self.def
            .direct_methods
            .push(MethodDef::new(sig(name, descriptor), flags, code));
        self
    }

    pub fn default_method(self, name: &str, descriptor: &str) -> Self {
        self.default_method_with(name, descriptor, returning_int(7))
    }

    pub fn default_method_with(self, name: &str, descriptor: &str, code: Code) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC);
        self.push_virtual(flags, name, descriptor, Some(code))
    }

    pub fn abstract_method(self, name: &str, descriptor: &str) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT);
        self.push_virtual(flags, name, descriptor, None)
    }

    pub fn bridge_method(self, name: &str, descriptor: &str) -> Self {
        self.bridge_method_with(name, descriptor, returning_int(7))
    }

    pub fn bridge_method_with(self, name: &str, descriptor: &str, code: Code) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::BRIDGE);
        self.push_virtual(flags, name, descriptor, Some(code))
    }

    pub fn virtual_method(self, name: &str, descriptor: &str) -> Self {
        self.virtual_method_with(name, descriptor, returning_int(7))
    }

    pub fn virtual_method_with(self, name: &str, descriptor: &str, code: Code) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC);
        self.push_virtual(flags, name, descriptor, Some(code))
    }

    pub fn final_virtual_method(self, name: &str, descriptor: &str) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::FINAL);
        self.push_virtual(flags, name, descriptor, Some(returning_int(7)))
    }

    pub fn native_virtual_method(self, name: &str, descriptor: &str) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::NATIVE);
        self.push_virtual(flags, name, descriptor, None)
    }

    pub fn static_method(self, name: &str, descriptor: &str) -> Self {
        self.static_method_with(name, descriptor, returning_int(7))
    }

    pub fn static_method_with(self, name: &str, descriptor: &str, code: Code) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PUBLIC | MethodAccessFlag::STATIC);
        self.push_direct(flags, name, descriptor, Some(code))
    }

    pub fn private_static_method(self, name: &str, descriptor: &str) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PRIVATE | MethodAccessFlag::STATIC);
        self.push_direct(flags, name, descriptor, Some(returning_int(7)))
    }

    pub fn private_method(self, name: &str, descriptor: &str) -> Self {
        self.private_method_with(name, descriptor, returning_int(1))
    }

    pub fn private_method_with(self, name: &str, descriptor: &str, code: Code) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::PRIVATE);
        self.push_direct(flags, name, descriptor, Some(code))
    }

    pub fn clinit(self) -> Self {
        let mut flags = MethodAccessFlags::empty();
        flags.add(MethodAccessFlag::STATIC);
        self.push_direct(flags, CLASS_INITIALISER, "()V", Some(returning_int(0)))
    }

    pub fn build(self) -> (ClassKind, ClassDef) {
        (self.kind, self.def)
    }

    pub fn publish(self, repo: &mut ClassRepo) {
        let (kind, def) = self.build();
        let ty = def.ty.clone();
        repo.publish(kind, def)
            .unwrap_or_else(|err| panic!("publishing {} failed: {}", ty, err));
    }
}

/// Roots the hierarchy so supertype walks have somewhere to stop.
pub fn with_object(repo: &mut ClassRepo) {
    ClassBuilder::class(OBJECT_CLASS).library().publish(repo);
}
