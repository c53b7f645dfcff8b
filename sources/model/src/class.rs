use std::{fmt, path::PathBuf};

use anyhow::{anyhow, Result};
use support::{
    descriptor::FieldType,
    types::{FieldDescriptor, MethodDescriptor},
};

use crate::{
    code::Code,
    flags::{ClassAccessFlag, ClassAccessFlags, FieldAccessFlags, MethodAccessFlag, MethodAccessFlags},
};

pub const OBJECT_CLASS: &str = "java/lang/Object";
pub const CLASS_INITIALISER: &str = "<clinit>";

/// A fully qualified method reference: holder plus signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodRef {
    pub holder: FieldType,
    pub descriptor: MethodDescriptor,
}

impl MethodRef {
    pub fn new(holder: FieldType, descriptor: MethodDescriptor) -> Self {
        Self { holder, descriptor }
    }
}

impl fmt::Display for MethodRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.holder, self.descriptor)
    }
}

/// A fully qualified field reference: holder plus signature.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FieldRef {
    pub holder: FieldType,
    pub descriptor: FieldDescriptor,
}

impl FieldRef {
    pub fn new(holder: FieldType, descriptor: FieldDescriptor) -> Self {
        Self { holder, descriptor }
    }
}

impl fmt::Display for FieldRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.holder, self.descriptor)
    }
}

/// Where a class definition came from. Synthesized classes remember the one
/// input class they were derived from, which downstream deduplication keys on.
#[derive(Debug, Clone)]
pub enum Origin {
    File(PathBuf),
    Synthetic { parent: FieldType },
    Unknown,
}

impl Origin {
    pub fn synthetic_parent(&self) -> Option<&FieldType> {
        match self {
            Origin::Synthetic { parent } => Some(parent),
            _ => None,
        }
    }
}

impl fmt::Display for Origin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Origin::File(path) => write!(f, "{}", path.display()),
            Origin::Synthetic { parent } => write!(f, "<synthesized from {}>", parent),
            Origin::Unknown => write!(f, "<unknown>"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MethodDef {
    pub descriptor: MethodDescriptor,
    pub flags: MethodAccessFlags,
    pub code: Option<Code>,
}

impl MethodDef {
    pub fn new(descriptor: MethodDescriptor, flags: MethodAccessFlags, code: Option<Code>) -> Self {
        Self {
            descriptor,
            flags,
            code,
        }
    }

    pub fn is_abstract(&self) -> bool {
        self.flags.has(MethodAccessFlag::ABSTRACT)
    }

    pub fn is_static(&self) -> bool {
        self.flags.has(MethodAccessFlag::STATIC)
    }

    pub fn is_private(&self) -> bool {
        self.flags.has(MethodAccessFlag::PRIVATE)
    }

    pub fn is_public(&self) -> bool {
        self.flags.has(MethodAccessFlag::PUBLIC)
    }

    pub fn is_final(&self) -> bool {
        self.flags.has(MethodAccessFlag::FINAL)
    }

    pub fn is_bridge(&self) -> bool {
        self.flags.has(MethodAccessFlag::BRIDGE)
    }

    pub fn is_native(&self) -> bool {
        self.flags.has(MethodAccessFlag::NATIVE)
    }

    pub fn is_initialiser(&self) -> bool {
        self.descriptor.name() == CLASS_INITIALISER
    }

    /// A default method is a virtual interface method that carries a body.
    pub fn is_default(&self) -> bool {
        !self.is_static() && !self.is_abstract()
    }

    /// The abstract declaration left behind on an interface after its body
    /// has moved out: public, abstract, no body, no debug info.
    pub fn as_abstract_shim(&self) -> MethodDef {
        let mut flags = self.flags.clone();
        flags
            .add(MethodAccessFlag::PUBLIC | MethodAccessFlag::ABSTRACT)
            .remove(MethodAccessFlag::BRIDGE | MethodAccessFlag::PRIVATE);

        MethodDef {
            descriptor: self.descriptor.clone(),
            flags,
            code: None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FieldDef {
    pub descriptor: FieldDescriptor,
    pub flags: FieldAccessFlags,
}

#[derive(Debug, Clone)]
pub struct ClassDef {
    pub ty: FieldType,
    pub super_class: Option<FieldType>,
    pub interfaces: Vec<FieldType>,
    pub flags: ClassAccessFlags,
    pub fields: Vec<FieldDef>,
    pub direct_methods: Vec<MethodDef>,
    pub virtual_methods: Vec<MethodDef>,
    pub origin: Origin,
    pub source_file: Option<String>,
    checksum: Option<u64>,
}

impl ClassDef {
    pub fn new(ty: FieldType, flags: ClassAccessFlags, origin: Origin) -> Self {
        Self {
            ty,
            super_class: Some(FieldType::object(OBJECT_CLASS)),
            interfaces: vec![],
            flags,
            fields: vec![],
            direct_methods: vec![],
            virtual_methods: vec![],
            origin,
            source_file: None,
            checksum: None,
        }
    }

    pub fn with_checksum(mut self, checksum: u64) -> Self {
        self.checksum = Some(checksum);
        self
    }

    /// The encoded checksum. Asking for one on a class that was loaded (or
    /// synthesized) without checksums is a caller bug, not a default value.
    pub fn checksum(&self) -> Result<u64> {
        self.checksum
            .ok_or_else(|| anyhow!("no checksum was requested for {}", self.ty))
    }

    pub fn raw_checksum(&self) -> Option<u64> {
        self.checksum
    }

    pub fn is_interface(&self) -> bool {
        self.flags.has(ClassAccessFlag::INTERFACE)
    }

    pub fn method_ref(&self, method: &MethodDef) -> MethodRef {
        MethodRef::new(self.ty.clone(), method.descriptor.clone())
    }

    pub fn find_virtual(&self, descriptor: &MethodDescriptor) -> Option<&MethodDef> {
        self.virtual_methods
            .iter()
            .find(|m| &m.descriptor == descriptor)
    }

    pub fn find_direct(&self, descriptor: &MethodDescriptor) -> Option<&MethodDef> {
        self.direct_methods
            .iter()
            .find(|m| &m.descriptor == descriptor)
    }

    pub fn declares_virtual(&self, descriptor: &MethodDescriptor) -> bool {
        self.find_virtual(descriptor).is_some()
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDef> {
        self.direct_methods.iter().chain(self.virtual_methods.iter())
    }
}

impl fmt::Display for ClassDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ty)
    }
}
