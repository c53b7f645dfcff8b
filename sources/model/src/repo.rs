use std::collections::HashMap;

use anyhow::{anyhow, Result};
use enum_as_inner::EnumAsInner;
use support::descriptor::FieldType;
use tracing::debug;

use crate::class::ClassDef;

/// How much the compilation is allowed to do to a class.
#[derive(EnumAsInner, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    /// Rewritable input.
    Program,
    /// Immutable, possibly absent at runtime lookup.
    Library,
    /// Immutable, present only so resolution can see it.
    Classpath,
}

#[derive(Debug)]
pub struct ClassEntry {
    pub kind: ClassKind,
    pub def: ClassDef,
}

/// The single owner of class definitions. Everything else holds descriptors
/// and resolves them through here. The planning phase borrows the repository
/// shared (frozen); only the synthesis phase takes it mutably.
#[derive(Debug, Default)]
pub struct ClassRepo {
    classes: HashMap<FieldType, ClassEntry>,
}

impl ClassRepo {
    pub fn new() -> Self {
        Self {
            classes: HashMap::new(),
        }
    }

    pub fn publish(&mut self, kind: ClassKind, def: ClassDef) -> Result<()> {
        let ty = def.ty.clone();
        if self.classes.contains_key(&ty) {
            return Err(anyhow!("{} was already published", ty));
        }

        debug!("publishing {} as {:?}", ty, kind);
        self.classes.insert(ty, ClassEntry { kind, def });

        Ok(())
    }

    pub fn get(&self, ty: &FieldType) -> Option<&ClassEntry> {
        self.classes.get(ty)
    }

    pub fn program_class(&self, ty: &FieldType) -> Option<&ClassDef> {
        self.get(ty)
            .filter(|entry| entry.kind.is_program())
            .map(|entry| &entry.def)
    }

    /// In-place edit of a program class. Library and classpath definitions
    /// are immutable by contract.
    pub fn replace(&mut self, ty: &FieldType, mutate: impl FnOnce(&mut ClassDef)) -> Result<()> {
        let entry = self
            .classes
            .get_mut(ty)
            .ok_or_else(|| anyhow!("{} is not in the repository", ty))?;

        if !entry.kind.is_program() {
            return Err(anyhow!("{} is not a program class", ty));
        }

        mutate(&mut entry.def);

        Ok(())
    }

    /// Program classes in descriptor order, so every phase that walks them
    /// observes the same sequence no matter how the map hashed.
    pub fn program_classes(&self) -> Vec<&ClassDef> {
        let mut classes: Vec<&ClassDef> = self
            .classes
            .values()
            .filter(|entry| entry.kind.is_program())
            .map(|entry| &entry.def)
            .collect();

        classes.sort_by_key(|def| def.ty.to_string());
        classes
    }

    pub fn program_interfaces(&self) -> Vec<&ClassDef> {
        self.program_classes()
            .into_iter()
            .filter(|def| def.is_interface())
            .collect()
    }

    pub fn types(&self) -> impl Iterator<Item = &FieldType> {
        self.classes.keys()
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}
