//! Whole-program method resolution. Answers the one question the planner
//! keeps asking: given a receiver type and a signature, which definition
//! would the VM execute?

use std::collections::{HashSet, VecDeque};

use model::{
    class::{MethodDef, MethodRef},
    repo::ClassRepo,
};
use support::{descriptor::FieldType, types::MethodDescriptor};

#[derive(Debug)]
pub enum Resolution<'r> {
    Resolved {
        holder: FieldType,
        method: &'r MethodDef,
    },
    /// The type (or the method) is outside the compilation closure. Never
    /// fatal; the planner treats it as "not ours".
    NoSuchMethod,
    IllegalAccess(MethodRef),
    /// Two unrelated super-interfaces both supply a non-abstract definition.
    Ambiguous(Vec<MethodRef>),
}

impl<'r> Resolution<'r> {
    pub fn resolved(&self) -> Option<(&FieldType, &'r MethodDef)> {
        match self {
            Resolution::Resolved { holder, method } => Some((holder, method)),
            _ => None,
        }
    }

    pub fn is_no_such_method(&self) -> bool {
        matches!(self, Resolution::NoSuchMethod)
    }
}

pub struct Resolver<'r> {
    repo: &'r ClassRepo,
}

impl<'r> Resolver<'r> {
    pub fn new(repo: &'r ClassRepo) -> Self {
        Self { repo }
    }

    pub fn resolve(&self, receiver: &FieldType, signature: &MethodDescriptor) -> Resolution<'r> {
        if self.repo.get(receiver).is_none() {
            return Resolution::NoSuchMethod;
        }

        // Phase one: the receiver and its super-class chain. Private members
        // resolve on the receiver itself only; a private match further up is
        // remembered so the failure mode is accurate.
        let mut blocked: Option<MethodRef> = None;
        let mut on_receiver = true;
        let mut current = Some(receiver.clone());

        while let Some(ty) = current {
            let Some(entry) = self.repo.get(&ty) else {
                break;
            };

            let def = &entry.def;
            if let Some(method) = def
                .find_virtual(signature)
                .or_else(|| def.find_direct(signature))
            {
                if method.is_private() && !on_receiver {
                    if blocked.is_none() {
                        blocked = Some(def.method_ref(method));
                    }
                } else {
                    return Resolution::Resolved { holder: ty, method };
                }
            }

            current = def.super_class.clone();
            on_receiver = false;
        }

        // Phase two: maximally specific super-interfaces.
        let mut candidates: Vec<(FieldType, &'r MethodDef)> = vec![];
        for ty in self.super_interfaces(receiver) {
            if let Some(entry) = self.repo.get(&ty) {
                if let Some(method) = entry.def.find_virtual(signature) {
                    if !method.is_private() {
                        candidates.push((ty, method));
                    }
                }
            }
        }

        let supers_per_candidate: Vec<HashSet<FieldType>> = candidates
            .iter()
            .map(|(ty, _)| self.super_interfaces(ty).into_iter().collect())
            .collect();

        let mut maximal: Vec<(FieldType, &'r MethodDef)> = vec![];
        for (index, (ty, method)) in candidates.iter().enumerate() {
            let shadowed = supers_per_candidate
                .iter()
                .enumerate()
                .any(|(other, supers)| other != index && supers.contains(ty));

            if !shadowed {
                maximal.push((ty.clone(), *method));
            }
        }

        maximal.sort_by_key(|(ty, _)| ty.to_string());

        let mut concrete: Vec<(FieldType, &'r MethodDef)> = maximal
            .iter()
            .filter(|(_, m)| !m.is_abstract())
            .map(|(ty, m)| (ty.clone(), *m))
            .collect();

        match concrete.len() {
            1 => {
                let (holder, method) = concrete.remove(0);
                Resolution::Resolved { holder, method }
            }
            0 => match maximal.into_iter().next() {
                // All-abstract candidate sets resolve to the lowest holder in
                // descriptor order so the answer is run-to-run stable.
                Some((holder, method)) => Resolution::Resolved { holder, method },
                None => match blocked {
                    Some(method) => Resolution::IllegalAccess(method),
                    None => Resolution::NoSuchMethod,
                },
            },
            _ => Resolution::Ambiguous(
                concrete
                    .into_iter()
                    .map(|(ty, m)| MethodRef::new(ty.clone(), m.descriptor.clone()))
                    .collect(),
            ),
        }
    }

    /// Every supertype reachable from `ty` in BFS order, tagged with whether
    /// the type was reached as an implemented interface. Types the repository
    /// does not know still appear; they just cannot be expanded further.
    pub fn supertypes_of(&self, ty: &FieldType) -> Vec<(FieldType, bool)> {
        let mut seen: HashSet<FieldType> = HashSet::new();
        let mut queue: VecDeque<(FieldType, bool)> = VecDeque::new();
        let mut out = vec![];

        if let Some(entry) = self.repo.get(ty) {
            if let Some(super_class) = &entry.def.super_class {
                queue.push_back((super_class.clone(), false));
            }
            for interface in &entry.def.interfaces {
                queue.push_back((interface.clone(), true));
            }
        }

        while let Some((next, via_interface)) = queue.pop_front() {
            if !seen.insert(next.clone()) {
                continue;
            }

            if let Some(entry) = self.repo.get(&next) {
                if let Some(super_class) = &entry.def.super_class {
                    queue.push_back((super_class.clone(), via_interface));
                }
                for interface in &entry.def.interfaces {
                    queue.push_back((interface.clone(), true));
                }
            }

            out.push((next, via_interface));
        }

        out
    }

    /// The interface part of the supertype closure.
    pub fn super_interfaces(&self, ty: &FieldType) -> Vec<FieldType> {
        self.supertypes_of(ty)
            .into_iter()
            .filter_map(|(ty, via_interface)| via_interface.then_some(ty))
            .collect()
    }

    /// Every type in the repository that has `ty` among its supertypes, in
    /// descriptor order. Computed on demand by scanning; only the invariant
    /// checker and the emulated-dispatch detector want it.
    pub fn subtypes_of(&self, ty: &FieldType) -> Vec<FieldType> {
        let mut out: Vec<FieldType> = self
            .repo
            .types()
            .filter(|candidate| {
                self.supertypes_of(candidate)
                    .iter()
                    .any(|(super_ty, _)| super_ty == ty)
            })
            .cloned()
            .collect();

        out.sort_by_key(|ty| ty.to_string());
        out
    }
}
