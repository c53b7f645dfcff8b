//! Derivation of synthetic class and member names. Every function here is a
//! pure, reversible mapping; separate compilations of the same interface must
//! agree on every byte of these names.

use anyhow::{anyhow, Result};
use model::class::MethodRef;
use support::{descriptor::FieldType, types::MethodDescriptor};

/// Companion class of a program interface.
pub const COMPANION_SUFFIX: &str = "$-CC";
/// Dispatch class of a library interface with invoked statics.
pub const DISPATCH_SUFFIX: &str = "$-DC";
/// Interface stub synthesized for an emulated virtual retarget.
pub const EMULATED_INTERFACE_SUFFIX: &str = "$-EI";
/// Dispatch class synthesized for an emulated virtual retarget.
pub const EMULATED_DISPATCH_SUFFIX: &str = "$-ED";

/// Name suffix for a moved default method. Statics move with their name
/// intact, so a moved default that collides with one after the receiver is
/// prepended would otherwise be indistinguishable from it.
pub const MOVED_DEFAULT_SUFFIX: &str = "$default";
/// Name suffix for a moved private instance method.
pub const MOVED_PRIVATE_SUFFIX: &str = "$private";

/// Debug-info name of the materialized receiver parameter.
pub const RECEIVER_NAME: &str = "$this";

fn derived(ty: &FieldType, suffix: &str) -> Result<FieldType> {
    let name = ty
        .class_name()
        .ok_or_else(|| anyhow!("{} is not a class type", ty))?;

    Ok(FieldType::object(format!("{}{}", name, suffix)))
}

fn underived(ty: &FieldType, suffix: &str) -> Option<FieldType> {
    ty.class_name()
        .and_then(|name| name.strip_suffix(suffix))
        .map(FieldType::object)
}

pub fn companion_of(interface: &FieldType) -> Result<FieldType> {
    derived(interface, COMPANION_SUFFIX)
}

pub fn interface_of_companion(companion: &FieldType) -> Option<FieldType> {
    underived(companion, COMPANION_SUFFIX)
}

pub fn is_companion(ty: &FieldType) -> bool {
    interface_of_companion(ty).is_some()
}

pub fn dispatch_of(interface: &FieldType) -> Result<FieldType> {
    derived(interface, DISPATCH_SUFFIX)
}

pub fn interface_of_dispatch(dispatch: &FieldType) -> Option<FieldType> {
    underived(dispatch, DISPATCH_SUFFIX)
}

pub fn emulated_interface_of(holder: &FieldType) -> Result<FieldType> {
    derived(holder, EMULATED_INTERFACE_SUFFIX)
}

pub fn emulated_dispatch_of(holder: &FieldType) -> Result<FieldType> {
    derived(holder, EMULATED_DISPATCH_SUFFIX)
}

/// The companion form of a default method: receiver becomes parameter zero,
/// name marked so it cannot collide with a moved static.
pub fn as_moved_default(interface: &FieldType, method: &MethodDescriptor) -> Result<MethodRef> {
    Ok(MethodRef::new(
        companion_of(interface)?,
        method
            .with_name_suffix(MOVED_DEFAULT_SUFFIX)
            .prepend_parameter(interface.clone()),
    ))
}

/// The companion form of a private instance method.
pub fn as_moved_private(interface: &FieldType, method: &MethodDescriptor) -> Result<MethodRef> {
    Ok(MethodRef::new(
        companion_of(interface)?,
        method
            .with_name_suffix(MOVED_PRIVATE_SUFFIX)
            .prepend_parameter(interface.clone()),
    ))
}

/// The companion form of a static interface method: holder changes, the
/// signature survives untouched.
pub fn as_moved_static(interface: &FieldType, method: &MethodDescriptor) -> Result<MethodRef> {
    Ok(MethodRef::new(companion_of(interface)?, method.clone()))
}

/// The dispatch-class forwarder for a library interface static.
pub fn as_dispatch_forward(interface: &FieldType, method: &MethodDescriptor) -> Result<MethodRef> {
    Ok(MethodRef::new(dispatch_of(interface)?, method.clone()))
}

/// The abstract stub declaration for an emulated virtual retarget.
pub fn as_emulated_stub(holder: &FieldType, method: &MethodDescriptor) -> Result<MethodRef> {
    Ok(MethodRef::new(
        emulated_interface_of(holder)?,
        method.clone(),
    ))
}

/// The dispatch forwarder for an emulated virtual retarget: static, receiver
/// prepended.
pub fn as_emulated_forward(holder: &FieldType, method: &MethodDescriptor) -> Result<MethodRef> {
    Ok(MethodRef::new(
        emulated_dispatch_of(holder)?,
        method.prepend_parameter(holder.clone()),
    ))
}
