//! access flag sets for classes, methods and fields
//! the wrapper struct generated by `impl_flags!` owns flag reads and the
//! edits the desugaring passes make to program definitions

use bitflags::bitflags;
use tracing::warn;

macro_rules! impl_flags {
    ( $flag_type:ident, $impl_type:ident ) => {
        #[derive(Clone, Debug, PartialEq, Eq)]
        pub struct $impl_type {
            pub flags: $flag_type,
        }

        impl $impl_type {
            pub fn from_bits(raw: u16) -> Self {
                let flags = <$flag_type>::from_bits(raw).unwrap_or_else(|| {
                    warn!("unrecognised bits {:b} for {}", raw, stringify!($flag_type));
                    <$flag_type>::from_bits_truncate(raw)
                });

                Self { flags }
            }

            pub fn empty() -> Self {
                Self {
                    flags: <$flag_type>::empty(),
                }
            }

            pub fn has(&self, other: $flag_type) -> bool {
                self.flags.contains(other)
            }

            pub fn add(&mut self, other: $flag_type) -> &mut Self {
                self.flags.insert(other);
                self
            }

            pub fn remove(&mut self, other: $flag_type) -> &mut Self {
                self.flags.remove(other);
                self
            }
        }

        impl From<$flag_type> for $impl_type {
            fn from(flags: $flag_type) -> Self {
                Self { flags }
            }
        }
    };
}

bitflags! {
    pub struct ClassAccessFlag: u16 {
         const PUBLIC = 0x0001;
         const FINAL = 0x0010;
         const SUPER = 0x0020;
         const INTERFACE = 0x0200;
         const ABSTRACT = 0x0400;
         const SYNTHETIC = 0x1000;
         const ANNOTATION = 0x2000;
         const ENUM = 0x4000;
         const MODULE = 0x8000;
    }
}

bitflags! {
    pub struct MethodAccessFlag: u16 {
         const PUBLIC = 0x0001;
         const PRIVATE = 0x0002;
         const PROTECTED = 0x0004;
         const STATIC = 0x0008;
         const FINAL = 0x0010;
         const SYNCHRONIZED = 0x0020;
         const BRIDGE = 0x0040;
         const VARARGS = 0x0080;
         const NATIVE = 0x0100;
         const ABSTRACT = 0x0400;
         const STRICT_FP = 0x0800;
         const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    pub struct FieldAccessFlag: u16 {
         const PUBLIC = 0x0001;
         const PRIVATE = 0x0002;
         const PROTECTED = 0x0004;
         const STATIC = 0x0008;
         const FINAL = 0x0010;
         const VOLATILE = 0x0040;
         const SYNTHETIC = 0x1000;
         const ENUM = 0x4000;
    }
}

impl_flags!(MethodAccessFlag, MethodAccessFlags);
impl_flags!(ClassAccessFlag, ClassAccessFlags);
impl_flags!(FieldAccessFlag, FieldAccessFlags);
