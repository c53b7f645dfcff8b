use std::fmt;

use model::class::{MethodRef, Origin};
use parking_lot::Mutex;
use support::{descriptor::FieldType, types::MethodDescriptor};
use thiserror::Error;
use tracing::error;

#[derive(Error, Debug)]
pub enum DesugarError {
    #[error("default method {method} cannot be moved, its body calls super into {target}")]
    UnmovableDefault { method: MethodRef, target: MethodRef },

    #[error("default method {method} has no body")]
    DefaultWithoutBody { method: MethodRef },

    #[error("native interface method {method} is not yet implemented")]
    NativeNotSupported { method: MethodRef },

    #[error("companion methods of {interface} collide on {descriptor}")]
    CompanionNameCollision {
        interface: FieldType,
        descriptor: MethodDescriptor,
    },

    #[error("static interface method {method} must be public or private")]
    MalformedStaticVisibility { method: MethodRef },

    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

#[macro_export]
macro_rules! internal {
    ($msg:literal $(,)?) => {
        $crate::error::DesugarError::Internal(anyhow::anyhow!($msg))
    };
    ($err:expr $(,)?) => {
        $crate::error::DesugarError::Internal(anyhow::anyhow!($err))
    };
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::DesugarError::Internal(anyhow::anyhow!($fmt, $($arg)*))
    };
}

/// A fatal report tied back to where the offending class came from.
#[derive(Debug)]
pub struct Diagnostic {
    pub origin: Origin,
    pub error: DesugarError,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.origin, self.error)
    }
}

/// Host-owned sink for fatal reports. Planning is parallel, so reporting has
/// to be too; an interface that errors stops, the run keeps going and fails
/// at the end.
#[derive(Default)]
pub struct Diagnostics {
    reports: Mutex<Vec<Diagnostic>>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&self, origin: Origin, err: DesugarError) {
        error!("{}: {}", origin, err);
        self.reports.lock().push(Diagnostic { origin, error: err });
    }

    pub fn len(&self) -> usize {
        self.reports.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.lock().is_empty()
    }

    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(&mut *self.reports.lock())
    }
}
