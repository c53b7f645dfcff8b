//! Call-site rewriting. Purely mechanical: every program body is pushed
//! through the lens, no resolution involved. Bodies the lens does not touch
//! keep their shared allocation.

use std::sync::Arc;

use anyhow::Result;
use model::{code::Code, repo::ClassRepo};
use support::descriptor::FieldType;
use tracing::debug;

use crate::{lens::InterfaceLens, naming};

pub fn rewrite_program(repo: &mut ClassRepo, lens: &InterfaceLens) -> Result<usize> {
    if lens.is_empty() {
        return Ok(0);
    }

    let types: Vec<FieldType> = repo
        .program_classes()
        .iter()
        .map(|def| def.ty.clone())
        // Dispatch classes hold nothing but forwarder thunks whose whole job
        // is to call the original; pushing those through the lens would turn
        // them into self-calls.
        .filter(|ty| {
            naming::interface_of_dispatch(ty).is_none()
                && !ty
                    .class_name()
                    .is_some_and(|name| name.ends_with(naming::EMULATED_DISPATCH_SUFFIX))
        })
        .collect();

    let mut rewritten = 0usize;
    for ty in types {
        let mut touched = 0usize;

        repo.replace(&ty, |def| {
            for method in def
                .direct_methods
                .iter_mut()
                .chain(def.virtual_methods.iter_mut())
            {
                let Some(code) = method.code.as_ref() else {
                    continue;
                };

                let mapped = code.body.map_invocations(&|kind, target| {
                    lens.lookup_method(target, None, kind)
                        .map(|(to, new_kind)| (new_kind, (*to).clone()))
                });
                let debug_info = code.debug.clone();

                if let Some(body) = mapped {
                    method.code = Some(Code {
                        body: Arc::new(body),
                        debug: debug_info,
                    });
                    touched += 1;
                }
            }
        })?;

        if touched > 0 {
            debug!("rewrote {} body(ies) in {}", touched, ty);
            rewritten += touched;
        }
    }

    Ok(rewritten)
}
