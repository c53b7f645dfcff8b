use std::sync::{atomic::AtomicBool, Arc};

use desugar::{
    error::Diagnostics,
    lens::{InterfaceLens, LensChain},
    naming,
    plan::{NothingPinned, PinnedOracle},
    DesugarOptions,
};
use model::{class::ClassDef, repo::ClassRepo};
use support::descriptor::FieldType;

lazy_static::lazy_static! {
    static ref TRACING: () = {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    };
}

pub fn setup() {
    lazy_static::initialize(&TRACING);
}

pub fn desugar(repo: &mut ClassRepo) -> Arc<InterfaceLens> {
    desugar_with(repo, &DesugarOptions::default())
}

pub fn desugar_with(repo: &mut ClassRepo, options: &DesugarOptions) -> Arc<InterfaceLens> {
    desugar_pinned(repo, options, &NothingPinned)
}

pub fn desugar_pinned(
    repo: &mut ClassRepo,
    options: &DesugarOptions,
    pinned: &dyn PinnedOracle,
) -> Arc<InterfaceLens> {
    setup();

    let diagnostics = Diagnostics::new();
    let chain = desugar::run(
        repo,
        options,
        pinned,
        LensChain::empty(),
        &AtomicBool::new(false),
        &diagnostics,
    )
    .expect("desugaring failed");

    Arc::clone(chain.find().expect("no lens on the chain"))
}

/// Runs a program that is expected to fail and hands back what was reported.
pub fn desugar_expecting_failure(repo: &mut ClassRepo, options: &DesugarOptions) -> Diagnostics {
    setup();

    let diagnostics = Diagnostics::new();
    let result = desugar::run(
        repo,
        options,
        &NothingPinned,
        LensChain::empty(),
        &AtomicBool::new(false),
        &diagnostics,
    );

    assert!(result.is_err(), "desugaring unexpectedly succeeded");
    diagnostics
}

pub fn class<'r>(repo: &'r ClassRepo, name: &str) -> &'r ClassDef {
    &repo
        .get(&FieldType::object(name))
        .unwrap_or_else(|| panic!("{} is not in the repository", name))
        .def
}

pub fn companion<'r>(repo: &'r ClassRepo, interface: &str) -> &'r ClassDef {
    class(repo, &format!("{}{}", interface, naming::COMPANION_SUFFIX))
}

pub fn has_class(repo: &ClassRepo, name: &str) -> bool {
    repo.get(&FieldType::object(name)).is_some()
}

pub fn assert_sole_abstract(def: &ClassDef, name: &str) {
    let matches: Vec<_> = def
        .virtual_methods
        .iter()
        .filter(|m| m.descriptor.name() == name)
        .collect();

    assert_eq!(matches.len(), 1, "{} declares {} more than once", def.ty, name);
    assert!(matches[0].is_abstract(), "{}.{} is not abstract", def.ty, name);
    assert!(matches[0].code.is_none(), "{}.{} kept its body", def.ty, name);
}
