mod common;

use common::{catalog, lantern, lantern_descriptor, Journal, Lantern};
use std::{
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    thread,
};
use wiring::{
    ActivationErrorKind, Binding, ConfigurationErrorKind, ConstructorInfo, InterceptMarker, Interceptor, Invocation,
    Kernel, OperationalErrorKind, Parameter, Parameters, TypeCatalog, TypeDescriptor,
};

struct Beacon {
    lantern: Arc<Lantern>,
}

fn beacon(dry: Arc<AtomicBool>) -> TypeDescriptor {
    TypeDescriptor::builder::<Beacon>()
        .constructor(
            ConstructorInfo::of(move |arguments| {
                if !dry.load(Ordering::SeqCst) {
                    anyhow::bail!("the beacon is damp");
                }
                Ok(Beacon {
                    lantern: arguments.get::<Lantern>(0)?,
                })
            })
            .parameter::<Lantern>("lantern"),
        )
        .build()
}

fn types() -> TypeCatalog {
    catalog().with(lantern_descriptor())
}

fn kernel_with(journal: &Journal, types: TypeCatalog) -> Kernel {
    Kernel::builder()
        .introspector(types)
        .bind(Binding::to_constant(journal.clone()))
        .bind(Binding::to_self::<Lantern>().with_parameter(Parameter::method_argument("color", "amber")))
        .build()
}

fn kernel(journal: &Journal) -> Kernel {
    kernel_with(journal, types())
}

fn named(name: &str) -> Parameters {
    Parameters::new().with(Parameter::property_value("name", String::from(name)))
}

#[test]
fn test_dispose_cascades_to_children() {
    let journal = Journal::default();
    let kernel = kernel(&journal);
    let parent = kernel.begin_scope().unwrap();
    let child = parent.begin_scope().unwrap();

    parent.get_with::<Lantern>(named("outer")).unwrap();
    child.get_with::<Lantern>(named("inner")).unwrap();
    assert_eq!(parent.len(), 1);
    assert_eq!(child.len(), 1);

    parent.dispose().unwrap();

    assert!(child.is_disposed());
    assert_eq!(
        journal.entries(),
        [
            "light outer amber",
            "initialize outer",
            "start outer",
            "light inner amber",
            "initialize inner",
            "start inner",
            "stop inner",
            "dispose inner",
            "stop outer",
            "dispose outer",
        ]
    );
    assert!(matches!(
        child.get::<Lantern>(),
        Err(ActivationErrorKind::Operational(OperationalErrorKind::ScopeDisposed { .. }))
    ));
    assert!(matches!(
        parent.begin_scope(),
        Err(OperationalErrorKind::ScopeDisposed { .. })
    ));
    assert!(parent.dispose().is_ok());
}

#[test]
fn test_scope_disposed_on_drop() {
    let journal = Journal::default();
    let kernel = kernel(&journal);

    {
        let scope = kernel.begin_scope().unwrap();
        scope.get_with::<Lantern>(named("short")).unwrap();
    }

    assert_eq!(journal.entries().last().map(String::as_str), Some("dispose short"));
}

#[test]
fn test_release_instance() {
    let journal = Journal::default();
    let kernel = kernel(&journal);
    let scope = kernel.begin_scope().unwrap();
    let lantern = scope.get_with::<Lantern>(named("lamp")).unwrap();

    kernel.release(&lantern).unwrap();

    assert!(scope.is_empty());
    assert_eq!(journal.entries().last().map(String::as_str), Some("dispose lamp"));
    assert!(matches!(
        kernel.release(&lantern),
        Err(ActivationErrorKind::Operational(OperationalErrorKind::InstanceNotTracked { .. }))
    ));
}

#[test]
fn test_tracked_scopes() {
    let journal = Journal::default();
    let kernel = kernel(&journal);
    let scope = kernel.begin_tracked_scope("request-1").unwrap();
    scope.get_with::<Lantern>(named("request")).unwrap();

    assert!(matches!(
        kernel.begin_tracked_scope("request-1"),
        Err(OperationalErrorKind::DuplicateScopeKey { .. })
    ));

    kernel.release_scope_with_key("request-1").unwrap();
    assert!(scope.is_disposed());
    assert_eq!(journal.entries().last().map(String::as_str), Some("dispose request"));

    assert!(matches!(
        kernel.release_scope_with_key("request-1"),
        Err(ActivationErrorKind::Operational(OperationalErrorKind::UnknownScopeKey { .. }))
    ));
}

#[test]
fn test_kernel_dispose() {
    let journal = Journal::default();
    let kernel = kernel(&journal);
    let tracked = kernel.begin_tracked_scope("session").unwrap();
    tracked.get_with::<Lantern>(named("session")).unwrap();
    kernel.get_with::<Lantern>(named("root")).unwrap();

    kernel.dispose().unwrap();

    assert!(kernel.is_disposed());
    assert!(tracked.is_disposed());
    assert!(kernel.root_scope().is_disposed());
    let entries = journal.entries();
    assert_eq!(
        entries[entries.len() - 4..],
        ["stop session", "dispose session", "stop root", "dispose root"]
    );
    assert!(matches!(
        kernel.get::<Lantern>(),
        Err(ActivationErrorKind::Operational(OperationalErrorKind::KernelDisposed))
    ));
    assert!(kernel.bindings().get_services().is_empty());
}

#[test]
fn test_kernel_disposed_on_last_drop() {
    let journal = Journal::default();
    let kernel = kernel(&journal);
    let handle = kernel.clone();
    kernel.get_with::<Lantern>(named("kept")).unwrap();

    drop(kernel);
    assert!(!journal.entries().contains(&String::from("dispose kept")));

    drop(handle);
    assert_eq!(journal.entries().last().map(String::as_str), Some("dispose kept"));
}

#[test]
fn test_transients_tracked_per_activation() {
    let journal = Journal::default();
    let kernel = kernel(&journal);
    let scope = kernel.begin_scope().unwrap();

    let first = scope.get::<Lantern>().unwrap();
    let second = scope.get::<Lantern>().unwrap();

    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(scope.len(), 2);
}

#[test]
fn test_failed_activation_stops_started_instance() {
    let journal = Journal::default();
    let pass: Arc<dyn Interceptor> = Arc::new(|invocation: &mut Invocation<'_>| invocation.proceed());
    let guarded = lantern().intercepted(InterceptMarker::shared(pass, 1)).build();
    let kernel = kernel_with(&journal, catalog().with(guarded));

    assert!(matches!(
        kernel.get_with::<Lantern>(named("lost")),
        Err(ActivationErrorKind::Configuration(
            ConfigurationErrorKind::MissingProxyFactory { .. }
        ))
    ));
    assert_eq!(
        journal.entries(),
        ["light lost amber", "initialize lost", "start lost", "stop lost", "dispose lost"]
    );
    assert!(kernel.root_scope().is_empty());

    kernel.dispose().unwrap();
    assert_eq!(journal.entries().len(), 5);
}

#[test]
fn test_failed_activation_keeps_plans_and_tracked_dependencies() {
    let journal = Journal::default();
    let dry = Arc::new(AtomicBool::new(false));
    let kernel = kernel_with(&journal, types().with(beacon(dry.clone())));
    let scope = kernel.begin_scope().unwrap();

    let Err(err) = scope.get::<Beacon>() else {
        panic!("a damp beacon was lit");
    };
    assert_eq!(err.invocation_error().map(ToString::to_string).as_deref(), Some("the beacon is damp"));
    let plans = kernel.planner().len();
    assert_eq!(scope.len(), 1);

    dry.store(true, Ordering::SeqCst);
    let beacon = scope.get::<Beacon>().unwrap();
    assert_eq!(kernel.planner().len(), plans);
    assert_eq!(scope.len(), 2);

    scope.dispose().unwrap();
    let entries = journal.entries();
    assert_eq!(entries.iter().filter(|entry| *entry == "dispose unnamed").count(), 2);
    assert_eq!(beacon.lantern.name.lock().as_str(), "unnamed");
}

#[test]
fn test_tracked_scope_key_taken_once() {
    let journal = Journal::default();
    let kernel = kernel(&journal);

    let tracked: Vec<_> = thread::scope(|threads| {
        let handles: Vec<_> = (0..8)
            .map(|_| threads.spawn(|| kernel.begin_tracked_scope("shared")))
            .collect();
        handles.into_iter().filter_map(|handle| handle.join().ok()).collect()
    });

    let (accepted, rejected): (Vec<_>, Vec<_>) = tracked.into_iter().partition(Result::is_ok);
    assert_eq!(accepted.len(), 1);
    assert!(rejected
        .iter()
        .all(|result| matches!(result, Err(OperationalErrorKind::DuplicateScopeKey { .. }))));

    kernel.release_scope_with_key("shared").unwrap();
    assert!(accepted.iter().flatten().all(wiring::Scope::is_disposed));
}
