mod common;

use common::{lantern_descriptor, Journal, Lantern};
use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};
use wiring::{
    ActivationErrorKind, ActivationStrategy, Activator, BehaviorSelectionStrategy, Binding, ConfigurationErrorKind,
    ConstructorInfo, ConstructorSelectionStrategy, Context, DisposableStrategy, InitializableStrategy,
    InterceptorRegistrationStrategy, Kernel, KernelComponents, MemberReflectionStrategy, MethodInjectionStrategy,
    Parameter, PlanDraft, Planner, PlanningStrategy, PropertyInjectionStrategy, ProviderStrategy, StartableStrategy,
    StrategyResult, TypeCatalog, TypeDescriptor,
};

struct SkipInjection;

impl ActivationStrategy for SkipInjection {
    fn name(&self) -> &'static str {
        "skip_injection"
    }

    fn after_create(&self, _context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Stop)
    }
}

/// Stops the build phase before members are reflected, counting the plans that still reach after-build.
struct SkipMembers {
    finished: Arc<AtomicUsize>,
}

impl PlanningStrategy for SkipMembers {
    fn name(&self) -> &'static str {
        "skip_members"
    }

    fn build(
        &self,
        _kernel: &KernelComponents,
        _binding: &Binding,
        _plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Stop)
    }

    fn after_build(
        &self,
        _kernel: &KernelComponents,
        _binding: &Binding,
        _plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(StrategyResult::Proceed)
    }
}

fn lanterns(journal: &Journal) -> wiring::KernelBuilder {
    Kernel::builder()
        .introspector(TypeCatalog::new().with(lantern_descriptor()))
        .bind(Binding::to_constant(journal.clone()))
        .bind(Binding::to_self::<Lantern>().with_parameter(Parameter::method_argument("color", "amber")))
}

#[test]
fn test_activation_stop_skips_rest_of_phase() {
    let journal = Journal::default();
    let kernel = lanterns(&journal)
        .activator(Activator::new(vec![
            Arc::new(ProviderStrategy),
            Arc::new(SkipInjection),
            Arc::new(PropertyInjectionStrategy),
            Arc::new(MethodInjectionStrategy),
            Arc::new(InitializableStrategy),
            Arc::new(StartableStrategy),
            Arc::new(DisposableStrategy),
        ]))
        .build();

    kernel.get::<Lantern>().unwrap();

    assert_eq!(journal.entries(), ["initialize unnamed", "start unnamed"]);
}

#[test]
fn test_planning_stop_skips_rest_of_phase() {
    let journal = Journal::default();
    let finished = Arc::new(AtomicUsize::new(0));
    let kernel = lanterns(&journal)
        .planner(Planner::new(vec![
            Arc::new(BehaviorSelectionStrategy),
            Arc::new(ConstructorSelectionStrategy),
            Arc::new(SkipMembers {
                finished: finished.clone(),
            }),
            Arc::new(MemberReflectionStrategy),
            Arc::new(InterceptorRegistrationStrategy),
        ]))
        .build();

    kernel.get::<Lantern>().unwrap();
    kernel.get::<Lantern>().unwrap();

    assert_eq!(
        journal.entries(),
        ["initialize unnamed", "start unnamed", "initialize unnamed", "start unnamed"]
    );
    // Lantern and its journal, each planned once.
    assert_eq!(finished.load(Ordering::SeqCst), 2);
}

struct Key;

struct Gate {
    opened_by: &'static str,
}

fn keyless() -> ConstructorInfo {
    ConstructorInfo::of(|_| Ok(Gate { opened_by: "hand" }))
}

fn keyed() -> ConstructorInfo {
    ConstructorInfo::of(|_| Ok(Gate { opened_by: "key" })).parameter::<Key>("key")
}

fn gate(constructors: Vec<ConstructorInfo>) -> Kernel {
    let descriptor = constructors
        .into_iter()
        .fold(TypeDescriptor::builder::<Gate>(), |builder, constructor| {
            builder.constructor(constructor)
        })
        .build();
    Kernel::builder()
        .introspector(TypeCatalog::new().with(descriptor))
        .bind(Binding::to_constant(Key))
        .build()
}

#[test]
fn test_marked_constructor_wins() {
    let kernel = gate(vec![keyless(), keyed().injectable()]);

    assert_eq!(kernel.get::<Gate>().unwrap().opened_by, "key");
}

#[test]
fn test_single_constructor_used_without_mark() {
    let kernel = gate(vec![keyed()]);

    assert_eq!(kernel.get::<Gate>().unwrap().opened_by, "key");
}

#[test]
fn test_unmarked_constructors_fall_back_to_parameterless() {
    let kernel = gate(vec![keyed(), keyless()]);

    assert_eq!(kernel.get::<Gate>().unwrap().opened_by, "hand");
}

#[test]
fn test_multiple_marked_constructors() {
    let kernel = gate(vec![keyless().injectable(), keyed().injectable()]);

    assert!(matches!(
        kernel.get::<Gate>(),
        Err(ActivationErrorKind::Configuration(
            ConfigurationErrorKind::MultipleInjectionConstructors { count: 2, .. }
        ))
    ));
}

#[test]
fn test_no_constructor_selectable() {
    let kernel = gate(vec![keyed(), keyed()]);

    assert!(matches!(
        kernel.get::<Gate>(),
        Err(ActivationErrorKind::Configuration(
            ConfigurationErrorKind::NoInjectionConstructor { candidates: 2, .. }
        ))
    ));
    assert!(kernel.planner().is_empty());
}
