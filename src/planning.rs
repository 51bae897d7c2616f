mod directive;
mod heuristic;
mod plan;
mod planner;
mod strategies;

pub use directive::{
    Argument, ConstructorDirective, Directive, DirectiveCollection, DirectiveKey, MemberDirective, MethodDirective,
};
pub use heuristic::{InjectionHeuristic, StandardInjectionHeuristic};
pub use plan::{ActivationPlan, PlanDraft};
pub use planner::{Planner, PlanningPhase, PlanningStrategy};
pub use strategies::{
    BehaviorSelectionStrategy, ConstructorSelectionStrategy, InterceptorRegistrationStrategy, MemberReflectionStrategy,
};
