use alloc::vec::Vec;
use tracing::{debug, error};

use super::{
    ActivationPlan, Argument, ConstructorDirective, Directive, MemberDirective, MethodDirective, PlanDraft,
    PlanningStrategy,
};
use crate::{
    any::TypeInfo,
    binding::Binding,
    errors::{ActivationErrorKind, ConfigurationErrorKind},
    interception::MethodId,
    introspection::{ConstructorInfo, ParameterInfo},
    kernel::KernelComponents,
    request::{Target, TargetKind},
    strategy::StrategyResult,
};

/// The behavior of the binding wins, then the marker on the type, then the configured default.
#[derive(Clone, Copy, Debug, Default)]
pub struct BehaviorSelectionStrategy;

impl PlanningStrategy for BehaviorSelectionStrategy {
    fn name(&self) -> &'static str {
        "behavior_selection"
    }

    fn build(
        &self,
        kernel: &KernelComponents,
        binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        let behavior = match binding.behavior() {
            Some(behavior) => behavior.clone(),
            None => plan
                .descriptor
                .as_ref()
                .and_then(|descriptor| descriptor.behavior)
                .unwrap_or(kernel.config.default_behavior)
                .create(),
        };
        debug!(behavior = behavior.name(), "Behavior selected");
        plan.behavior = Some(behavior);
        Ok(StrategyResult::Proceed)
    }
}

/// Selects the one constructor the provider calls.
///
/// A single constructor marked for injection is used. Without marks, a single candidate is used,
/// otherwise the heuristic may pick one, otherwise the parameterless one is used.
#[derive(Clone, Copy, Debug, Default)]
pub struct ConstructorSelectionStrategy;

impl ConstructorSelectionStrategy {
    fn select<'a>(
        kernel: &KernelComponents,
        ty: TypeInfo,
        candidates: &[&'a ConstructorInfo],
    ) -> Result<&'a ConstructorInfo, ConfigurationErrorKind> {
        let marked: Vec<_> = candidates
            .iter()
            .copied()
            .filter(|constructor| constructor.markers.inject)
            .collect();
        match marked.len() {
            0 => {}
            1 => return Ok(marked[0]),
            count => return Err(ConfigurationErrorKind::MultipleInjectionConstructors { ty, count }),
        }

        if let [single] = candidates {
            return Ok(*single);
        }

        kernel
            .heuristic
            .select_constructor(candidates)
            .or_else(|| {
                candidates
                    .iter()
                    .find(|constructor| constructor.parameters.is_empty())
                    .copied()
            })
            .ok_or(ConfigurationErrorKind::NoInjectionConstructor {
                ty,
                candidates: candidates.len(),
            })
    }
}

impl PlanningStrategy for ConstructorSelectionStrategy {
    fn name(&self) -> &'static str {
        "constructor_selection"
    }

    fn build(
        &self,
        kernel: &KernelComponents,
        binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        if !binding.provider().is_some_and(|provider| provider.uses_constructor()) {
            return Ok(StrategyResult::Proceed);
        }
        let Some(descriptor) = plan.descriptor.clone() else {
            return Ok(StrategyResult::Proceed);
        };

        let candidates: Vec<_> = descriptor.constructors(kernel.config.inject_non_public).collect();
        if candidates.is_empty() {
            return Ok(StrategyResult::Proceed);
        }

        let constructor = Self::select(kernel, plan.ty, &candidates).map_err(|err| {
            error!("{}", err);
            err
        })?;
        let arguments = arguments(kernel, plan.ty, &constructor.parameters);
        debug!(arguments = arguments.len(), "Constructor selected");

        plan.add(Directive::Constructor(ConstructorDirective {
            constructor: constructor.clone(),
            arguments,
        }));
        Ok(StrategyResult::Proceed)
    }
}

/// Adds a directive for every property, field and method the heuristic accepts.
#[derive(Clone, Copy, Debug, Default)]
pub struct MemberReflectionStrategy;

impl PlanningStrategy for MemberReflectionStrategy {
    fn name(&self) -> &'static str {
        "member_reflection"
    }

    fn build(
        &self,
        kernel: &KernelComponents,
        _binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        let Some(descriptor) = plan.descriptor.clone() else {
            return Ok(StrategyResult::Proceed);
        };
        let non_public = kernel.config.inject_non_public;
        let heuristic = &kernel.heuristic;

        for property in descriptor
            .properties(non_public)
            .filter(|property| heuristic.should_inject_member(property))
        {
            let target = Target::from_member(plan.ty, TargetKind::Property, property);
            plan.add(Directive::Property(MemberDirective {
                member: property.clone(),
                argument: argument(kernel, target),
            }));
        }

        for field in descriptor.fields(non_public).filter(|field| heuristic.should_inject_member(field)) {
            let target = Target::from_member(plan.ty, TargetKind::Field, field);
            plan.add(Directive::Field(MemberDirective {
                member: field.clone(),
                argument: argument(kernel, target),
            }));
        }

        for method in descriptor.methods(non_public).filter(|method| heuristic.should_inject_method(method)) {
            let Some(injector) = method.injector.clone() else {
                let err = ConfigurationErrorKind::NoMethodInjector {
                    ty: plan.ty,
                    method: method.name,
                };
                error!("{}", err);
                return Err(err.into());
            };
            plan.add(Directive::Method(MethodDirective {
                method: method.clone(),
                injector,
                arguments: arguments(kernel, plan.ty, &method.parameters),
            }));
        }

        Ok(StrategyResult::Proceed)
    }
}

/// Turns interception markers into advice and marks the plan for proxying.
#[derive(Clone, Copy, Debug, Default)]
pub struct InterceptorRegistrationStrategy;

impl PlanningStrategy for InterceptorRegistrationStrategy {
    fn name(&self) -> &'static str {
        "interceptor_registration"
    }

    fn build(
        &self,
        kernel: &KernelComponents,
        _binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        let Some(descriptor) = plan.descriptor.clone() else {
            return Ok(StrategyResult::Proceed);
        };
        if !descriptor.is_intercepted() {
            return Ok(StrategyResult::Proceed);
        }

        if kernel.advice.mark_advised(plan.ty.id) {
            for method in &descriptor.methods {
                let id = MethodId {
                    declaring: plan.ty,
                    name: method.name,
                };
                for marker in descriptor.interceptors.iter().chain(&method.markers.interceptors) {
                    kernel
                        .advice
                        .register_declared(marker.factory.clone(), marker.order, id, plan.ty.id);
                }
            }
            debug!("Declared interceptors registered");
        }

        plan.add(Directive::Proxy);
        Ok(StrategyResult::Proceed)
    }

    fn release(&self, kernel: &KernelComponents, plan: &ActivationPlan) -> Result<StrategyResult, ActivationErrorKind> {
        if plan.directives.has_proxy() && !kernel.planner.is_planned(plan.ty.id) {
            kernel.advice.release_declared(plan.ty.id);
            debug!("Declared interceptors released");
        }
        Ok(StrategyResult::Proceed)
    }
}

fn argument(kernel: &KernelComponents, target: Target) -> Argument {
    let resolver = kernel.resolvers.create(kernel, &target);
    Argument::new(target, resolver)
}

fn arguments(kernel: &KernelComponents, declaring: TypeInfo, parameters: &[ParameterInfo]) -> Vec<Argument> {
    parameters
        .iter()
        .map(|parameter| argument(kernel, Target::from_parameter(declaring, parameter)))
        .collect()
}
