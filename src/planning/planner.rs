use alloc::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
    vec,
    vec::Vec,
};
use core::any::TypeId;
use parking_lot::Mutex;
use tracing::{debug, debug_span, error};

use super::{
    ActivationPlan, BehaviorSelectionStrategy, ConstructorSelectionStrategy, InterceptorRegistrationStrategy,
    MemberReflectionStrategy, PlanDraft,
};
use crate::{
    any::TypeInfo,
    binding::{Binding, BindingId},
    errors::ActivationErrorKind,
    kernel::KernelComponents,
    strategy::StrategyResult,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PlanningPhase {
    BeforeBuild,
    Build,
    AfterBuild,
    BeforeRelease,
    Release,
    AfterRelease,
}

/// Step of building and releasing plans. Every phase proceeds by default.
#[allow(unused_variables)]
pub trait PlanningStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    /// Returns an error to abort the build.
    fn before_build(
        &self,
        kernel: &KernelComponents,
        binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to abort the build.
    fn build(
        &self,
        kernel: &KernelComponents,
        binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to abort the build.
    fn after_build(
        &self,
        kernel: &KernelComponents,
        binding: &Binding,
        plan: &mut PlanDraft,
    ) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Errors are logged, releasing goes on.
    fn before_release(&self, kernel: &KernelComponents, plan: &ActivationPlan) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Errors are logged, releasing goes on.
    fn release(&self, kernel: &KernelComponents, plan: &ActivationPlan) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Errors are logged, releasing goes on.
    fn after_release(&self, kernel: &KernelComponents, plan: &ActivationPlan) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }
}

/// Builds activation plans through an ordered chain of strategies and caches them per binding and type.
pub struct Planner {
    strategies: Vec<Arc<dyn PlanningStrategy>>,
    plans: Mutex<BTreeMap<(BindingId, TypeId), Arc<ActivationPlan>>>,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(BehaviorSelectionStrategy),
            Arc::new(ConstructorSelectionStrategy),
            Arc::new(MemberReflectionStrategy),
            Arc::new(InterceptorRegistrationStrategy),
        ])
    }
}

impl Planner {
    #[inline]
    #[must_use]
    pub fn new(strategies: Vec<Arc<dyn PlanningStrategy>>) -> Self {
        Self {
            strategies,
            plans: Mutex::new(BTreeMap::new()),
        }
    }

    #[inline]
    #[must_use]
    pub fn strategies(&self) -> &[Arc<dyn PlanningStrategy>] {
        &self.strategies
    }

    /// Returns the cached plan or builds it. The cache isn't locked while building.
    ///
    /// # Errors
    /// Returns the error of the strategy that failed, nothing is cached then.
    pub fn get_plan(
        &self,
        kernel: &KernelComponents,
        binding: &Binding,
        ty: TypeInfo,
    ) -> Result<Arc<ActivationPlan>, ActivationErrorKind> {
        let key = (binding.id(), ty.id);
        if let Some(plan) = self.plans.lock().get(&key) {
            debug!("Plan found in cache");
            return Ok(plan.clone());
        }

        let plan = Arc::new(self.build(kernel, binding, ty)?);
        match self.plans.lock().entry(key) {
            Entry::Occupied(entry) => {
                debug!("Plan built concurrently, using the cached one");
                Ok(entry.get().clone())
            }
            Entry::Vacant(entry) => {
                debug!("Plan cached");
                Ok(entry.insert(plan).clone())
            }
        }
    }

    /// Builds a plan without caching it.
    ///
    /// # Errors
    /// Returns the error of the strategy that failed.
    pub fn build(&self, kernel: &KernelComponents, binding: &Binding, ty: TypeInfo) -> Result<ActivationPlan, ActivationErrorKind> {
        let span = debug_span!("plan", ty = ty.name, binding = binding.id().0);
        let _guard = span.enter();

        let mut draft = PlanDraft::new(ty, kernel.introspector.describe(&ty));
        self.run_phase(PlanningPhase::BeforeBuild, |strategy| {
            strategy.before_build(kernel, binding, &mut draft)
        })?;
        self.run_phase(PlanningPhase::Build, |strategy| strategy.build(kernel, binding, &mut draft))?;
        self.run_phase(PlanningPhase::AfterBuild, |strategy| {
            strategy.after_build(kernel, binding, &mut draft)
        })?;

        let plan = draft.finish()?;
        debug!(directives = plan.directives.len(), behavior = plan.behavior.name(), "Plan built");
        Ok(plan)
    }

    /// Drops the cached plans of the binding and runs the release phases on each.
    pub fn release_plans(&self, kernel: &KernelComponents, binding: BindingId) {
        let released: Vec<_> = {
            let mut plans = self.plans.lock();
            let keys: Vec<_> = plans.keys().filter(|(id, _)| *id == binding).copied().collect();
            keys.into_iter().filter_map(|key| plans.remove(&key)).collect()
        };
        for plan in released {
            self.release(kernel, &plan);
        }
    }

    pub fn release_all(&self, kernel: &KernelComponents) {
        let released = core::mem::take(&mut *self.plans.lock());
        for plan in released.into_values() {
            self.release(kernel, &plan);
        }
    }

    /// Whether a cached plan activates the type.
    #[must_use]
    pub fn is_planned(&self, ty: TypeId) -> bool {
        self.plans.lock().keys().any(|(_, planned)| *planned == ty)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.plans.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.plans.lock().is_empty()
    }

    fn release(&self, kernel: &KernelComponents, plan: &ActivationPlan) {
        let span = debug_span!("release_plan", ty = plan.ty.name);
        let _guard = span.enter();

        for phase in [PlanningPhase::BeforeRelease, PlanningPhase::Release, PlanningPhase::AfterRelease] {
            let result = self.run_phase(phase, |strategy| match phase {
                PlanningPhase::BeforeRelease => strategy.before_release(kernel, plan),
                PlanningPhase::Release => strategy.release(kernel, plan),
                _ => strategy.after_release(kernel, plan),
            });
            if let Err(err) = result {
                error!("{}", err);
            }
        }
        debug!("Plan released");
    }

    fn run_phase(
        &self,
        phase: PlanningPhase,
        mut step: impl FnMut(&dyn PlanningStrategy) -> Result<StrategyResult, ActivationErrorKind>,
    ) -> Result<(), ActivationErrorKind> {
        for strategy in &self.strategies {
            if step(strategy.as_ref())?.is_stop() {
                debug!(strategy = strategy.name(), ?phase, "Strategy stopped the phase");
                break;
            }
        }
        Ok(())
    }
}
