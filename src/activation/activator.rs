use alloc::{sync::Arc, vec, vec::Vec};
use tracing::{debug, debug_span, error};

use super::{
    DisposableStrategy, FieldInjectionStrategy, InitializableStrategy, MethodInjectionStrategy,
    PropertyInjectionStrategy, ProviderStrategy, ProxyStrategy, StartableStrategy,
};
use crate::{context::Context, errors::ActivationErrorKind, strategy::StrategyResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ActivationPhase {
    BeforeCreate,
    Create,
    AfterCreate,
    Initialize,
    AfterInitialize,
    BeforeDestroy,
    AfterDestroy,
}

impl ActivationPhase {
    pub const ACTIVATION: [Self; 5] = [
        Self::BeforeCreate,
        Self::Create,
        Self::AfterCreate,
        Self::Initialize,
        Self::AfterInitialize,
    ];
    pub const DESTRUCTION: [Self; 2] = [Self::BeforeDestroy, Self::AfterDestroy];
}

/// Step of the activation pipeline. Every phase proceeds by default.
#[allow(unused_variables)]
pub trait ActivationStrategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// # Errors
    /// Returns an error to abort the activation.
    fn before_create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to abort the activation.
    fn create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to abort the activation.
    fn after_create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to abort the activation.
    fn initialize(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to abort the activation.
    fn after_initialize(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to report, destruction goes on.
    fn before_destroy(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }

    /// # Errors
    /// Returns an error to report.
    fn after_destroy(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        Ok(StrategyResult::Proceed)
    }
}

fn dispatch(
    strategy: &dyn ActivationStrategy,
    phase: ActivationPhase,
    context: &Context,
) -> Result<StrategyResult, ActivationErrorKind> {
    match phase {
        ActivationPhase::BeforeCreate => strategy.before_create(context),
        ActivationPhase::Create => strategy.create(context),
        ActivationPhase::AfterCreate => strategy.after_create(context),
        ActivationPhase::Initialize => strategy.initialize(context),
        ActivationPhase::AfterInitialize => strategy.after_initialize(context),
        ActivationPhase::BeforeDestroy => strategy.before_destroy(context),
        ActivationPhase::AfterDestroy => strategy.after_destroy(context),
    }
}

/// Runs the activation strategies, in registration order, through the phases of a context.
pub struct Activator {
    strategies: Vec<Arc<dyn ActivationStrategy>>,
}

impl Default for Activator {
    fn default() -> Self {
        Self::new(vec![
            Arc::new(ProviderStrategy),
            Arc::new(FieldInjectionStrategy),
            Arc::new(PropertyInjectionStrategy),
            Arc::new(MethodInjectionStrategy),
            Arc::new(InitializableStrategy),
            Arc::new(StartableStrategy),
            Arc::new(ProxyStrategy),
            Arc::new(DisposableStrategy),
        ])
    }
}

impl Activator {
    #[inline]
    #[must_use]
    pub fn new(strategies: Vec<Arc<dyn ActivationStrategy>>) -> Self {
        Self { strategies }
    }

    #[inline]
    #[must_use]
    pub fn strategies(&self) -> &[Arc<dyn ActivationStrategy>] {
        &self.strategies
    }

    /// Creates, injects and initializes the instance of the context.
    /// An instance already set on the context is injected and initialized only.
    ///
    /// If a phase fails after the instance was created, the destroy phases run on it,
    /// so nothing started by the failed attempt is left behind.
    ///
    /// # Errors
    /// Returns the first error, the remaining strategies aren't run.
    pub fn activate(&self, context: &Context) -> Result<(), ActivationErrorKind> {
        let span = debug_span!("activate", ty = context.implementation().name);
        let _guard = span.enter();

        for phase in ActivationPhase::ACTIVATION {
            if let Err(err) = self.run_phase(phase, context) {
                if context.instance().is_some() && !context.is_injected() {
                    debug!(?phase, "Activation failed, destroying the created instance");
                    // The activation error is the one reported.
                    let _ = self.destroy(context);
                }
                return Err(err);
            }
        }
        debug!("Activated");
        Ok(())
    }

    /// Runs the destroy phases. Both phases run even if the first fails.
    ///
    /// # Errors
    /// Returns the first error.
    pub fn destroy(&self, context: &Context) -> Result<(), ActivationErrorKind> {
        let span = debug_span!("destroy", ty = context.implementation().name);
        let _guard = span.enter();

        let mut result = Ok(());
        for phase in ActivationPhase::DESTRUCTION {
            if let Err(err) = self.run_phase(phase, context) {
                error!("{}", err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        debug!("Destroyed");
        result
    }

    fn run_phase(&self, phase: ActivationPhase, context: &Context) -> Result<(), ActivationErrorKind> {
        for strategy in &self.strategies {
            if dispatch(strategy.as_ref(), phase, context)?.is_stop() {
                debug!(strategy = strategy.name(), ?phase, "Strategy stopped the phase");
                break;
            }
        }
        Ok(())
    }
}
