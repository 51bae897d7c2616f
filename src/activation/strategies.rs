use tracing::{debug, error};

use super::{resolve_argument, resolve_arguments, ActivationStrategy};
use crate::{
    any::Instance,
    context::Context,
    errors::{ActivationErrorKind, ConfigurationErrorKind},
    introspection::Arguments,
    lifecycle::{Hook, Lifecycle},
    parameters::ParameterKind,
    strategy::StrategyResult,
};

fn raw_instance(context: &Context) -> Result<Instance, ActivationErrorKind> {
    context.instance().ok_or_else(|| ActivationErrorKind::Strategy {
        context: context.describe(),
        source: anyhow::anyhow!("no instance has been created"),
    })
}

fn lifecycle(context: &Context) -> Option<&Lifecycle> {
    context.plan().descriptor.as_ref().map(|descriptor| &descriptor.lifecycle)
}

/// Wraps a failure of non-injection user code with the context it happened in.
fn strategy_error(context: &Context, source: anyhow::Error) -> ActivationErrorKind {
    let err = ActivationErrorKind::Strategy {
        context: context.describe(),
        source,
    };
    error!("{}", err);
    err
}

fn invocation_error(err: anyhow::Error) -> ActivationErrorKind {
    error!("{}", err);
    ActivationErrorKind::Invocation(err)
}

fn run_hook(context: &Context, hook: Option<&Hook>) -> Result<StrategyResult, ActivationErrorKind> {
    if let Some(hook) = hook {
        let instance = raw_instance(context)?;
        hook(&instance).map_err(|err| strategy_error(context, err))?;
    }
    Ok(StrategyResult::Proceed)
}

/// Creates the instance with the provider of the binding, unless the context already has one.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProviderStrategy;

impl ActivationStrategy for ProviderStrategy {
    fn name(&self) -> &'static str {
        "provider"
    }

    fn create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        if context.instance().is_some() {
            debug!("Instance already exists");
            return Ok(StrategyResult::Proceed);
        }

        let Some(provider) = context.binding().provider() else {
            let err = ConfigurationErrorKind::NoProvider {
                service: context.binding().service(),
            };
            error!("{}", err);
            return Err(err.into());
        };

        let instance = provider.create(context)?;
        context.set_instance(instance);
        debug!(provider = provider.name(), "Instance created");
        Ok(StrategyResult::Proceed)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct FieldInjectionStrategy;

impl ActivationStrategy for FieldInjectionStrategy {
    fn name(&self) -> &'static str {
        "field_injection"
    }

    fn after_create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        let plan = context.plan().clone();
        let mut fields = plan.directives.fields().peekable();
        if fields.peek().is_none() {
            return Ok(StrategyResult::Proceed);
        }

        let instance = raw_instance(context)?;
        for directive in fields {
            if let Some(value) = resolve_argument(context, ParameterKind::FieldValue, &directive.argument)? {
                (directive.member.setter)(&instance, value).map_err(invocation_error)?;
                debug!(field = directive.member.name, "Field injected");
            }
        }
        Ok(StrategyResult::Proceed)
    }
}

/// Injects properties, remembering each value for the instance so injecting it again restores them.
#[derive(Clone, Copy, Debug, Default)]
pub struct PropertyInjectionStrategy;

impl ActivationStrategy for PropertyInjectionStrategy {
    fn name(&self) -> &'static str {
        "property_injection"
    }

    fn after_create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        let plan = context.plan().clone();
        let mut properties = plan.directives.properties().peekable();
        if properties.peek().is_none() {
            return Ok(StrategyResult::Proceed);
        }

        let instance = raw_instance(context)?;
        for directive in properties {
            if let Some(value) = resolve_argument(context, ParameterKind::PropertyValue, &directive.argument)? {
                context
                    .kernel()
                    .property_values
                    .insert(&instance, directive.member.name, value.clone());
                (directive.member.setter)(&instance, value).map_err(invocation_error)?;
                debug!(property = directive.member.name, "Property injected");
            }
        }
        Ok(StrategyResult::Proceed)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct MethodInjectionStrategy;

impl ActivationStrategy for MethodInjectionStrategy {
    fn name(&self) -> &'static str {
        "method_injection"
    }

    fn after_create(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        let plan = context.plan().clone();
        let mut methods = plan.directives.methods().peekable();
        if methods.peek().is_none() {
            return Ok(StrategyResult::Proceed);
        }

        let instance = raw_instance(context)?;
        for directive in methods {
            let values = resolve_arguments(context, ParameterKind::MethodArgument, &directive.arguments)?;
            (directive.injector)(&instance, Arguments::new(values)).map_err(invocation_error)?;
            debug!(method = directive.method.name, "Method injected");
        }
        Ok(StrategyResult::Proceed)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct InitializableStrategy;

impl ActivationStrategy for InitializableStrategy {
    fn name(&self) -> &'static str {
        "initializable"
    }

    fn initialize(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        run_hook(context, lifecycle(context).and_then(|lifecycle| lifecycle.initialize.as_ref()))
    }
}

/// Starts after initialization and stops before destruction. Started instances are tracked.
#[derive(Clone, Copy, Debug, Default)]
pub struct StartableStrategy;

impl ActivationStrategy for StartableStrategy {
    fn name(&self) -> &'static str {
        "startable"
    }

    fn after_initialize(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        let Some(start) = lifecycle(context).and_then(|lifecycle| lifecycle.start.as_ref()) else {
            return Ok(StrategyResult::Proceed);
        };
        run_hook(context, Some(start))?;
        context.set_started(true);
        context.mark_tracked();
        debug!("Started");
        Ok(StrategyResult::Proceed)
    }

    fn before_destroy(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        if !context.is_started() {
            return Ok(StrategyResult::Proceed);
        }
        run_hook(context, lifecycle(context).and_then(|lifecycle| lifecycle.stop.as_ref()))?;
        context.set_started(false);
        Ok(StrategyResult::Proceed)
    }
}

/// Wraps the instance in a proxy when the plan asks for it or dynamic interceptors are registered.
///
/// Without a proxy factory, a plan asking for a proxy fails and dynamic interceptors are ignored.
/// Instances passed to [`crate::Kernel::inject`] stay unwrapped, the caller keeps the raw instance.
#[derive(Clone, Copy, Debug, Default)]
pub struct ProxyStrategy;

impl ActivationStrategy for ProxyStrategy {
    fn name(&self) -> &'static str {
        "proxy"
    }

    fn after_initialize(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        if context.is_injected() {
            return Ok(StrategyResult::Proceed);
        }

        let kernel = context.kernel();
        let required = context.plan().directives.has_proxy();
        if !required && !kernel.advice.has_dynamic() {
            return Ok(StrategyResult::Proceed);
        }

        let Some(factory) = &kernel.proxy_factory else {
            if required {
                let err = ConfigurationErrorKind::MissingProxyFactory {
                    ty: context.implementation(),
                };
                error!("{}", err);
                return Err(err.into());
            }
            return Ok(StrategyResult::Proceed);
        };

        let proxy = factory.wrap(context).map_err(|err| strategy_error(context, err))?;
        context.set_proxy(Some(proxy));
        debug!("Wrapped in proxy");
        Ok(StrategyResult::Proceed)
    }

    fn before_destroy(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        if context.proxy().is_none() {
            return Ok(StrategyResult::Proceed);
        }
        let Some(factory) = &context.kernel().proxy_factory else {
            return Ok(StrategyResult::Proceed);
        };

        let instance = factory.unwrap(context).map_err(|err| strategy_error(context, err))?;
        context.set_instance(instance);
        context.set_proxy(None);
        debug!("Unwrapped from proxy");
        Ok(StrategyResult::Proceed)
    }
}

/// Marks disposable instances for tracking and disposes them on destruction.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisposableStrategy;

impl ActivationStrategy for DisposableStrategy {
    fn name(&self) -> &'static str {
        "disposable"
    }

    fn after_initialize(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        if lifecycle(context).is_some_and(Lifecycle::is_disposable) {
            context.mark_tracked();
        }
        Ok(StrategyResult::Proceed)
    }

    fn after_destroy(&self, context: &Context) -> Result<StrategyResult, ActivationErrorKind> {
        let Some(dispose) = lifecycle(context).and_then(|lifecycle| lifecycle.dispose.as_ref()) else {
            return Ok(StrategyResult::Proceed);
        };
        run_hook(context, Some(dispose))?;
        debug!("Disposed");
        Ok(StrategyResult::Proceed)
    }
}
