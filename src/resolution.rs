use alloc::sync::Arc;
use tracing::debug;

use crate::{
    any::{instance, Instance, TypeInfo},
    context::Context,
    errors::{ActivationErrorKind, OperationalErrorKind},
    kernel::KernelComponents,
    logger::Logger,
    request::{Request, Target},
};

/// Resolves the value of one injection target.
pub trait Resolver: Send + Sync {
    fn name(&self) -> &'static str;

    /// `outer` is the context being activated, `inner` the request for its dependency.
    /// Returns `None` when nothing is available for an optional request.
    ///
    /// # Errors
    /// Returns the error of resolving the dependency.
    fn resolve(&self, outer: &Context, inner: Request) -> Result<Option<Instance>, ActivationErrorKind>;
}

/// Picks the resolver of a target while plans are built.
pub trait ResolverFactory: Send + Sync {
    fn create(&self, kernel: &KernelComponents, target: &Target) -> Arc<dyn Resolver>;
}

/// Constant markers first, then loggers, then kernel components, then services.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardResolverFactory;

impl ResolverFactory for StandardResolverFactory {
    fn create(&self, kernel: &KernelComponents, target: &Target) -> Arc<dyn Resolver> {
        if let Some(value) = &target.constant {
            return Arc::new(ConstantResolver::new(value.clone()));
        }
        if target.ty.is::<Logger>() {
            return Arc::new(LoggerResolver);
        }
        if kernel.components.contains_key(&target.ty.id) {
            return Arc::new(ComponentResolver::new(target.ty));
        }
        Arc::new(ServiceResolver)
    }
}

/// Selects a binding for the dependency and activates it in the scope of the outer context.
#[derive(Clone, Copy, Debug, Default)]
pub struct ServiceResolver;

impl Resolver for ServiceResolver {
    fn name(&self) -> &'static str {
        "service"
    }

    fn resolve(&self, outer: &Context, inner: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        let scope = outer.scope().ok_or(OperationalErrorKind::KernelDisposed)?;
        outer.kernel().resolve(&scope, inner)
    }
}

#[derive(Clone)]
pub struct ConstantResolver {
    value: Instance,
}

impl ConstantResolver {
    #[inline]
    #[must_use]
    pub fn new(value: Instance) -> Self {
        Self { value }
    }
}

impl Resolver for ConstantResolver {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn resolve(&self, _outer: &Context, _inner: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        Ok(Some(self.value.clone()))
    }
}

/// Creates a [`Logger`] owned by the type being activated.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoggerResolver;

impl Resolver for LoggerResolver {
    fn name(&self) -> &'static str {
        "logger"
    }

    fn resolve(&self, outer: &Context, _inner: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        Ok(Some(instance(Logger::new(outer.implementation()))))
    }
}

/// Fetches a component registered on the kernel itself.
#[derive(Clone, Copy, Debug)]
pub struct ComponentResolver {
    ty: TypeInfo,
}

impl ComponentResolver {
    #[inline]
    #[must_use]
    pub const fn new(ty: TypeInfo) -> Self {
        Self { ty }
    }
}

impl Resolver for ComponentResolver {
    fn name(&self) -> &'static str {
        "component"
    }

    fn resolve(&self, outer: &Context, _inner: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        let component = outer.kernel().components.get(&self.ty.id).cloned();
        if component.is_some() {
            debug!(component = self.ty.name, "Component resolved");
        }
        Ok(component)
    }
}
