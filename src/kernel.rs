use alloc::{boxed::Box, collections::BTreeMap, string::String, sync::Arc, vec, vec::Vec};
use core::{
    any::TypeId,
    sync::atomic::{AtomicBool, Ordering},
};
use tracing::{debug, debug_span, error};

use crate::{
    activation::{Activator, PropertyValues},
    any::{instance, instance_type_id, Instance, TypeInfo},
    binding::{Binding, BindingRegistry, BindingSelector, StandardBindingSelector},
    config::Config,
    context::Context,
    conversion::Conversions,
    errors::{ActivationErrorKind, ConfigurationErrorKind, OperationalErrorKind},
    interception::AdviceRegistry,
    introspection::{Introspector, TypeCatalog},
    parameters::Parameters,
    planning::{InjectionHeuristic, Planner, StandardInjectionHeuristic},
    provider::ConstantProvider,
    proxy::ProxyFactory,
    request::Request,
    resolution::{ResolverFactory, StandardResolverFactory},
    scope::Scope,
    tracker::Tracker,
};

/// Components of a kernel, shared by every context it activates and handed to custom strategies.
pub struct KernelComponents {
    pub(crate) config: Config,
    pub(crate) bindings: BindingRegistry,
    pub(crate) selector: Box<dyn BindingSelector>,
    pub(crate) planner: Planner,
    pub(crate) activator: Activator,
    pub(crate) resolvers: Box<dyn ResolverFactory>,
    pub(crate) heuristic: Box<dyn InjectionHeuristic>,
    pub(crate) advice: AdviceRegistry,
    pub(crate) proxy_factory: Option<Box<dyn ProxyFactory>>,
    pub(crate) conversions: Conversions,
    pub(crate) introspector: Arc<dyn Introspector>,
    pub(crate) components: BTreeMap<TypeId, Instance>,
    pub(crate) property_values: PropertyValues,
}

impl KernelComponents {
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    #[must_use]
    pub fn introspector(&self) -> &dyn Introspector {
        self.introspector.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn heuristic(&self) -> &dyn InjectionHeuristic {
        self.heuristic.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn resolver_factory(&self) -> &dyn ResolverFactory {
        self.resolvers.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn advice(&self) -> &AdviceRegistry {
        &self.advice
    }

    #[inline]
    #[must_use]
    pub const fn bindings(&self) -> &BindingRegistry {
        &self.bindings
    }

    /// Component registered on the kernel for the type.
    #[inline]
    #[must_use]
    pub fn component(&self, ty: TypeId) -> Option<&Instance> {
        self.components.get(&ty)
    }

    /// Selects, plans and activates the request in the scope.
    /// Returns `None` only for optional requests nothing applies to.
    pub(crate) fn resolve(self: &Arc<Self>, scope: &Scope, request: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        scope.ensure_active()?;

        let span = debug_span!("dependency", service = request.service().name, depth = request.depth());
        let _guard = (!request.is_root()).then(|| span.enter());

        if request.depth() > self.config.max_depth {
            let err = ActivationErrorKind::DepthExceeded {
                service: request.service(),
                depth: request.depth(),
            };
            error!("{}", err);
            return Err(err);
        }

        let Some(binding) = self.selector.select(self, &request)? else {
            return Ok(None);
        };
        let Some(provider) = binding.provider() else {
            let err = ConfigurationErrorKind::NoProvider {
                service: binding.service(),
            };
            error!("{}", err);
            return Err(err.into());
        };
        let ty = provider.type_for(&request)?;
        check_cycle(&request, &binding, ty)?;

        let plan = self.planner.get_plan(self, &binding, ty)?;
        let behavior = plan.behavior.clone();
        let context = Context::new(request, binding.clone(), plan, self.clone(), scope);
        let value = behavior.resolve(&context)?;

        if !behavior.is_shared() && self.config.track_transients && context.should_track() {
            scope.register(context.clone())?;
        }

        // A proxy already has the service type.
        if instance_type_id(&value) != ty.id {
            return Ok(Some(value));
        }
        let value = binding.project(value)?;
        context.set_handed_out(&value);
        Ok(Some(value))
    }
}

fn check_cycle(request: &Request, binding: &Binding, ty: TypeInfo) -> Result<(), ActivationErrorKind> {
    let mut chain = vec![ty.short_name()];
    let mut current = request.parent();
    while let Some(context) = current {
        chain.push(context.implementation().short_name());
        if context.binding().id() == binding.id() && context.implementation() == ty {
            chain.reverse();
            let err = ActivationErrorKind::CyclicDependency { chain };
            error!("{}", err);
            return Err(err);
        }
        current = context.parent();
    }
    Ok(())
}

struct KernelRoot {
    inner: Arc<KernelComponents>,
    scope: Scope,
    tracker: Tracker<String>,
    disposed: AtomicBool,
}

impl KernelRoot {
    fn teardown(&self) -> Result<(), ActivationErrorKind> {
        if self.disposed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let tracked = self.tracker.release_all_scopes();
        let root = self.scope.dispose();
        for binding in self.inner.bindings.release_all() {
            self.inner.planner.release_plans(&self.inner, binding.id());
        }
        self.inner.planner.release_all(&self.inner);
        self.inner.property_values.clear();

        debug!("Kernel disposed");
        tracked.and(root)
    }
}

impl Drop for KernelRoot {
    fn drop(&mut self) {
        if let Err(err) = self.teardown() {
            error!("Kernel disposed on drop with error: {}", err);
        }
    }
}

/// Composition root: owns the bindings, the activation machinery and the root scope.
///
/// Handles are cheap to clone. The kernel is disposed by [`Kernel::dispose`] or when the last handle is dropped,
/// releasing tracked scopes, then the root scope with its singletons, then every binding.
#[derive(Clone)]
pub struct Kernel {
    root: Arc<KernelRoot>,
}

impl Default for Kernel {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl Kernel {
    #[inline]
    #[must_use]
    pub fn builder() -> KernelBuilder {
        KernelBuilder::new()
    }

    #[inline]
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.root.inner.config
    }

    #[inline]
    #[must_use]
    pub fn bindings(&self) -> &BindingRegistry {
        &self.root.inner.bindings
    }

    #[inline]
    #[must_use]
    pub fn planner(&self) -> &Planner {
        &self.root.inner.planner
    }

    #[inline]
    #[must_use]
    pub fn advice(&self) -> &AdviceRegistry {
        &self.root.inner.advice
    }

    #[inline]
    #[must_use]
    pub fn root_scope(&self) -> &Scope {
        &self.root.scope
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.root.disposed.load(Ordering::Acquire)
    }

    /// # Errors
    /// Returns [`OperationalErrorKind::KernelDisposed`] if the kernel is disposed.
    pub fn bind(&self, binding: Binding) -> Result<Arc<Binding>, OperationalErrorKind> {
        self.ensure_active()?;
        let binding = Arc::new(binding);
        self.root.inner.bindings.add(binding.clone());
        Ok(binding)
    }

    /// Removes the binding and releases the plans built for it.
    ///
    /// # Errors
    /// Returns [`OperationalErrorKind::BindingNotRegistered`] if the binding isn't registered.
    pub fn unbind(&self, binding: &Binding) -> Result<(), OperationalErrorKind> {
        self.root.inner.bindings.release(binding)?;
        self.root.inner.planner.release_plans(&self.root.inner, binding.id());
        Ok(())
    }

    /// Removes every binding of `S` and releases their plans. Returns how many were removed.
    pub fn unbind_all<S: ?Sized + 'static>(&self) -> usize {
        let removed = self.root.inner.bindings.release_all_for(TypeInfo::of::<S>());
        for binding in &removed {
            self.root.inner.planner.release_plans(&self.root.inner, binding.id());
        }
        removed.len()
    }

    /// # Errors
    /// Returns the first configuration error found in the bindings.
    pub fn validate(&self) -> Result<(), ConfigurationErrorKind> {
        self.root.inner.bindings.validate_bindings()
    }

    /// # Errors
    /// Returns an error if nothing is bound to `T` or the activation fails.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ActivationErrorKind> {
        self.ensure_active()?;
        self.root.scope.get::<T>()
    }

    /// Resolves `T`, returning `None` if nothing applies.
    ///
    /// # Errors
    /// Returns an error if the activation fails.
    pub fn try_get<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ActivationErrorKind> {
        self.ensure_active()?;
        self.root.scope.try_get::<T>()
    }

    /// # Errors
    /// Returns an error if nothing is bound to `T` or the activation fails.
    pub fn get_with<T: Send + Sync + 'static>(&self, parameters: Parameters) -> Result<Arc<T>, ActivationErrorKind> {
        self.ensure_active()?;
        self.root.scope.get_with::<T>(parameters)
    }

    /// # Errors
    /// Returns an error if the activation fails.
    pub fn resolve(&self, request: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        self.ensure_active()?;
        self.root.scope.resolve(request)
    }

    /// Resolves the open generic service closed over `arguments`.
    ///
    /// # Errors
    /// Returns an error if the service can't be closed over the arguments or the activation fails.
    pub fn get_generic(&self, open: TypeInfo, arguments: Vec<TypeInfo>) -> Result<Instance, ActivationErrorKind> {
        self.resolve(Request::new(open).with_generic_arguments(arguments))?
            .ok_or_else(|| {
                let err = ActivationErrorKind::NoMatchingBinding {
                    service: open,
                    target: None,
                };
                error!("{}", err);
                err
            })
    }

    /// Injects the members of an instance created outside the kernel and initializes it.
    /// The instance isn't tracked, nor wrapped in a proxy.
    ///
    /// # Errors
    /// Returns an error if a member can't be resolved or injected.
    pub fn inject<T: Send + Sync + 'static>(&self, value: &Arc<T>) -> Result<(), ActivationErrorKind> {
        self.ensure_active()?;

        let ty = TypeInfo::of::<T>();
        let value: Instance = value.clone();
        let inner = &self.root.inner;
        let binding = Binding::new(ty).with_provider(ConstantProvider::new(value.clone(), ty));
        let plan = inner.planner.build(inner, &binding, ty)?;

        let context = Context::new(
            Request::new(ty),
            Arc::new(binding),
            Arc::new(plan),
            inner.clone(),
            &self.root.scope,
        );
        context.set_injected(value);
        inner.activator.activate(&context)
    }

    /// Releases the instance from the scope tracking it.
    ///
    /// # Errors
    /// - Returns [`OperationalErrorKind::InstanceNotTracked`] if no scope tracks the instance.
    /// - Returns the error of releasing it.
    pub fn release<T: Send + Sync + 'static>(&self, value: &Arc<T>) -> Result<(), ActivationErrorKind> {
        let key = Arc::as_ptr(value).cast::<()>() as usize;
        if self.root.scope.release_by_key(key)? {
            return Ok(());
        }

        let err = OperationalErrorKind::InstanceNotTracked { ty: TypeInfo::of::<T>() };
        error!("{}", err);
        Err(err.into())
    }

    /// # Errors
    /// Returns an error if the kernel is disposed.
    pub fn begin_scope(&self) -> Result<Scope, OperationalErrorKind> {
        self.ensure_active()?;
        self.root.scope.begin_scope()
    }

    /// Begins a scope released later with [`Self::release_scope_with_key`].
    ///
    /// # Errors
    /// - Returns [`OperationalErrorKind::DuplicateScopeKey`] if a scope is already tracked with the key.
    /// - Returns an error if the kernel is disposed.
    pub fn begin_tracked_scope(&self, key: impl Into<String>) -> Result<Scope, OperationalErrorKind> {
        let scope = self.begin_scope()?;
        if let Err(err) = self.root.tracker.track(key.into(), scope.clone()) {
            let _ = scope.dispose();
            return Err(err);
        }
        Ok(scope)
    }

    /// # Errors
    /// - Returns [`OperationalErrorKind::UnknownScopeKey`] if no scope is tracked with the key.
    /// - Returns the error of disposing the scope.
    pub fn release_scope_with_key(&self, key: &str) -> Result<(), ActivationErrorKind> {
        self.root.tracker.release_scope_with_key(&String::from(key))
    }

    /// # Errors
    /// Returns the first error of releasing tracked scopes and the root scope, the teardown completes anyway.
    pub fn dispose(&self) -> Result<(), ActivationErrorKind> {
        self.root.teardown()
    }

    fn ensure_active(&self) -> Result<(), OperationalErrorKind> {
        if self.is_disposed() {
            let err = OperationalErrorKind::KernelDisposed;
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }
}

/// Assembles a [`Kernel`]. Every component not set explicitly is the standard one.
pub struct KernelBuilder {
    config: Config,
    bindings: Vec<Binding>,
    selector: Box<dyn BindingSelector>,
    planner: Planner,
    activator: Activator,
    resolvers: Box<dyn ResolverFactory>,
    heuristic: Box<dyn InjectionHeuristic>,
    advice: AdviceRegistry,
    proxy_factory: Option<Box<dyn ProxyFactory>>,
    conversions: Conversions,
    introspector: Arc<dyn Introspector>,
    components: BTreeMap<TypeId, Instance>,
}

impl Default for KernelBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl KernelBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            config: Config::default(),
            bindings: Vec::new(),
            selector: Box::new(StandardBindingSelector),
            planner: Planner::default(),
            activator: Activator::default(),
            resolvers: Box::new(StandardResolverFactory),
            heuristic: Box::new(StandardInjectionHeuristic),
            advice: AdviceRegistry::new(),
            proxy_factory: None,
            conversions: Conversions::new(),
            introspector: Arc::new(TypeCatalog::new()),
            components: BTreeMap::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    #[inline]
    #[must_use]
    pub fn bind(mut self, binding: Binding) -> Self {
        self.bindings.push(binding);
        self
    }

    #[inline]
    #[must_use]
    pub fn introspector(mut self, introspector: impl Introspector + 'static) -> Self {
        self.introspector = Arc::new(introspector);
        self
    }

    #[inline]
    #[must_use]
    pub fn selector(mut self, selector: impl BindingSelector + 'static) -> Self {
        self.selector = Box::new(selector);
        self
    }

    #[inline]
    #[must_use]
    pub fn planner(mut self, planner: Planner) -> Self {
        self.planner = planner;
        self
    }

    #[inline]
    #[must_use]
    pub fn activator(mut self, activator: Activator) -> Self {
        self.activator = activator;
        self
    }

    #[inline]
    #[must_use]
    pub fn resolver_factory(mut self, resolvers: impl ResolverFactory + 'static) -> Self {
        self.resolvers = Box::new(resolvers);
        self
    }

    #[inline]
    #[must_use]
    pub fn heuristic(mut self, heuristic: impl InjectionHeuristic + 'static) -> Self {
        self.heuristic = Box::new(heuristic);
        self
    }

    #[inline]
    #[must_use]
    pub fn advice(mut self, advice: AdviceRegistry) -> Self {
        self.advice = advice;
        self
    }

    #[inline]
    #[must_use]
    pub fn proxy_factory(mut self, factory: impl ProxyFactory + 'static) -> Self {
        self.proxy_factory = Some(Box::new(factory));
        self
    }

    #[inline]
    #[must_use]
    pub fn conversions(mut self, conversions: Conversions) -> Self {
        self.conversions = conversions;
        self
    }

    /// Registers a kernel-level component, injected into every target declared as `T`.
    #[inline]
    #[must_use]
    pub fn component<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.components.insert(TypeId::of::<T>(), instance(value));
        self
    }

    #[must_use]
    pub fn build(self) -> Kernel {
        let inner = Arc::new(KernelComponents {
            config: self.config,
            bindings: BindingRegistry::new(),
            selector: self.selector,
            planner: self.planner,
            activator: self.activator,
            resolvers: self.resolvers,
            heuristic: self.heuristic,
            advice: self.advice,
            proxy_factory: self.proxy_factory,
            conversions: self.conversions,
            introspector: self.introspector,
            components: self.components,
            property_values: PropertyValues::default(),
        });
        for binding in self.bindings {
            inner.bindings.add(Arc::new(binding));
        }
        debug!(services = inner.bindings.get_services().len(), "Kernel built");

        Kernel {
            root: Arc::new(KernelRoot {
                scope: Scope::root(inner.clone()),
                inner,
                tracker: Tracker::new(),
                disposed: AtomicBool::new(false),
            }),
        }
    }
}
