use alloc::{
    format,
    string::String,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::any::Any;
use parking_lot::Mutex;

use crate::{
    any::{instance_key, Instance, TypeInfo},
    binding::Binding,
    errors::ActivationErrorKind,
    interception::AdviceRegistry,
    kernel::KernelComponents,
    planning::ActivationPlan,
    request::Request,
    scope::{Scope, ScopeInner},
};

#[derive(Default)]
struct ContextState {
    instance: Option<Instance>,
    proxy: Option<Instance>,
    handed_out: Option<Weak<dyn Any + Send + Sync>>,
    should_track: bool,
    started: bool,
    injected: bool,
}

pub(crate) struct ContextInner {
    request: Request,
    binding: Arc<Binding>,
    plan: Arc<ActivationPlan>,
    implementation: TypeInfo,
    kernel: Arc<KernelComponents>,
    scope: Weak<ScopeInner>,
    state: Mutex<ContextState>,
}

/// Node of a resolution tree: what was requested, the binding and plan chosen for it and the activated instance.
#[derive(Clone)]
pub struct Context {
    pub(crate) inner: Arc<ContextInner>,
}

impl Context {
    pub(crate) fn new(
        request: Request,
        binding: Arc<Binding>,
        plan: Arc<ActivationPlan>,
        kernel: Arc<KernelComponents>,
        scope: &Scope,
    ) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                implementation: plan.ty,
                request,
                binding,
                plan,
                kernel,
                scope: scope.downgrade(),
                state: Mutex::new(ContextState::default()),
            }),
        }
    }

    #[inline]
    pub(crate) fn downgrade(&self) -> Weak<ContextInner> {
        Arc::downgrade(&self.inner)
    }

    #[inline]
    pub(crate) fn upgrade(inner: &Weak<ContextInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    #[inline]
    #[must_use]
    pub fn request(&self) -> &Request {
        &self.inner.request
    }

    #[inline]
    #[must_use]
    pub fn binding(&self) -> &Arc<Binding> {
        &self.inner.binding
    }

    #[inline]
    #[must_use]
    pub fn plan(&self) -> &Arc<ActivationPlan> {
        &self.inner.plan
    }

    /// Concrete type the context activates.
    #[inline]
    #[must_use]
    pub fn implementation(&self) -> TypeInfo {
        self.inner.implementation
    }

    #[inline]
    #[must_use]
    pub fn service(&self) -> TypeInfo {
        self.inner.request.service
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Context> {
        self.inner.request.parent()
    }

    #[inline]
    pub(crate) fn kernel(&self) -> &Arc<KernelComponents> {
        &self.inner.kernel
    }

    /// Components of the kernel activating the context.
    #[inline]
    #[must_use]
    pub fn components(&self) -> &KernelComponents {
        &self.inner.kernel
    }

    /// Scope the context was resolved in, if it isn't dropped yet.
    #[inline]
    #[must_use]
    pub fn scope(&self) -> Option<Scope> {
        Scope::upgrade(&self.inner.scope)
    }

    /// Raw instance created by the provider, before any proxy.
    #[inline]
    #[must_use]
    pub fn instance(&self) -> Option<Instance> {
        self.inner.state.lock().instance.clone()
    }

    #[inline]
    #[must_use]
    pub fn proxy(&self) -> Option<Instance> {
        self.inner.state.lock().proxy.clone()
    }

    /// Value handed out to consumers: the proxy if the instance is wrapped, the raw instance otherwise.
    #[must_use]
    pub fn value(&self) -> Option<Instance> {
        let state = self.inner.state.lock();
        state.proxy.clone().or_else(|| state.instance.clone())
    }

    /// Value after activation, failing if no provider created an instance.
    pub(crate) fn activated_value(&self) -> Result<Instance, ActivationErrorKind> {
        self.value().ok_or_else(|| ActivationErrorKind::Strategy {
            context: self.describe(),
            source: anyhow::anyhow!("activation finished without an instance"),
        })
    }

    #[inline]
    pub(crate) fn set_instance(&self, instance: Instance) {
        self.inner.state.lock().instance = Some(instance);
    }

    #[inline]
    pub(crate) fn set_proxy(&self, proxy: Option<Instance>) {
        self.inner.state.lock().proxy = proxy;
    }

    /// Remembers the value handed out for the service when it isn't the raw instance or the proxy.
    pub(crate) fn set_handed_out(&self, value: &Instance) {
        self.inner.state.lock().handed_out = Some(Arc::downgrade(value));
    }

    /// Whether the instance with the key is the raw instance, the proxy or the value handed out.
    pub(crate) fn is_keyed_by(&self, key: usize) -> bool {
        let state = self.inner.state.lock();
        state.instance.as_ref().is_some_and(|instance| instance_key(instance) == key)
            || state.proxy.as_ref().is_some_and(|proxy| instance_key(proxy) == key)
            || state
                .handed_out
                .as_ref()
                .is_some_and(|value| value.strong_count() > 0 && value.as_ptr().cast::<()>() as usize == key)
    }

    /// Interception registry of the kernel, for proxies dispatching calls.
    #[inline]
    #[must_use]
    pub fn advice(&self) -> &AdviceRegistry {
        &self.inner.kernel.advice
    }

    #[inline]
    #[must_use]
    pub fn should_track(&self) -> bool {
        self.inner.state.lock().should_track
    }

    #[inline]
    pub(crate) fn mark_tracked(&self) {
        self.inner.state.lock().should_track = true;
    }

    #[inline]
    #[must_use]
    pub fn is_started(&self) -> bool {
        self.inner.state.lock().started
    }

    #[inline]
    pub(crate) fn set_started(&self, started: bool) {
        self.inner.state.lock().started = started;
    }

    /// Whether the instance was created outside the kernel and handed to [`crate::Kernel::inject`].
    #[inline]
    #[must_use]
    pub fn is_injected(&self) -> bool {
        self.inner.state.lock().injected
    }

    /// Sets an instance created outside the kernel, which the pipeline injects but never creates or wraps.
    pub(crate) fn set_injected(&self, instance: Instance) {
        let mut state = self.inner.state.lock();
        state.instance = Some(instance);
        state.injected = true;
    }

    #[inline]
    #[must_use]
    pub fn ptr_eq(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// Human readable path from the root request to this context.
    #[must_use]
    pub fn describe(&self) -> String {
        let mut chain = Vec::new();
        let mut current = Some(self.clone());
        while let Some(context) = current {
            chain.push(context.request().describe());
            current = context.parent();
        }
        chain.reverse();
        format!("{} ({})", chain.join(" -> "), self.implementation())
    }
}
