mod condition;
mod registry;
mod selector;

use alloc::sync::Arc;
use core::{
    fmt::{self, Debug, Formatter},
    sync::atomic::{AtomicU64, Ordering},
};

pub use condition::Condition;
pub use registry::BindingRegistry;
pub use selector::{BindingSelector, StandardBindingSelector};

use crate::{
    any::{instance, instance_type_id, Instance, TypeInfo},
    behavior::{Behavior, BehaviorKind},
    context::Context,
    errors::ActivationErrorKind,
    parameters::{Parameter, Parameters},
    provider::{CallbackProvider, ConstantProvider, GenericProvider, Provider, StandardProvider},
    request::Request,
};

static NEXT_BINDING_ID: AtomicU64 = AtomicU64::new(1);

pub(crate) type Cast = Arc<dyn Fn(Instance) -> Result<Instance, ActivationErrorKind> + Send + Sync>;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BindingId(pub u64);

/// Rule mapping a service type to a provider, optionally gated by a condition.
pub struct Binding {
    id: BindingId,
    service: TypeInfo,
    provider: Option<Arc<dyn Provider>>,
    behavior: Option<Arc<dyn Behavior>>,
    condition: Option<Condition>,
    parameters: Parameters,
    cast: Option<Cast>,
    is_implicit: bool,
}

impl Debug for Binding {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Binding")
            .field("id", &self.id.0)
            .field("service", &self.service.name)
            .field("provider", &self.provider.as_ref().map(|provider| provider.name()))
            .field("behavior", &self.behavior.as_ref().map(|behavior| behavior.name()))
            .field("conditional", &self.condition.is_some())
            .field("is_implicit", &self.is_implicit)
            .finish()
    }
}

impl Binding {
    /// Binding without a provider. It's invalid until [`Self::with_provider`] is called.
    #[must_use]
    pub fn new(service: TypeInfo) -> Self {
        Self {
            id: BindingId(NEXT_BINDING_ID.fetch_add(1, Ordering::Relaxed)),
            service,
            provider: None,
            behavior: None,
            condition: None,
            parameters: Parameters::new(),
            cast: None,
            is_implicit: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn of<S: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<S>())
    }

    /// Binds the concrete type to itself.
    #[inline]
    #[must_use]
    pub fn to_self<T: Send + Sync + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>()).with_provider(StandardProvider::of::<T>())
    }

    /// Binds `Service` to `Implementation`, built by the standard provider and projected by `project`.
    #[must_use]
    pub fn to<Service, Implementation>(project: impl Fn(Arc<Implementation>) -> Service + Send + Sync + 'static) -> Self
    where
        Service: Send + Sync + 'static,
        Implementation: Send + Sync + 'static,
    {
        let mut binding = Self::of::<Service>().with_provider(StandardProvider::of::<Implementation>());
        binding.cast = Some(Arc::new(move |value: Instance| match value.downcast::<Implementation>() {
            Ok(implementation) => Ok(instance(project(implementation))),
            Err(value) => Err(ActivationErrorKind::IncorrectType {
                expected: TypeInfo::of::<Implementation>(),
                actual: instance_type_id(&value),
            }),
        }));
        binding
    }

    /// Binds the service to a constant value, shared by every request.
    #[must_use]
    pub fn to_constant<S: Send + Sync + 'static>(value: S) -> Self {
        Self::of::<S>()
            .with_provider(ConstantProvider::of(value))
            .with_behavior(BehaviorKind::Singleton)
    }

    /// Binds the service to a callback invoked with the activation context.
    #[must_use]
    pub fn to_method<S, F>(callback: F) -> Self
    where
        S: Send + Sync + 'static,
        F: Fn(&Context) -> anyhow::Result<S> + Send + Sync + 'static,
    {
        Self::of::<S>().with_provider(CallbackProvider::of(callback))
    }

    /// Binds an open generic service, closed per request over its generic arguments.
    #[must_use]
    pub fn to_generic(open: TypeInfo, provider: GenericProvider) -> Self {
        Self::new(open).with_provider(provider)
    }

    #[inline]
    #[must_use]
    pub fn with_provider(mut self, provider: impl Provider + 'static) -> Self {
        self.provider = Some(Arc::new(provider));
        self
    }

    #[inline]
    #[must_use]
    pub fn with_behavior(mut self, kind: BehaviorKind) -> Self {
        self.behavior = Some(kind.create());
        self
    }

    #[inline]
    #[must_use]
    pub fn with_custom_behavior(mut self, behavior: Arc<dyn Behavior>) -> Self {
        self.behavior = Some(behavior);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.condition = Some(condition);
        self
    }

    #[inline]
    #[must_use]
    pub fn when(self, condition: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        self.with_condition(Condition::custom(condition))
    }

    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, parameter: Parameter) -> Self {
        self.parameters.add(parameter);
        self
    }

    #[inline]
    #[must_use]
    pub(crate) fn implicit(mut self) -> Self {
        self.is_implicit = true;
        self
    }

    #[inline]
    #[must_use]
    pub const fn id(&self) -> BindingId {
        self.id
    }

    #[inline]
    #[must_use]
    pub const fn service(&self) -> TypeInfo {
        self.service
    }

    #[inline]
    #[must_use]
    pub fn provider(&self) -> Option<&Arc<dyn Provider>> {
        self.provider.as_ref()
    }

    #[inline]
    #[must_use]
    pub fn behavior(&self) -> Option<&Arc<dyn Behavior>> {
        self.behavior.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn condition(&self) -> Option<&Condition> {
        self.condition.as_ref()
    }

    #[inline]
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    /// A binding is the default for its service when it has no condition.
    #[inline]
    #[must_use]
    pub const fn is_default(&self) -> bool {
        self.condition.is_none()
    }

    #[inline]
    #[must_use]
    pub const fn is_implicit(&self) -> bool {
        self.is_implicit
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, request: &Request) -> bool {
        self.condition.as_ref().map_or(true, |condition| condition.matches(request))
    }

    /// Turns the activated implementation into the value handed out for the service.
    pub(crate) fn project(&self, value: Instance) -> Result<Instance, ActivationErrorKind> {
        match &self.cast {
            Some(cast) => cast(value),
            None => Ok(value),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Binding, Condition};
    use crate::{any::instance, request::Request};

    use alloc::sync::Arc;

    trait Weapon: Send + Sync {
        fn hit(&self) -> &'static str;
    }

    struct Sword;

    impl Weapon for Sword {
        fn hit(&self) -> &'static str {
            "chop"
        }
    }

    #[test]
    fn test_default_iff_no_condition() {
        let default = Binding::to_self::<Sword>();
        let conditional = Binding::to_self::<Sword>().with_condition(Condition::when_root());

        assert!(default.is_default());
        assert!(!conditional.is_default());
        assert_ne!(default.id(), conditional.id());
        assert!(default.provider().is_some());
        assert!(Binding::of::<Sword>().provider().is_none());
    }

    #[test]
    fn test_projection() {
        let binding = Binding::to::<Arc<dyn Weapon>, Sword>(|sword| sword);

        let projected = binding.project(instance(Sword)).unwrap();
        assert_eq!(projected.downcast_ref::<Arc<dyn Weapon>>().unwrap().hit(), "chop");
        assert!(binding.project(instance(1u8)).is_err());
    }

    #[test]
    fn test_matches_condition() {
        let binding = Binding::to_self::<Sword>().when(|request| request.is_optional());

        assert!(binding.matches(&Request::of::<Sword>().optional()));
        assert!(!binding.matches(&Request::of::<Sword>()));
    }
}
