use alloc::{
    collections::BTreeMap,
    string::{String, ToString as _},
    sync::Arc,
    vec::Vec,
};
use tracing::{debug, error};

use crate::{
    activation::resolve_arguments,
    any::{instance, instance_type_id, Instance, TypeInfo},
    context::Context,
    errors::{ActivationErrorKind, ConfigurationErrorKind},
    introspection::Arguments,
    parameters::ParameterKind,
    request::Request,
};

/// Creates instances for a binding.
pub trait Provider: Send + Sync {
    fn name(&self) -> &'static str;

    /// Concrete type the provider creates for the request.
    ///
    /// # Errors
    /// Returns an error if no concrete type can be determined for the request.
    fn type_for(&self, request: &Request) -> Result<TypeInfo, ActivationErrorKind>;

    /// # Errors
    /// Returns the error of the creation, errors of user code are kept as [`ActivationErrorKind::Invocation`].
    fn create(&self, context: &Context) -> Result<Instance, ActivationErrorKind>;

    /// Whether the provider calls the constructor selected by the plan.
    fn uses_constructor(&self) -> bool {
        false
    }
}

/// Calls the injection constructor of the plan, resolving its arguments first.
#[derive(Clone, Copy, Debug)]
pub struct StandardProvider {
    ty: TypeInfo,
}

impl StandardProvider {
    #[inline]
    #[must_use]
    pub const fn new(ty: TypeInfo) -> Self {
        Self { ty }
    }

    #[inline]
    #[must_use]
    pub fn of<T: Send + Sync + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>())
    }
}

impl Provider for StandardProvider {
    fn name(&self) -> &'static str {
        "standard"
    }

    fn type_for(&self, _request: &Request) -> Result<TypeInfo, ActivationErrorKind> {
        Ok(self.ty)
    }

    fn create(&self, context: &Context) -> Result<Instance, ActivationErrorKind> {
        construct(context)
    }

    fn uses_constructor(&self) -> bool {
        true
    }
}

pub(crate) fn construct(context: &Context) -> Result<Instance, ActivationErrorKind> {
    let Some(directive) = context.plan().directives.constructor() else {
        let err = ConfigurationErrorKind::NoInjectionConstructor {
            ty: context.implementation(),
            candidates: 0,
        };
        error!("{}", err);
        return Err(err.into());
    };

    let values = resolve_arguments(context, ParameterKind::ConstructorArgument, &directive.arguments)?;
    let instance = (directive.constructor.injector)(Arguments::new(values)).map_err(|err| {
        error!("{}", err);
        ActivationErrorKind::Invocation(err)
    })?;

    let actual = instance_type_id(&instance);
    if actual != context.implementation().id {
        let err = ActivationErrorKind::IncorrectType {
            expected: context.implementation(),
            actual,
        };
        error!("{}", err);
        return Err(err);
    }

    debug!("Constructed");
    Ok(instance)
}

/// Always returns the same value.
#[derive(Clone)]
pub struct ConstantProvider {
    value: Instance,
    ty: TypeInfo,
}

impl ConstantProvider {
    #[inline]
    #[must_use]
    pub fn new(value: Instance, ty: TypeInfo) -> Self {
        Self { value, ty }
    }

    #[inline]
    #[must_use]
    pub fn of<T: Send + Sync + 'static>(value: T) -> Self {
        Self::new(instance(value), TypeInfo::of::<T>())
    }
}

impl Provider for ConstantProvider {
    fn name(&self) -> &'static str {
        "constant"
    }

    fn type_for(&self, _request: &Request) -> Result<TypeInfo, ActivationErrorKind> {
        Ok(self.ty)
    }

    fn create(&self, _context: &Context) -> Result<Instance, ActivationErrorKind> {
        Ok(self.value.clone())
    }
}

type Callback = Arc<dyn Fn(&Context) -> anyhow::Result<Instance> + Send + Sync>;

/// Creates instances with a user callback.
#[derive(Clone)]
pub struct CallbackProvider {
    ty: TypeInfo,
    callback: Callback,
}

impl CallbackProvider {
    #[must_use]
    pub fn of<T, F>(callback: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Context) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self {
            ty: TypeInfo::of::<T>(),
            callback: Arc::new(move |context: &Context| callback(context).map(instance)),
        }
    }
}

impl Provider for CallbackProvider {
    fn name(&self) -> &'static str {
        "callback"
    }

    fn type_for(&self, _request: &Request) -> Result<TypeInfo, ActivationErrorKind> {
        Ok(self.ty)
    }

    fn create(&self, context: &Context) -> Result<Instance, ActivationErrorKind> {
        (self.callback)(context).map_err(|err| {
            error!("{}", err);
            ActivationErrorKind::Invocation(err)
        })
    }
}

type ConstraintCheck = Arc<dyn Fn(&[TypeInfo]) -> bool + Send + Sync>;

#[derive(Clone)]
struct GenericConstraint {
    reason: String,
    check: ConstraintCheck,
}

/// Closes an open generic service over the generic arguments of the request.
///
/// Every closed type it can create is registered up front with its arguments.
#[derive(Clone, Default)]
pub struct GenericProvider {
    closings: BTreeMap<Vec<TypeInfo>, TypeInfo>,
    constraints: Vec<GenericConstraint>,
}

impl GenericProvider {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `Closed` as the type created for `arguments`.
    #[inline]
    #[must_use]
    pub fn close<Closed: Send + Sync + 'static>(mut self, arguments: Vec<TypeInfo>) -> Self {
        self.closings.insert(arguments, TypeInfo::of::<Closed>());
        self
    }

    /// Adds a constraint the arguments must satisfy, `reason` describes it in errors.
    #[inline]
    #[must_use]
    pub fn constraint(
        mut self,
        reason: impl Into<String>,
        check: impl Fn(&[TypeInfo]) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.constraints.push(GenericConstraint {
            reason: reason.into(),
            check: Arc::new(check),
        });
        self
    }
}

impl Provider for GenericProvider {
    fn name(&self) -> &'static str {
        "generic"
    }

    fn type_for(&self, request: &Request) -> Result<TypeInfo, ActivationErrorKind> {
        let arguments = request.generic_arguments();
        if arguments.is_empty() {
            let err = ConfigurationErrorKind::GenericArgumentsMissing {
                service: request.service(),
            };
            error!("{}", err);
            return Err(err.into());
        }

        let violated = self
            .constraints
            .iter()
            .find(|constraint| !(constraint.check)(arguments))
            .map(|constraint| constraint.reason.clone());
        let closed = self.closings.get(arguments).copied();

        match (violated, closed) {
            (None, Some(closed)) => Ok(closed),
            (violated, _) => {
                let err = ConfigurationErrorKind::GenericConstraint {
                    service: request.service(),
                    arguments: arguments.to_vec(),
                    reason: violated.unwrap_or_else(|| "no closed type is registered for the arguments".to_string()),
                };
                error!("{}", err);
                Err(err.into())
            }
        }
    }

    fn create(&self, context: &Context) -> Result<Instance, ActivationErrorKind> {
        construct(context)
    }

    fn uses_constructor(&self) -> bool {
        true
    }
}
