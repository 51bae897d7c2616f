mod invocation;
mod registry;

use alloc::{sync::Arc, vec::Vec};
use core::fmt::{self, Display, Formatter};

pub use invocation::Invocation;
pub use registry::{AdviceRegistry, CallCondition, InterceptorFactory};

use crate::{
    any::{Instance, TypeInfo},
    context::Context,
};

/// Identity of an interceptable method.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct MethodId {
    pub declaring: TypeInfo,
    pub name: &'static str,
}

impl MethodId {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            declaring: TypeInfo::of::<T>(),
            name,
        }
    }
}

impl Display for MethodId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}::{}", self.declaring, self.name)
    }
}

/// A single call on a proxied instance.
#[derive(Clone)]
pub struct CallRequest {
    pub context: Option<Context>,
    pub target: Instance,
    pub method: MethodId,
    pub arguments: Vec<Instance>,
}

impl CallRequest {
    #[inline]
    #[must_use]
    pub fn new(target: Instance, method: MethodId) -> Self {
        Self {
            context: None,
            target,
            method,
            arguments: Vec::new(),
        }
    }

    #[inline]
    #[must_use]
    pub fn with_context(mut self, context: Context) -> Self {
        self.context = Some(context);
        self
    }

    #[inline]
    #[must_use]
    pub fn with_argument(mut self, argument: Instance) -> Self {
        self.arguments.push(argument);
        self
    }
}

pub trait Interceptor: Send + Sync {
    /// Runs around the call. Call [`Invocation::proceed`] to continue the chain.
    fn intercept(&self, invocation: &mut Invocation<'_>) -> anyhow::Result<Option<Instance>>;
}

impl<F> Interceptor for F
where
    F: Fn(&mut Invocation<'_>) -> anyhow::Result<Option<Instance>> + Send + Sync,
{
    #[inline]
    fn intercept(&self, invocation: &mut Invocation<'_>) -> anyhow::Result<Option<Instance>> {
        self(invocation)
    }
}

/// Interception declared on a type or a method.
#[derive(Clone)]
pub struct InterceptMarker {
    pub factory: InterceptorFactory,
    pub order: i32,
}

impl InterceptMarker {
    #[inline]
    #[must_use]
    pub fn new(factory: InterceptorFactory, order: i32) -> Self {
        Self { factory, order }
    }

    /// Marker that shares one interceptor between every call site.
    #[must_use]
    pub fn shared(interceptor: Arc<dyn Interceptor>, order: i32) -> Self {
        Self {
            factory: Arc::new(move |_: &CallRequest| interceptor.clone()),
            order,
        }
    }
}
