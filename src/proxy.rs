use crate::{any::Instance, context::Context};

/// Wraps activated instances so their calls run through interceptors.
///
/// Calls on the wrapper are expected to go through [`crate::interception::AdviceRegistry::invoke`],
/// reachable from [`Context::advice`].
pub trait ProxyFactory: Send + Sync {
    /// Returns the value handed out instead of the raw instance of the context.
    /// It must have the service type of the binding.
    ///
    /// # Errors
    /// Returns an error if the instance can't be wrapped.
    fn wrap(&self, context: &Context) -> anyhow::Result<Instance>;

    /// Returns the original instance behind the proxy of the context.
    ///
    /// # Errors
    /// Returns an error if the proxy can't be unwrapped.
    fn unwrap(&self, context: &Context) -> anyhow::Result<Instance>;
}
