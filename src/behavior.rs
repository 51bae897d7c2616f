use alloc::{
    collections::{btree_map::Entry, BTreeMap},
    sync::Arc,
};
use core::any::TypeId;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    any::{instance_key, Instance},
    context::Context,
    errors::ActivationErrorKind,
};

/// Lifetime policy of the instances activated through a plan.
pub trait Behavior: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether one instance is handed out to many requests.
    fn is_shared(&self) -> bool {
        false
    }

    /// Activates or reuses an instance for the context and returns the value handed out.
    ///
    /// # Errors
    /// Returns the error of the activation pipeline.
    fn resolve(&self, context: &Context) -> Result<Instance, ActivationErrorKind>;

    /// Releases an instance activated through this behavior.
    ///
    /// # Errors
    /// Returns the error of the destroy phases of the pipeline.
    fn release(&self, context: &Context) -> Result<(), ActivationErrorKind>;
}

/// Declarative choice of a behavior, from a type marker or the kernel config.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum BehaviorKind {
    #[default]
    Transient,
    Singleton,
}

impl BehaviorKind {
    #[must_use]
    pub fn create(self) -> Arc<dyn Behavior> {
        match self {
            Self::Transient => Arc::new(TransientBehavior),
            Self::Singleton => Arc::new(SingletonBehavior::default()),
        }
    }
}

/// A new instance for every request.
#[derive(Clone, Copy, Debug, Default)]
pub struct TransientBehavior;

impl Behavior for TransientBehavior {
    fn name(&self) -> &'static str {
        "transient"
    }

    fn resolve(&self, context: &Context) -> Result<Instance, ActivationErrorKind> {
        context.kernel().activator.activate(context)?;
        context.activated_value()
    }

    fn release(&self, context: &Context) -> Result<(), ActivationErrorKind> {
        context.kernel().activator.destroy(context)
    }
}

/// One instance per implementation type, tracked by the root scope until the kernel is disposed.
#[derive(Default)]
pub struct SingletonBehavior {
    instances: Mutex<BTreeMap<TypeId, Instance>>,
}

impl Behavior for SingletonBehavior {
    fn name(&self) -> &'static str {
        "singleton"
    }

    fn is_shared(&self) -> bool {
        true
    }

    fn resolve(&self, context: &Context) -> Result<Instance, ActivationErrorKind> {
        let key = context.implementation().id;
        if let Some(value) = self.instances.lock().get(&key).cloned() {
            debug!("Found in singleton cache");
            return Ok(value);
        }

        // Activation may resolve other singletons, so the cache isn't locked meanwhile.
        context.kernel().activator.activate(context)?;
        let value = context.activated_value()?;

        let existing = match self.instances.lock().entry(key) {
            Entry::Occupied(entry) => Some(entry.get().clone()),
            Entry::Vacant(entry) => {
                entry.insert(value.clone());
                None
            }
        };

        if let Some(existing) = existing {
            debug!("Singleton activated concurrently, destroying the redundant instance");
            if let Err(err) = context.kernel().activator.destroy(context) {
                error!("{}", err);
            }
            return Ok(existing);
        }

        if let Some(scope) = context.scope() {
            scope.top().register(context.clone())?;
        }
        debug!("Singleton cached");

        Ok(value)
    }

    fn release(&self, context: &Context) -> Result<(), ActivationErrorKind> {
        {
            let mut instances = self.instances.lock();
            let key = context.implementation().id;
            let cached = instances.get(&key).map(instance_key);
            if cached.is_some() && cached == context.value().as_ref().map(instance_key) {
                instances.remove(&key);
            }
        }
        context.kernel().activator.destroy(context)
    }
}
