mod activator;
mod strategies;

use alloc::{
    collections::{btree_map::Entry, BTreeMap},
    sync::{Arc, Weak},
    vec::Vec,
};
use core::any::Any;
use parking_lot::Mutex;
use tracing::{debug, error};

pub use activator::{ActivationPhase, ActivationStrategy, Activator};
pub use strategies::{
    DisposableStrategy, FieldInjectionStrategy, InitializableStrategy, MethodInjectionStrategy,
    PropertyInjectionStrategy, ProviderStrategy, ProxyStrategy, StartableStrategy,
};

use crate::{
    any::{instance_key, Instance},
    context::Context,
    errors::ActivationErrorKind,
    parameters::ParameterKind,
    planning::Argument,
    request::Request,
};

/// Resolves the value of an argument of the context.
///
/// Precedence: a parameter of the request, a parameter of the binding, the value last injected
/// into the same property of the same instance, the resolver of the argument. The value is then converted to the declared type of the target.
pub(crate) fn resolve_argument(
    context: &Context,
    kind: ParameterKind,
    argument: &Argument,
) -> Result<Option<Instance>, ActivationErrorKind> {
    let target = &argument.target;
    let overridden = context
        .request()
        .parameters()
        .get(kind, &target.name)
        .or_else(|| context.binding().parameters().get(kind, &target.name))
        .map(|parameter| parameter.value.get(context));

    let value = match overridden {
        Some(value) => {
            debug!(member = &*target.name, "Parameter applied");
            Some(value)
        }
        None => match prior_property_value(context, kind, &target.name) {
            Some(value) => {
                debug!(member = &*target.name, "Prior property value restored");
                Some(value)
            }
            None => argument.resolver.resolve(context, Request::child(context, target))?,
        },
    };

    match value {
        Some(value) => context.kernel().conversions.convert(value, target).map(Some),
        None if argument.optional => {
            debug!(member = &*target.name, "Optional target left empty");
            Ok(None)
        }
        None => {
            let err = ActivationErrorKind::NoMatchingBinding {
                service: target.ty,
                target: Some(alloc::format!("{target}")),
            };
            error!("{}", err);
            Err(err)
        }
    }
}

fn prior_property_value(context: &Context, kind: ParameterKind, name: &str) -> Option<Instance> {
    if kind != ParameterKind::PropertyValue {
        return None;
    }
    let instance = context.instance()?;
    context.kernel().property_values.get(&instance, name)
}

pub(crate) fn resolve_arguments(
    context: &Context,
    kind: ParameterKind,
    arguments: &[Argument],
) -> Result<Vec<Option<Instance>>, ActivationErrorKind> {
    arguments
        .iter()
        .map(|argument| resolve_argument(context, kind, argument))
        .collect()
}

struct InjectedProperties {
    instance: Weak<dyn Any + Send + Sync>,
    values: BTreeMap<&'static str, Instance>,
}

/// Values injected into the properties of live instances, by instance and property name.
///
/// Injecting an instance again, through [`crate::Kernel::inject`], restores these values
/// instead of resolving the properties anew. Entries of dropped instances are pruned.
#[derive(Default)]
pub(crate) struct PropertyValues {
    entries: Mutex<BTreeMap<usize, InjectedProperties>>,
}

impl PropertyValues {
    pub(crate) fn get(&self, instance: &Instance, name: &str) -> Option<Instance> {
        let entries = self.entries.lock();
        let entry = entries.get(&instance_key(instance))?;
        // The weak reference keeps the address from being reused while the entry exists.
        if entry.instance.strong_count() == 0 {
            return None;
        }
        entry.values.get(name).cloned()
    }

    pub(crate) fn insert(&self, instance: &Instance, name: &'static str, value: Instance) {
        let mut entries = self.entries.lock();
        let key = instance_key(instance);
        if !entries.contains_key(&key) {
            entries.retain(|_, entry| entry.instance.strong_count() > 0);
        }
        let entry = match entries.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(InjectedProperties {
                instance: Arc::downgrade(instance),
                values: BTreeMap::new(),
            }),
        };
        entry.values.insert(name, value);
    }

    pub(crate) fn clear(&self) {
        self.entries.lock().clear();
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().len()
    }
}
