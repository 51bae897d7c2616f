use alloc::{collections::BTreeMap, sync::Arc, vec::Vec};
use parking_lot::Mutex;
use tracing::{debug, error};

use super::Binding;
use crate::{
    any::TypeInfo,
    errors::{ConfigurationErrorKind, OperationalErrorKind},
};

/// Bindings grouped by service type, guarded by one registry-wide lock.
#[derive(Default)]
pub struct BindingRegistry {
    bindings: Mutex<BTreeMap<TypeInfo, Vec<Arc<Binding>>>>,
}

impl BindingRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&self, binding: Arc<Binding>) {
        debug!(service = binding.service().name, id = binding.id().0, "Binding added");
        self.bindings.lock().entry(binding.service()).or_default().push(binding);
    }

    /// Adds the binding produced by `make` unless the service has bindings by now.
    /// Returns the first binding of the service after the call.
    pub(crate) fn add_implicit(&self, service: TypeInfo, make: impl FnOnce() -> Binding) -> Arc<Binding> {
        let mut bindings = self.bindings.lock();
        let group = bindings.entry(service).or_default();
        if let Some(existing) = group.first() {
            return existing.clone();
        }

        let binding = Arc::new(make());
        debug!(service = service.name, id = binding.id().0, "Implicit self-binding added");
        group.push(binding.clone());
        binding
    }

    /// # Errors
    /// Returns [`OperationalErrorKind::BindingNotRegistered`] if the binding isn't in the registry.
    pub fn release(&self, binding: &Binding) -> Result<(), OperationalErrorKind> {
        let mut bindings = self.bindings.lock();
        let removed = bindings.get_mut(&binding.service()).is_some_and(|group| {
            let len = group.len();
            group.retain(|registered| registered.id() != binding.id());
            group.len() != len
        });

        if !removed {
            let err = OperationalErrorKind::BindingNotRegistered {
                service: binding.service(),
                id: binding.id().0,
            };
            error!("{}", err);
            return Err(err);
        }

        if bindings.get(&binding.service()).is_some_and(Vec::is_empty) {
            bindings.remove(&binding.service());
        }
        debug!(service = binding.service().name, id = binding.id().0, "Binding released");
        Ok(())
    }

    /// Removes every binding of the service and returns them.
    pub fn release_all_for(&self, service: TypeInfo) -> Vec<Arc<Binding>> {
        let removed = self.bindings.lock().remove(&service).unwrap_or_default();
        debug!(service = service.name, count = removed.len(), "Bindings released");
        removed
    }

    /// Removes every binding and returns them.
    pub fn release_all(&self) -> Vec<Arc<Binding>> {
        let removed: Vec<_> = core::mem::take(&mut *self.bindings.lock())
            .into_values()
            .flatten()
            .collect();
        debug!(count = removed.len(), "All bindings released");
        removed
    }

    #[must_use]
    pub fn has_binding(&self, service: TypeInfo) -> bool {
        self.bindings.lock().get(&service).is_some_and(|group| !group.is_empty())
    }

    /// Snapshot of the bindings of the service, in registration order.
    #[must_use]
    pub fn get_bindings(&self, service: TypeInfo) -> Option<Vec<Arc<Binding>>> {
        self.bindings
            .lock()
            .get(&service)
            .filter(|group| !group.is_empty())
            .cloned()
    }

    #[must_use]
    pub fn get_services(&self) -> Vec<TypeInfo> {
        self.bindings.lock().keys().copied().collect()
    }

    /// # Errors
    /// - Returns [`ConfigurationErrorKind::NoProvider`] if a binding has no provider.
    /// - Returns [`ConfigurationErrorKind::MultipleDefaultBindings`] if a service has more than one binding without a condition.
    pub fn validate_bindings(&self) -> Result<(), ConfigurationErrorKind> {
        let bindings = self.bindings.lock();
        for (service, group) in bindings.iter() {
            if group.iter().any(|binding| binding.provider().is_none()) {
                let err = ConfigurationErrorKind::NoProvider { service: *service };
                error!("{}", err);
                return Err(err);
            }

            let count = group.iter().filter(|binding| binding.is_default()).count();
            if count > 1 {
                let err = ConfigurationErrorKind::MultipleDefaultBindings {
                    service: *service,
                    count,
                };
                error!("{}", err);
                return Err(err);
            }
        }
        Ok(())
    }
}
