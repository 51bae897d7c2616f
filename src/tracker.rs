use alloc::{collections::BTreeMap, format, vec::Vec};
use core::fmt::Debug;
use parking_lot::Mutex;
use tracing::{debug, error};

use crate::{
    errors::{ActivationErrorKind, OperationalErrorKind},
    scope::Scope,
};

/// Scopes released by key rather than by handle.
pub struct Tracker<K> {
    scopes: Mutex<BTreeMap<K, Scope>>,
}

impl<K> Default for Tracker<K> {
    fn default() -> Self {
        Self {
            scopes: Mutex::new(BTreeMap::new()),
        }
    }
}

impl<K: Ord + Debug> Tracker<K> {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`OperationalErrorKind::DuplicateScopeKey`] if a scope is already tracked with the key.
    pub fn track(&self, key: K, scope: Scope) -> Result<(), OperationalErrorKind> {
        let mut scopes = self.scopes.lock();
        if scopes.contains_key(&key) {
            let err = OperationalErrorKind::DuplicateScopeKey { key: format!("{key:?}") };
            error!("{}", err);
            return Err(err);
        }
        debug!(?key, scope = scope.id(), "Scope tracked");
        scopes.insert(key, scope);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, key: &K) -> Option<Scope> {
        self.scopes.lock().get(key).cloned()
    }

    #[must_use]
    pub fn contains_key(&self, key: &K) -> bool {
        self.scopes.lock().contains_key(key)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.scopes.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scopes.lock().is_empty()
    }

    /// Stops tracking the scope of the key and disposes it.
    ///
    /// # Errors
    /// - Returns [`OperationalErrorKind::UnknownScopeKey`] if no scope is tracked with the key.
    /// - Returns the error of disposing the scope.
    pub fn release_scope_with_key(&self, key: &K) -> Result<(), ActivationErrorKind> {
        let Some(scope) = self.scopes.lock().remove(key) else {
            let err = OperationalErrorKind::UnknownScopeKey { key: format!("{key:?}") };
            error!("{}", err);
            return Err(err.into());
        };
        debug!(?key, scope = scope.id(), "Releasing tracked scope");
        scope.dispose()
    }

    /// Stops tracking the scope and disposes it.
    ///
    /// # Errors
    /// - Returns [`OperationalErrorKind::ScopeNotTracked`] if the scope isn't tracked.
    /// - Returns the error of disposing the scope.
    pub fn release_scope(&self, scope: &Scope) -> Result<(), ActivationErrorKind> {
        let released = {
            let mut scopes = self.scopes.lock();
            let before = scopes.len();
            scopes.retain(|_, tracked| !tracked.ptr_eq(scope));
            before != scopes.len()
        };
        if !released {
            let err = OperationalErrorKind::ScopeNotTracked { id: scope.id() };
            error!("{}", err);
            return Err(err.into());
        }
        scope.dispose()
    }

    /// Disposes every tracked scope.
    ///
    /// # Errors
    /// Returns the first error, every scope is disposed anyway.
    pub fn release_all_scopes(&self) -> Result<(), ActivationErrorKind> {
        let scopes: Vec<_> = core::mem::take(&mut *self.scopes.lock()).into_values().collect();
        debug!(count = scopes.len(), "Releasing all tracked scopes");

        let mut result = Ok(());
        for scope in scopes {
            if let Err(err) = scope.dispose() {
                if result.is_ok() {
                    result = Err(err);
                }
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Tracker;
    use crate::{
        errors::{ActivationErrorKind, OperationalErrorKind},
        kernel::Kernel,
    };

    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_release_scope_with_key() {
        let kernel = Kernel::default();
        let tracker = Tracker::new();
        let scope = kernel.begin_scope().unwrap();

        tracker.track("first", scope.clone()).unwrap();
        assert!(matches!(
            tracker.track("first", kernel.begin_scope().unwrap()),
            Err(OperationalErrorKind::DuplicateScopeKey { .. })
        ));
        assert_eq!(tracker.len(), 1);

        tracker.release_scope_with_key(&"first").unwrap();
        assert!(scope.is_disposed());
        assert!(tracker.is_empty());
        assert!(matches!(
            tracker.release_scope_with_key(&"first"),
            Err(ActivationErrorKind::Operational(OperationalErrorKind::UnknownScopeKey { .. }))
        ));
    }

    #[test]
    #[traced_test]
    fn test_release_scope() {
        let kernel = Kernel::default();
        let tracker = Tracker::new();
        let tracked = kernel.begin_scope().unwrap();
        let untracked = kernel.begin_scope().unwrap();
        tracker.track(1u8, tracked.clone()).unwrap();

        assert!(matches!(
            tracker.release_scope(&untracked),
            Err(ActivationErrorKind::Operational(OperationalErrorKind::ScopeNotTracked { .. }))
        ));
        tracker.release_scope(&tracked).unwrap();
        assert!(tracked.is_disposed());
        assert!(!untracked.is_disposed());
    }

    #[test]
    #[traced_test]
    fn test_release_all_scopes() {
        let kernel = Kernel::default();
        let tracker = Tracker::new();
        let scopes = [kernel.begin_scope().unwrap(), kernel.begin_scope().unwrap()];
        for (key, scope) in scopes.iter().enumerate() {
            tracker.track(key, scope.clone()).unwrap();
        }

        tracker.release_all_scopes().unwrap();

        assert!(tracker.is_empty());
        assert!(scopes.iter().all(|scope| scope.is_disposed()));
    }
}
