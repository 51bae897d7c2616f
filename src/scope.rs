use alloc::{
    collections::BTreeSet,
    sync::{Arc, Weak},
    vec::Vec,
};
use core::sync::atomic::{AtomicU64, Ordering};
use parking_lot::Mutex;
use tracing::{debug, error, info_span};

use crate::{
    any::{instance_key, Instance, TypeInfo},
    context::Context,
    errors::{ActivationErrorKind, OperationalErrorKind},
    kernel::KernelComponents,
    parameters::Parameters,
    request::Request,
};

static NEXT_SCOPE_ID: AtomicU64 = AtomicU64::new(1);

#[derive(Default)]
struct ScopeState {
    contexts: Vec<Context>,
    keys: BTreeSet<usize>,
    children: Vec<Weak<ScopeInner>>,
    disposed: bool,
}

pub(crate) struct ScopeInner {
    id: u64,
    parent: Weak<ScopeInner>,
    kernel: Arc<KernelComponents>,
    state: Mutex<ScopeState>,
}

impl ScopeInner {
    fn dispose(&self) -> Result<(), ActivationErrorKind> {
        let (children, contexts) = {
            let mut state = self.state.lock();
            if state.disposed {
                return Ok(());
            }
            state.disposed = true;
            state.keys.clear();
            (
                core::mem::take(&mut state.children),
                core::mem::take(&mut state.contexts),
            )
        };

        let mut result = Ok(());
        let mut record = |outcome: Result<(), ActivationErrorKind>| {
            if let Err(err) = outcome {
                error!("{}", err);
                if result.is_ok() {
                    result = Err(err);
                }
            }
        };

        for child in children.iter().filter_map(Weak::upgrade) {
            record(child.dispose());
        }
        // Later registrations may depend on earlier ones, so they are released first.
        for context in contexts.iter().rev() {
            record(context.plan().behavior.release(context));
        }

        if let Some(parent) = self.parent.upgrade() {
            parent
                .state
                .lock()
                .children
                .retain(|child| child.strong_count() > 0 && !core::ptr::eq(child.as_ptr(), self));
        }

        debug!(scope = self.id, released = contexts.len(), "Scope disposed");
        result
    }

    fn ensure_active(&self) -> Result<(), OperationalErrorKind> {
        if self.state.lock().disposed {
            let err = OperationalErrorKind::ScopeDisposed { id: self.id };
            error!("{}", err);
            return Err(err);
        }
        Ok(())
    }
}

impl Drop for ScopeInner {
    fn drop(&mut self) {
        if let Err(err) = self.dispose() {
            error!("Scope {} released with error: {}", self.id, err);
        }
    }
}

/// Hierarchical container of tracked contexts, released together when the scope is disposed.
///
/// A scope is disposed explicitly with [`Scope::dispose`], by disposing its parent, or when its last handle is dropped.
#[derive(Clone)]
pub struct Scope {
    inner: Arc<ScopeInner>,
}

impl Scope {
    pub(crate) fn root(kernel: Arc<KernelComponents>) -> Self {
        Self::with_parent(kernel, Weak::new())
    }

    fn with_parent(kernel: Arc<KernelComponents>, parent: Weak<ScopeInner>) -> Self {
        let scope = Self {
            inner: Arc::new(ScopeInner {
                id: NEXT_SCOPE_ID.fetch_add(1, Ordering::Relaxed),
                parent,
                kernel,
                state: Mutex::new(ScopeState::default()),
            }),
        };
        debug!(scope = scope.inner.id, "Scope created");
        scope
    }

    #[inline]
    pub(crate) fn downgrade(&self) -> Weak<ScopeInner> {
        Arc::downgrade(&self.inner)
    }

    #[inline]
    pub(crate) fn upgrade(inner: &Weak<ScopeInner>) -> Option<Self> {
        inner.upgrade().map(|inner| Self { inner })
    }

    #[inline]
    #[must_use]
    pub fn id(&self) -> u64 {
        self.inner.id
    }

    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Scope> {
        Self::upgrade(&self.inner.parent)
    }

    /// Topmost scope of the tree.
    #[must_use]
    pub fn top(&self) -> Scope {
        let mut current = self.clone();
        while let Some(parent) = current.parent() {
            current = parent;
        }
        current
    }

    #[inline]
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.inner.state.lock().disposed
    }

    /// Number of tracked contexts.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.state.lock().contexts.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// # Errors
    /// Returns [`OperationalErrorKind::ScopeDisposed`] if the scope is disposed.
    pub fn begin_scope(&self) -> Result<Scope, OperationalErrorKind> {
        let mut state = self.inner.state.lock();
        if state.disposed {
            let err = OperationalErrorKind::ScopeDisposed { id: self.inner.id };
            error!("{}", err);
            return Err(err);
        }

        let child = Self::with_parent(self.inner.kernel.clone(), self.downgrade());
        state.children.push(child.downgrade());
        Ok(child)
    }

    /// Tracks the context by its instance. Registering the same instance again is ignored.
    ///
    /// # Errors
    /// Returns [`OperationalErrorKind::ScopeDisposed`] if the scope is disposed.
    pub fn register(&self, context: Context) -> Result<(), OperationalErrorKind> {
        let Some(instance) = context.instance() else {
            debug!("Context without instance isn't tracked");
            return Ok(());
        };

        let mut state = self.inner.state.lock();
        if state.disposed {
            let err = OperationalErrorKind::ScopeDisposed { id: self.inner.id };
            error!("{}", err);
            return Err(err);
        }
        if state.keys.insert(instance_key(&instance)) {
            state.contexts.push(context);
            debug!(scope = self.inner.id, "Context tracked");
        }
        Ok(())
    }

    #[must_use]
    pub fn contains(&self, instance: &Instance) -> bool {
        let key = instance_key(instance);
        self.inner.state.lock().contexts.iter().any(|context| context.is_keyed_by(key))
    }

    /// Releases the context tracking the instance, searching child scopes too.
    /// The instance may be the raw one, its proxy or the value handed out for the service.
    ///
    /// Returns `false` if no scope of the subtree tracks the instance.
    ///
    /// # Errors
    /// Returns the error of releasing the context through its behavior.
    pub fn release(&self, instance: &Instance) -> Result<bool, ActivationErrorKind> {
        self.release_by_key(instance_key(instance))
    }

    pub(crate) fn release_by_key(&self, key: usize) -> Result<bool, ActivationErrorKind> {
        let (context, children) = {
            let mut state = self.inner.state.lock();
            match state.contexts.iter().position(|context| context.is_keyed_by(key)) {
                Some(position) => {
                    let context = state.contexts.remove(position);
                    if let Some(instance) = context.instance() {
                        state.keys.remove(&instance_key(&instance));
                    }
                    (Some(context), Vec::new())
                }
                None => (None, state.children.clone()),
            }
        };

        if let Some(context) = context {
            context.plan().behavior.release(&context)?;
            debug!(scope = self.inner.id, "Context released");
            return Ok(true);
        }

        for child in children.iter().filter_map(|child| Self::upgrade(child)) {
            if child.release_by_key(key)? {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Disposes child scopes depth-first, releases every tracked context, then detaches from the parent.
    /// Disposing a disposed scope does nothing.
    ///
    /// # Errors
    /// Returns the first error, every context is released anyway.
    pub fn dispose(&self) -> Result<(), ActivationErrorKind> {
        self.inner.dispose()
    }

    /// Resolves a request in this scope.
    ///
    /// # Errors
    /// Returns an error if the scope is disposed or the activation fails.
    pub fn resolve(&self, request: Request) -> Result<Option<Instance>, ActivationErrorKind> {
        let span = info_span!("resolve", service = request.service().name, scope = self.inner.id);
        let _guard = span.enter();

        self.inner.kernel.resolve(self, request)
    }

    /// # Errors
    /// Returns an error if nothing is bound to `T` or the activation fails.
    pub fn get<T: Send + Sync + 'static>(&self) -> Result<Arc<T>, ActivationErrorKind> {
        self.get_with::<T>(Parameters::new())
    }

    /// Resolves `T` with per-request parameters.
    ///
    /// # Errors
    /// Returns an error if nothing is bound to `T` or the activation fails.
    pub fn get_with<T: Send + Sync + 'static>(&self, parameters: Parameters) -> Result<Arc<T>, ActivationErrorKind> {
        match self.resolve(Request::of::<T>().with_parameters(parameters))? {
            Some(value) => downcast::<T>(value),
            None => {
                let err = ActivationErrorKind::NoMatchingBinding {
                    service: TypeInfo::of::<T>(),
                    target: None,
                };
                error!("{}", err);
                Err(err)
            }
        }
    }

    /// Resolves `T`, returning `None` if nothing applies.
    ///
    /// # Errors
    /// Returns an error if the activation fails.
    pub fn try_get<T: Send + Sync + 'static>(&self) -> Result<Option<Arc<T>>, ActivationErrorKind> {
        self.resolve(Request::of::<T>().optional())?.map(downcast::<T>).transpose()
    }

    pub(crate) fn ensure_active(&self) -> Result<(), OperationalErrorKind> {
        self.inner.ensure_active()
    }

    #[inline]
    pub(crate) fn ptr_eq(&self, other: &Scope) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(value: Instance) -> Result<Arc<T>, ActivationErrorKind> {
    value.downcast::<T>().map_err(|value| {
        let err = ActivationErrorKind::IncorrectType {
            expected: TypeInfo::of::<T>(),
            actual: crate::any::instance_type_id(&value),
        };
        error!("{}", err);
        err
    })
}
