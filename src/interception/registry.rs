use alloc::{
    collections::{BTreeMap, BTreeSet},
    sync::Arc,
    vec::Vec,
};
use core::any::TypeId;
use parking_lot::Mutex;
use tracing::debug;

use super::{CallRequest, Interceptor, Invocation, MethodId};
use crate::any::Instance;

pub type InterceptorFactory = Arc<dyn Fn(&CallRequest) -> Arc<dyn Interceptor> + Send + Sync>;
pub type CallCondition = Arc<dyn Fn(&CallRequest) -> bool + Send + Sync>;

#[derive(Clone)]
struct Advice {
    sequence: u64,
    factory: InterceptorFactory,
    order: i32,
    condition: Option<CallCondition>,
    origin: Option<TypeId>,
}

#[derive(Default)]
struct AdviceState {
    statics: BTreeMap<MethodId, Vec<Advice>>,
    dynamics: Vec<Advice>,
    cache: BTreeMap<MethodId, Vec<Arc<dyn Interceptor>>>,
    next_sequence: u64,
    // Bumped by every change of the registrations, a list built under an older generation isn't cached.
    generation: u64,
    advised_types: BTreeSet<TypeId>,
}

impl AdviceState {
    fn next_sequence(&mut self) -> u64 {
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        sequence
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.cache.clear();
    }
}

/// Stores interception registrations and answers which interceptors apply to a call.
///
/// Results are cached per method only while every registration is static.
/// Once a dynamic registration exists, every request is evaluated again,
/// because dynamic conditions may depend on per-call state.
#[derive(Default)]
pub struct AdviceRegistry {
    state: Mutex<AdviceState>,
}

impl AdviceRegistry {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers an interceptor for exactly one method.
    pub fn register_static(&self, factory: InterceptorFactory, order: i32, method: MethodId) {
        self.add_static(factory, order, method, None);
    }

    /// Registers an interceptor for every call accepted by `condition`.
    pub fn register_dynamic(&self, factory: InterceptorFactory, order: i32, condition: CallCondition) {
        let mut state = self.state.lock();
        let sequence = state.next_sequence();
        state.dynamics.push(Advice {
            sequence,
            factory,
            order,
            condition: Some(condition),
            origin: None,
        });
        state.invalidate();
        debug!(order, "Dynamic advice registered, interceptor cache disabled");
    }

    #[must_use]
    pub fn has_dynamic(&self) -> bool {
        !self.state.lock().dynamics.is_empty()
    }

    /// Returns the interceptors for the call, sorted ascending by order, ties in registration order.
    #[must_use]
    pub fn get_interceptors(&self, request: &CallRequest) -> Vec<Arc<dyn Interceptor>> {
        let (statics, dynamics, generation) = {
            let state = self.state.lock();
            if state.dynamics.is_empty() {
                if let Some(interceptors) = state.cache.get(&request.method) {
                    debug!(method = %request.method, "Interceptors found in cache");
                    return interceptors.clone();
                }
            }
            (
                state.statics.get(&request.method).cloned().unwrap_or_default(),
                state.dynamics.clone(),
                state.generation,
            )
        };

        // Conditions and factories are user code, so they run without the lock.
        let cacheable = dynamics.is_empty();
        let mut matched = statics;
        for advice in dynamics {
            if advice.condition.as_ref().is_some_and(|condition| condition(request)) {
                matched.push(advice);
            }
        }
        matched.sort_by_key(|advice| (advice.order, advice.sequence));

        let interceptors: Vec<_> = matched.iter().map(|advice| (advice.factory)(request)).collect();

        if cacheable {
            let mut state = self.state.lock();
            if state.generation == generation {
                state.cache.insert(request.method, interceptors.clone());
                debug!(method = %request.method, "Interceptors cached");
            }
        }

        interceptors
    }

    /// Runs the call through its interceptors, the target being called last.
    ///
    /// # Errors
    /// Returns the first error raised by an interceptor or the target.
    pub fn invoke(
        &self,
        request: &CallRequest,
        mut target: impl FnMut(&CallRequest) -> anyhow::Result<Option<Instance>>,
    ) -> anyhow::Result<Option<Instance>> {
        let interceptors = self.get_interceptors(request);
        Invocation::new(request, &interceptors, &mut target).proceed()
    }

    /// Marks the type as advised, returns `false` if it was already.
    pub(crate) fn mark_advised(&self, ty: TypeId) -> bool {
        self.state.lock().advised_types.insert(ty)
    }

    pub(crate) fn register_declared(&self, factory: InterceptorFactory, order: i32, method: MethodId, origin: TypeId) {
        self.add_static(factory, order, method, Some(origin));
    }

    /// Forgets registrations declared by markers on the type.
    pub(crate) fn release_declared(&self, ty: TypeId) {
        let mut state = self.state.lock();
        if !state.advised_types.remove(&ty) {
            return;
        }
        for advices in state.statics.values_mut() {
            advices.retain(|advice| advice.origin != Some(ty));
        }
        state.statics.retain(|_, advices| !advices.is_empty());
        state.invalidate();
    }

    fn add_static(&self, factory: InterceptorFactory, order: i32, method: MethodId, origin: Option<TypeId>) {
        let mut state = self.state.lock();
        let sequence = state.next_sequence();
        state.statics.entry(method).or_default().push(Advice {
            sequence,
            factory,
            order,
            condition: None,
            origin,
        });
        state.generation += 1;
        state.cache.remove(&method);
        debug!(%method, order, "Static advice registered");
    }
}
