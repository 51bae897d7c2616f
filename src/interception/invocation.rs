use alloc::sync::Arc;

use super::{CallRequest, Interceptor};
use crate::any::Instance;

pub struct Invocation<'a> {
    request: &'a CallRequest,
    interceptors: &'a [Arc<dyn Interceptor>],
    index: usize,
    target: &'a mut dyn FnMut(&CallRequest) -> anyhow::Result<Option<Instance>>,
}

impl<'a> Invocation<'a> {
    #[inline]
    #[must_use]
    pub fn new(
        request: &'a CallRequest,
        interceptors: &'a [Arc<dyn Interceptor>],
        target: &'a mut dyn FnMut(&CallRequest) -> anyhow::Result<Option<Instance>>,
    ) -> Self {
        Self {
            request,
            interceptors,
            index: 0,
            target,
        }
    }

    #[inline]
    #[must_use]
    pub const fn request(&self) -> &CallRequest {
        self.request
    }

    /// Calls the next interceptor, or the target once every interceptor has run.
    ///
    /// # Errors
    /// Returns the first error raised by an interceptor or the target.
    pub fn proceed(&mut self) -> anyhow::Result<Option<Instance>> {
        let interceptors = self.interceptors;
        match interceptors.get(self.index) {
            Some(interceptor) => {
                self.index += 1;
                interceptor.intercept(self)
            }
            None => (self.target)(self.request),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Invocation;
    use crate::{
        any::{instance, Instance},
        interception::{CallRequest, Interceptor, MethodId},
    };

    use alloc::{sync::Arc, vec, vec::Vec};
    use parking_lot::Mutex;

    struct Service;

    #[test]
    fn test_proceed_runs_interceptors_in_order() {
        let trace = Arc::new(Mutex::new(Vec::new()));
        let first: Arc<dyn Interceptor> = Arc::new({
            let trace = trace.clone();
            move |invocation: &mut Invocation<'_>| {
                trace.lock().push("first:before");
                let result = invocation.proceed();
                trace.lock().push("first:after");
                result
            }
        });
        let second: Arc<dyn Interceptor> = Arc::new({
            let trace = trace.clone();
            move |invocation: &mut Invocation<'_>| {
                trace.lock().push("second");
                invocation.proceed()
            }
        });
        let interceptors = vec![first, second];
        let request = CallRequest::new(instance(Service), MethodId::of::<Service>("run"));

        let mut target = {
            let trace = trace.clone();
            move |_: &CallRequest| -> anyhow::Result<Option<Instance>> {
                trace.lock().push("target");
                Ok(Some(instance(7u32)))
            }
        };
        let result = Invocation::new(&request, &interceptors, &mut target).proceed().unwrap();

        assert_eq!(*result.unwrap().downcast_ref::<u32>().unwrap(), 7);
        assert_eq!(*trace.lock(), ["first:before", "second", "target", "first:after"]);
    }

    #[test]
    fn test_interceptor_can_short_circuit() {
        let deny: Arc<dyn Interceptor> = Arc::new(|_: &mut Invocation<'_>| Err(anyhow::anyhow!("denied")));
        let interceptors = vec![deny];
        let request = CallRequest::new(instance(Service), MethodId::of::<Service>("run"));

        let mut called = false;
        let mut target = |_: &CallRequest| -> anyhow::Result<Option<Instance>> {
            called = true;
            Ok(None)
        };
        let result = Invocation::new(&request, &interceptors, &mut target).proceed();

        assert!(result.is_err());
        assert!(!called);
    }
}
