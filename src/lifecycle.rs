use alloc::sync::Arc;

use crate::any::Instance;

/// Called once after every injection of a fresh instance has been done.
pub trait Initializable: Send + Sync + 'static {
    fn initialize(&self) -> anyhow::Result<()>;
}

/// Started right after initialization and stopped right before the instance is destroyed.
pub trait Startable: Send + Sync + 'static {
    fn start(&self) -> anyhow::Result<()>;

    fn stop(&self) -> anyhow::Result<()>;
}

/// Released when the scope tracking the instance is disposed.
pub trait Disposable: Send + Sync + 'static {
    fn dispose(&self) -> anyhow::Result<()>;
}

pub(crate) type Hook = Arc<dyn Fn(&Instance) -> anyhow::Result<()> + Send + Sync>;

/// Lifecycle capabilities of a type, captured ahead of time so activation doesn't need to know the concrete type.
#[derive(Clone, Default)]
pub struct Lifecycle {
    pub(crate) initialize: Option<Hook>,
    pub(crate) start: Option<Hook>,
    pub(crate) stop: Option<Hook>,
    pub(crate) dispose: Option<Hook>,
}

impl Lifecycle {
    #[inline]
    #[must_use]
    pub const fn is_initializable(&self) -> bool {
        self.initialize.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_startable(&self) -> bool {
        self.start.is_some()
    }

    #[inline]
    #[must_use]
    pub const fn is_disposable(&self) -> bool {
        self.dispose.is_some()
    }

    pub(crate) fn set_initializable<T: Initializable>(&mut self) {
        self.initialize = Some(hook::<T>(|value| value.initialize()));
    }

    pub(crate) fn set_startable<T: Startable>(&mut self) {
        self.start = Some(hook::<T>(|value| value.start()));
        self.stop = Some(hook::<T>(|value| value.stop()));
    }

    pub(crate) fn set_disposable<T: Disposable>(&mut self) {
        self.dispose = Some(hook::<T>(|value| value.dispose()));
    }
}

fn hook<T: Send + Sync + 'static>(call: fn(&T) -> anyhow::Result<()>) -> Hook {
    Arc::new(move |instance: &Instance| match instance.downcast_ref::<T>() {
        Some(value) => call(value),
        None => Err(anyhow::anyhow!(
            "lifecycle hook expects {}, got another type",
            core::any::type_name::<T>()
        )),
    })
}

#[cfg(test)]
mod tests {
    use super::{Disposable, Initializable, Lifecycle, Startable};
    use crate::any::instance;

    use core::sync::atomic::{AtomicU8, Ordering};

    #[derive(Default)]
    struct Engine {
        calls: AtomicU8,
    }

    impl Initializable for Engine {
        fn initialize(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Startable for Engine {
        fn start(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(10, Ordering::SeqCst);
            Ok(())
        }

        fn stop(&self) -> anyhow::Result<()> {
            self.calls.fetch_add(100, Ordering::SeqCst);
            Ok(())
        }
    }

    impl Disposable for Engine {
        fn dispose(&self) -> anyhow::Result<()> {
            Err(anyhow::anyhow!("engine is already gone"))
        }
    }

    #[test]
    fn test_hooks_call_through() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.set_initializable::<Engine>();
        lifecycle.set_startable::<Engine>();
        lifecycle.set_disposable::<Engine>();

        let engine = instance(Engine::default());
        (lifecycle.initialize.as_ref().unwrap())(&engine).unwrap();
        (lifecycle.start.as_ref().unwrap())(&engine).unwrap();
        (lifecycle.stop.as_ref().unwrap())(&engine).unwrap();
        assert!((lifecycle.dispose.as_ref().unwrap())(&engine).is_err());

        assert_eq!(engine.downcast_ref::<Engine>().unwrap().calls.load(Ordering::SeqCst), 111);
    }

    #[test]
    fn test_hook_rejects_foreign_type() {
        let mut lifecycle = Lifecycle::default();
        lifecycle.set_initializable::<Engine>();

        assert!(lifecycle.is_initializable());
        assert!(!lifecycle.is_startable());
        assert!((lifecycle.initialize.as_ref().unwrap())(&instance(1u8)).is_err());
    }
}
