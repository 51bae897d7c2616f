use tracing::{debug, error, info, warn};

use crate::any::TypeInfo;

/// Logging facade injected into any target declared as `Logger`, tagged with the type it was injected into.
#[derive(Clone, Copy, Debug)]
pub struct Logger {
    owner: TypeInfo,
}

impl Logger {
    #[inline]
    #[must_use]
    pub const fn new(owner: TypeInfo) -> Self {
        Self { owner }
    }

    #[inline]
    #[must_use]
    pub const fn owner(&self) -> TypeInfo {
        self.owner
    }

    pub fn debug(&self, message: &str) {
        debug!(owner = self.owner.name, "{}", message);
    }

    pub fn info(&self, message: &str) {
        info!(owner = self.owner.name, "{}", message);
    }

    pub fn warn(&self, message: &str) {
        warn!(owner = self.owner.name, "{}", message);
    }

    pub fn error(&self, message: &str) {
        error!(owner = self.owner.name, "{}", message);
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Logger;
    use crate::any::TypeInfo;

    use tracing_test::traced_test;

    struct Dojo;

    #[test]
    #[traced_test]
    fn test_logs_with_owner() {
        let logger = Logger::new(TypeInfo::of::<Dojo>());
        logger.info("opened");

        assert!(logger.owner().is::<Dojo>());
        assert!(logs_contain("opened"));
        assert!(logs_contain("Dojo"));
    }
}
