use alloc::{string::String, vec::Vec};
use core::any::TypeId;

use super::{ConfigurationErrorKind, OperationalErrorKind};
use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ActivationErrorKind {
    #[error("No matching binding for {service}{}", describe_target(.target.as_deref()))]
    NoMatchingBinding { service: TypeInfo, target: Option<String> },
    #[error(
        "Ambiguous binding for {service}: {matches} conditional bindings match and there is no default binding to fall back on"
    )]
    AmbiguousBinding { service: TypeInfo, matches: usize },
    #[error("Can't convert {from:?} to {to} for target {target}: {reason}")]
    Conversion {
        from: TypeId,
        to: TypeInfo,
        target: String,
        reason: String,
    },
    #[error("Incorrect instance type. Actual: {actual:?}, expected: {expected}")]
    IncorrectType { expected: TypeInfo, actual: TypeId },
    #[error("Cyclic dependency detected: {}", .chain.join(" -> "))]
    CyclicDependency { chain: Vec<&'static str> },
    #[error("Activation depth {depth} exceeded while resolving {service}")]
    DepthExceeded { service: TypeInfo, depth: usize },
    #[error("Error activating {context}: {source}")]
    Strategy {
        context: String,
        #[source]
        source: anyhow::Error,
    },
    #[error(transparent)]
    Invocation(anyhow::Error),
    #[error(transparent)]
    Configuration(#[from] ConfigurationErrorKind),
    #[error(transparent)]
    Operational(#[from] OperationalErrorKind),
}

impl ActivationErrorKind {
    /// Error raised by a user member (constructor, setter, method) with its original identity.
    #[inline]
    #[must_use]
    pub fn invocation_error(&self) -> Option<&anyhow::Error> {
        match self {
            Self::Invocation(err) => Some(err),
            _ => None,
        }
    }

    #[inline]
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(self, Self::Configuration(_))
    }
}

fn describe_target(target: Option<&str>) -> String {
    use alloc::format;

    match target {
        Some(target) => format!(" (target {target})"),
        None => String::new(),
    }
}
