use alloc::{string::String, sync::Arc};
use core::fmt::{self, Debug, Formatter};

use crate::request::Request;

/// Predicate gating a binding, evaluated against the request a context is about to be created for.
#[derive(Clone)]
pub struct Condition(Arc<dyn Fn(&Request) -> bool + Send + Sync>);

impl Debug for Condition {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("Condition")
    }
}

impl Condition {
    #[inline]
    #[must_use]
    pub fn custom(predicate: impl Fn(&Request) -> bool + Send + Sync + 'static) -> Self {
        Self(Arc::new(predicate))
    }

    /// Matches when the injection point carries the tag.
    #[must_use]
    pub fn when_target_tagged(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::custom(move |request| request.target().is_some_and(|target| target.has_tag(&tag)))
    }

    /// Matches when the dependency is injected into a `T`.
    #[must_use]
    pub fn when_injected_into<T: ?Sized + 'static>() -> Self {
        Self::custom(|request| {
            request
                .target()
                .and_then(|target| target.declaring)
                .is_some_and(|declaring| declaring.is::<T>())
        })
    }

    /// Matches top-level requests only.
    #[must_use]
    pub fn when_root() -> Self {
        Self::custom(Request::is_root)
    }

    /// Matches when the requesting context was itself injected into a target carrying the tag.
    #[must_use]
    pub fn when_parent_tagged(tag: impl Into<String>) -> Self {
        let tag = tag.into();
        Self::custom(move |request| {
            request.parent().is_some_and(|parent| {
                parent
                    .request()
                    .target()
                    .is_some_and(|target| target.has_tag(&tag))
            })
        })
    }

    #[inline]
    #[must_use]
    pub fn matches(&self, request: &Request) -> bool {
        (self.0)(request)
    }
}
