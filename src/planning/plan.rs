use alloc::sync::Arc;
use tracing::error;

use super::{Directive, DirectiveCollection};
use crate::{
    any::TypeInfo,
    behavior::Behavior,
    errors::ConfigurationErrorKind,
    introspection::TypeDescriptor,
};

/// Recipe for activating a concrete type through one binding. Immutable once built.
pub struct ActivationPlan {
    pub ty: TypeInfo,
    pub behavior: Arc<dyn Behavior>,
    pub directives: DirectiveCollection,
    pub descriptor: Option<Arc<TypeDescriptor>>,
}

/// Plan under construction, filled by the planning strategies.
pub struct PlanDraft {
    pub ty: TypeInfo,
    pub behavior: Option<Arc<dyn Behavior>>,
    pub directives: DirectiveCollection,
    pub descriptor: Option<Arc<TypeDescriptor>>,
}

impl PlanDraft {
    #[inline]
    #[must_use]
    pub fn new(ty: TypeInfo, descriptor: Option<Arc<TypeDescriptor>>) -> Self {
        Self {
            ty,
            behavior: None,
            directives: DirectiveCollection::new(),
            descriptor,
        }
    }

    #[inline]
    pub fn add(&mut self, directive: Directive) {
        self.directives.add(directive);
    }

    /// # Errors
    /// Returns [`ConfigurationErrorKind::NoBehavior`] if no strategy chose a behavior.
    pub fn finish(self) -> Result<ActivationPlan, ConfigurationErrorKind> {
        let Some(behavior) = self.behavior else {
            let err = ConfigurationErrorKind::NoBehavior { ty: self.ty };
            error!("{}", err);
            return Err(err);
        };

        Ok(ActivationPlan {
            ty: self.ty,
            behavior,
            directives: self.directives,
            descriptor: self.descriptor,
        })
    }
}
