use alloc::{string::ToString, sync::Arc, vec::Vec};
use tracing::{debug, error};

use super::Binding;
use crate::{
    errors::{ActivationErrorKind, ConfigurationErrorKind},
    kernel::KernelComponents,
    provider::StandardProvider,
    request::Request,
};

/// Picks the single binding applicable to a request.
pub trait BindingSelector: Send + Sync {
    /// Returns `None` only for optional requests nothing applies to.
    ///
    /// # Errors
    /// Returns an error if no binding or more than one binding applies to a required request.
    fn select(&self, kernel: &KernelComponents, request: &Request) -> Result<Option<Arc<Binding>>, ActivationErrorKind>;
}

/// Default selection:
/// - a single matching conditional binding is used,
/// - otherwise the default binding is used if the service has one,
/// - otherwise several matches are ambiguous and no match at all is missing.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardBindingSelector;

impl StandardBindingSelector {
    fn implicit_binding(kernel: &KernelComponents, request: &Request) -> Option<Arc<Binding>> {
        if !kernel.config.implicit_self_binding {
            return None;
        }
        let service = request.service();
        let descriptor = kernel.introspector.describe(&service)?;
        if descriptor.constructors(kernel.config.inject_non_public).next().is_none() {
            return None;
        }

        Some(kernel.bindings.add_implicit(service, || {
            Binding::new(service).with_provider(StandardProvider::new(service)).implicit()
        }))
    }

    fn missing(request: &Request) -> Result<Option<Arc<Binding>>, ActivationErrorKind> {
        if request.is_optional() {
            debug!("No binding for optional request");
            return Ok(None);
        }

        let err = ActivationErrorKind::NoMatchingBinding {
            service: request.service(),
            target: request.target().map(ToString::to_string),
        };
        error!("{}", err);
        Err(err)
    }
}

impl BindingSelector for StandardBindingSelector {
    fn select(&self, kernel: &KernelComponents, request: &Request) -> Result<Option<Arc<Binding>>, ActivationErrorKind> {
        let Some(bindings) = kernel.bindings.get_bindings(request.service()) else {
            if let Some(binding) = Self::implicit_binding(kernel, request) {
                return Ok(Some(binding));
            }
            return Self::missing(request);
        };

        let (conditional, defaults): (Vec<_>, Vec<_>) = bindings.into_iter().partition(|binding| !binding.is_default());
        let mut matches: Vec<_> = conditional.into_iter().filter(|binding| binding.matches(request)).collect();

        if matches.len() == 1 {
            debug!("Conditional binding matched");
            return Ok(matches.pop());
        }

        match defaults.len() {
            0 => {}
            1 => {
                debug!(conditional_matches = matches.len(), "Default binding selected");
                return Ok(defaults.into_iter().next());
            }
            count => {
                let err = ConfigurationErrorKind::MultipleDefaultBindings {
                    service: request.service(),
                    count,
                };
                error!("{}", err);
                return Err(err.into());
            }
        }

        if matches.is_empty() {
            return Self::missing(request);
        }

        let err = ActivationErrorKind::AmbiguousBinding {
            service: request.service(),
            matches: matches.len(),
        };
        error!("{}", err);
        Err(err)
    }
}
