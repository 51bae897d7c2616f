use alloc::{collections::BTreeMap, string::ToString as _, sync::Arc};
use core::any::{type_name, TypeId};
use parking_lot::RwLock;
use tracing::{debug, error};

use crate::{
    any::{instance, instance_type_id, Instance},
    errors::ActivationErrorKind,
    request::Target,
};

type Converter = Arc<dyn Fn(Instance) -> anyhow::Result<Instance> + Send + Sync>;

/// Converts resolved values into the declared type of the target they are injected into.
#[derive(Default)]
pub struct Conversions {
    converters: RwLock<BTreeMap<(TypeId, TypeId), Converter>>,
}

impl Conversions {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<From, To, F>(&self, convert: F)
    where
        From: Send + Sync + 'static,
        To: Send + Sync + 'static,
        F: Fn(&From) -> anyhow::Result<To> + Send + Sync + 'static,
    {
        let converter: Converter = Arc::new(move |value: Instance| {
            let value = value
                .downcast_ref::<From>()
                .ok_or_else(|| anyhow::anyhow!("converter expects {}", type_name::<From>()))?;
            convert(value).map(instance)
        });
        self.converters
            .write()
            .insert((TypeId::of::<From>(), TypeId::of::<To>()), converter);
    }

    #[inline]
    #[must_use]
    pub fn with<From, To, F>(self, convert: F) -> Self
    where
        From: Send + Sync + 'static,
        To: Send + Sync + 'static,
        F: Fn(&From) -> anyhow::Result<To> + Send + Sync + 'static,
    {
        self.register::<From, To, F>(convert);
        self
    }

    /// Returns the value unchanged if it already has the target type.
    ///
    /// # Errors
    /// Returns [`ActivationErrorKind::Conversion`] if no converter is registered or it fails.
    pub fn convert(&self, value: Instance, target: &Target) -> Result<Instance, ActivationErrorKind> {
        let from = instance_type_id(&value);
        if from == target.ty.id {
            return Ok(value);
        }

        let Some(converter) = self.converters.read().get(&(from, target.ty.id)).cloned() else {
            let err = conversion_error(from, target, "no converter registered".to_string());
            error!("{}", err);
            return Err(err);
        };

        match converter(value) {
            Ok(converted) => {
                debug!(member = &*target.name, to = target.ty.name, "Converted");
                Ok(converted)
            }
            Err(err) => {
                let err = conversion_error(from, target, err.to_string());
                error!("{}", err);
                Err(err)
            }
        }
    }
}

fn conversion_error(from: TypeId, target: &Target, reason: alloc::string::String) -> ActivationErrorKind {
    ActivationErrorKind::Conversion {
        from,
        to: target.ty,
        target: target.name.to_string(),
        reason,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::Conversions;
    use crate::{any::instance, errors::ActivationErrorKind, request::Target};

    use alloc::string::{String, ToString as _};
    use tracing_test::traced_test;

    #[test]
    #[traced_test]
    fn test_identity_passes_through() {
        let conversions = Conversions::new();
        let value = instance(5u32);

        let converted = conversions.convert(value.clone(), &Target::parameter::<u32>("count")).unwrap();
        assert_eq!(*converted.downcast_ref::<u32>().unwrap(), 5);
    }

    #[test]
    #[traced_test]
    fn test_registered_converter() {
        let conversions = Conversions::new().with::<u32, String, _>(|value| Ok(value.to_string()));

        let converted = conversions
            .convert(instance(5u32), &Target::parameter::<String>("label"))
            .unwrap();
        assert_eq!(converted.downcast_ref::<String>().unwrap(), "5");
    }

    #[test]
    #[traced_test]
    fn test_missing_or_failing_converter() {
        let conversions = Conversions::new().with::<i64, u8, _>(|value| Ok(u8::try_from(*value)?));

        assert!(matches!(
            conversions.convert(instance(5u32), &Target::parameter::<String>("label")),
            Err(ActivationErrorKind::Conversion { .. })
        ));
        assert!(matches!(
            conversions.convert(instance(1000i64), &Target::parameter::<u8>("small")),
            Err(ActivationErrorKind::Conversion { .. })
        ));
        assert!(conversions.convert(instance(10i64), &Target::parameter::<u8>("small")).is_ok());
    }
}
