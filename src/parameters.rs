use alloc::{borrow::Cow, sync::Arc, vec::Vec};

use crate::{
    any::{instance, Instance},
    context::Context,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum ParameterKind {
    ConstructorArgument,
    PropertyValue,
    FieldValue,
    MethodArgument,
}

#[derive(Clone)]
pub enum ParameterValue {
    Value(Instance),
    Callback(Arc<dyn Fn(&Context) -> Instance + Send + Sync>),
}

impl ParameterValue {
    #[inline]
    #[must_use]
    pub fn get(&self, context: &Context) -> Instance {
        match self {
            ParameterValue::Value(value) => value.clone(),
            ParameterValue::Callback(callback) => callback(context),
        }
    }
}

/// Overrides the default resolution of an argument, a property, a field or a method argument by name.
#[derive(Clone)]
pub struct Parameter {
    pub kind: ParameterKind,
    pub name: Cow<'static, str>,
    pub value: ParameterValue,
    /// Whether the parameter applies to every descendant of the context it was given to.
    pub inherited: bool,
}

impl Parameter {
    #[inline]
    #[must_use]
    pub fn new<T: Send + Sync + 'static>(kind: ParameterKind, name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self {
            kind,
            name: name.into(),
            value: ParameterValue::Value(instance(value)),
            inherited: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn from_callback(
        kind: ParameterKind,
        name: impl Into<Cow<'static, str>>,
        callback: impl Fn(&Context) -> Instance + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            name: name.into(),
            value: ParameterValue::Callback(Arc::new(callback)),
            inherited: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn constructor_argument<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::new(ParameterKind::ConstructorArgument, name, value)
    }

    #[inline]
    #[must_use]
    pub fn property_value<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::new(ParameterKind::PropertyValue, name, value)
    }

    #[inline]
    #[must_use]
    pub fn field_value<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::new(ParameterKind::FieldValue, name, value)
    }

    #[inline]
    #[must_use]
    pub fn method_argument<T: Send + Sync + 'static>(name: impl Into<Cow<'static, str>>, value: T) -> Self {
        Self::new(ParameterKind::MethodArgument, name, value)
    }

    #[inline]
    #[must_use]
    pub fn inherited(mut self) -> Self {
        self.inherited = true;
        self
    }
}

#[derive(Clone, Default)]
pub struct Parameters {
    items: Vec<Parameter>,
}

impl Parameters {
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { items: Vec::new() }
    }

    #[inline]
    #[must_use]
    pub fn with(mut self, parameter: Parameter) -> Self {
        self.add(parameter);
        self
    }

    /// Adds the parameter, replacing one of the same kind and name.
    pub fn add(&mut self, parameter: Parameter) {
        match self
            .items
            .iter_mut()
            .find(|item| item.kind == parameter.kind && item.name == parameter.name)
        {
            Some(item) => *item = parameter,
            None => self.items.push(parameter),
        }
    }

    #[inline]
    #[must_use]
    pub fn get(&self, kind: ParameterKind, name: &str) -> Option<&Parameter> {
        self.items.iter().find(|item| item.kind == kind && item.name == name)
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Parameters that flow from a context to its children.
    #[must_use]
    pub fn inherited(&self) -> Self {
        Self {
            items: self.items.iter().filter(|item| item.inherited).cloned().collect(),
        }
    }
}

impl FromIterator<Parameter> for Parameters {
    fn from_iter<I: IntoIterator<Item = Parameter>>(iter: I) -> Self {
        let mut parameters = Self::new();
        for parameter in iter {
            parameters.add(parameter);
        }
        parameters
    }
}

#[cfg(test)]
mod tests {
    use super::{Parameter, ParameterKind, Parameters};

    #[test]
    fn test_lookup_by_kind_and_name() {
        let parameters = Parameters::new()
            .with(Parameter::constructor_argument("name", 1u8))
            .with(Parameter::property_value("name", 2u8));

        assert_eq!(parameters.len(), 2);
        assert!(parameters.get(ParameterKind::ConstructorArgument, "name").is_some());
        assert!(parameters.get(ParameterKind::PropertyValue, "name").is_some());
        assert!(parameters.get(ParameterKind::FieldValue, "name").is_none());
        assert!(parameters.get(ParameterKind::ConstructorArgument, "other").is_none());
    }

    #[test]
    fn test_add_replaces_same_key() {
        let parameters: Parameters = [
            Parameter::constructor_argument("name", 1u8),
            Parameter::constructor_argument("name", 2u8).inherited(),
        ]
        .into_iter()
        .collect();

        assert_eq!(parameters.len(), 1);
        assert!(parameters.get(ParameterKind::ConstructorArgument, "name").unwrap().inherited);
        assert_eq!(parameters.inherited().len(), 1);
    }
}
