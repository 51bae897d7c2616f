use alloc::{
    borrow::Cow,
    format,
    string::{String, ToString as _},
    sync::Weak,
    vec::Vec,
};
use core::fmt::{self, Display, Formatter};

use crate::{
    any::{Instance, TypeInfo},
    context::{Context, ContextInner},
    introspection::{MemberInfo, ParameterInfo},
    parameters::Parameters,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TargetKind {
    Parameter,
    Property,
    Field,
}

/// Injection point: a constructor or method parameter, a property or a field.
#[derive(Clone)]
pub struct Target {
    pub name: Cow<'static, str>,
    pub ty: TypeInfo,
    pub kind: TargetKind,
    pub declaring: Option<TypeInfo>,
    pub tag: Option<String>,
    pub optional: bool,
    pub constant: Option<Instance>,
}

impl Target {
    #[inline]
    #[must_use]
    pub fn parameter<T: ?Sized + 'static>(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            name: name.into(),
            ty: TypeInfo::of::<T>(),
            kind: TargetKind::Parameter,
            declaring: None,
            tag: None,
            optional: false,
            constant: None,
        }
    }

    #[must_use]
    pub fn from_parameter(declaring: TypeInfo, parameter: &ParameterInfo) -> Self {
        Self {
            name: Cow::Borrowed(parameter.name),
            ty: parameter.ty,
            kind: TargetKind::Parameter,
            declaring: Some(declaring),
            tag: parameter.markers.tag.clone(),
            optional: parameter.markers.optional,
            constant: parameter.markers.constant.clone(),
        }
    }

    #[must_use]
    pub fn from_member(declaring: TypeInfo, kind: TargetKind, member: &MemberInfo) -> Self {
        Self {
            name: Cow::Borrowed(member.name),
            ty: member.ty,
            kind,
            declaring: Some(declaring),
            tag: member.markers.tag.clone(),
            optional: member.markers.optional,
            constant: member.markers.constant.clone(),
        }
    }

    #[inline]
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tag.as_deref() == Some(tag)
    }
}

impl Display for Target {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.declaring {
            Some(declaring) => write!(f, "{declaring}.{}: {}", self.name, self.ty),
            None => write!(f, "{}: {}", self.name, self.ty),
        }
    }
}

/// What is being asked for: the service, the injection point and the context it is asked from.
///
/// Binding conditions are evaluated against the request a context is about to be created for.
#[derive(Clone)]
pub struct Request {
    pub(crate) service: TypeInfo,
    pub(crate) target: Option<Target>,
    pub(crate) parent: Option<Weak<ContextInner>>,
    pub(crate) depth: usize,
    pub(crate) parameters: Parameters,
    pub(crate) generic_arguments: Vec<TypeInfo>,
    pub(crate) optional: bool,
}

impl Request {
    #[inline]
    #[must_use]
    pub fn new(service: TypeInfo) -> Self {
        Self {
            service,
            target: None,
            parent: None,
            depth: 0,
            parameters: Parameters::new(),
            generic_arguments: Vec::new(),
            optional: false,
        }
    }

    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self::new(TypeInfo::of::<T>())
    }

    /// Request for a dependency of the context being activated.
    #[must_use]
    pub fn child(parent: &Context, target: &Target) -> Self {
        Self {
            service: target.ty,
            target: Some(target.clone()),
            parent: Some(parent.downgrade()),
            depth: parent.request().depth + 1,
            parameters: parent.request().parameters.inherited(),
            generic_arguments: Vec::new(),
            optional: target.optional,
        }
    }

    #[inline]
    #[must_use]
    pub fn with_parameters(mut self, parameters: Parameters) -> Self {
        self.parameters = parameters;
        self
    }

    #[inline]
    #[must_use]
    pub fn with_generic_arguments(mut self, arguments: Vec<TypeInfo>) -> Self {
        self.generic_arguments = arguments;
        self
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[inline]
    #[must_use]
    pub const fn service(&self) -> TypeInfo {
        self.service
    }

    #[inline]
    #[must_use]
    pub const fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    /// Context whose dependency is being requested, if it is still alive.
    #[inline]
    #[must_use]
    pub fn parent(&self) -> Option<Context> {
        self.parent.as_ref().and_then(Context::upgrade)
    }

    #[inline]
    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.depth == 0
    }

    #[inline]
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    #[must_use]
    pub const fn parameters(&self) -> &Parameters {
        &self.parameters
    }

    #[inline]
    #[must_use]
    pub fn generic_arguments(&self) -> &[TypeInfo] {
        &self.generic_arguments
    }

    #[inline]
    #[must_use]
    pub const fn is_optional(&self) -> bool {
        self.optional
    }

    #[must_use]
    pub fn describe(&self) -> String {
        match &self.target {
            Some(target) => format!("{target}"),
            None => self.service.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Request, Target, TargetKind};
    use crate::{
        any::TypeInfo,
        introspection::ParameterInfo,
        parameters::{Parameter, Parameters},
    };

    use alloc::string::ToString as _;

    struct Samurai;
    struct Sword;

    #[test]
    fn test_target_from_parameter() {
        let parameter = ParameterInfo::of::<Sword>("weapon").tagged("sharp").optional();
        let target = Target::from_parameter(TypeInfo::of::<Samurai>(), &parameter);

        assert_eq!(target.kind, TargetKind::Parameter);
        assert!(target.has_tag("sharp"));
        assert!(!target.has_tag("blunt"));
        assert!(target.optional);
        assert_eq!(target.to_string(), "Samurai.weapon: Sword");
    }

    #[test]
    fn test_root_request() {
        let request = Request::of::<Samurai>()
            .with_parameters(Parameters::new().with(Parameter::constructor_argument("name", 1u8)))
            .optional();

        assert!(request.is_root());
        assert!(request.parent().is_none());
        assert!(request.target().is_none());
        assert!(request.is_optional());
        assert_eq!(request.parameters().len(), 1);
        assert_eq!(request.describe(), "Samurai");
    }
}
