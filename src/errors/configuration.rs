use alloc::{string::String, vec::Vec};

use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum ConfigurationErrorKind {
    #[error("Binding for {service} has no provider")]
    NoProvider { service: TypeInfo },
    #[error("Service {service} has {count} default bindings, at most one binding without a condition is allowed")]
    MultipleDefaultBindings { service: TypeInfo, count: usize },
    #[error("Type {ty} has {count} constructors marked for injection")]
    MultipleInjectionConstructors { ty: TypeInfo, count: usize },
    #[error(
        "Type {ty} has {candidates} candidate constructors, none is marked for injection and no parameterless constructor exists"
    )]
    NoInjectionConstructor { ty: TypeInfo, candidates: usize },
    #[error("Generic service {service} was requested without type arguments")]
    GenericArgumentsMissing { service: TypeInfo },
    #[error("Generic service {service} can't be closed over [{}]: {reason}", format_types(.arguments))]
    GenericConstraint {
        service: TypeInfo,
        arguments: Vec<TypeInfo>,
        reason: String,
    },
    #[error("Type {ty} requires a proxy, but no proxy factory is registered in the kernel")]
    MissingProxyFactory { ty: TypeInfo },
    #[error("Method {method} of {ty} is injected, but has no injector to be called with")]
    NoMethodInjector { ty: TypeInfo, method: &'static str },
    #[error("Plan for {ty} has no behavior after planning")]
    NoBehavior { ty: TypeInfo },
}

fn format_types(types: &[TypeInfo]) -> String {
    use core::fmt::Write as _;

    let mut out = String::new();
    for (index, ty) in types.iter().enumerate() {
        if index > 0 {
            out.push_str(", ");
        }
        let _ = write!(out, "{ty}");
    }
    out
}
