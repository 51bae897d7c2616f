use alloc::{sync::Arc, vec::Vec};
use core::fmt::{self, Debug, Formatter};

use crate::{
    introspection::{ConstructorInfo, MemberInfo, MethodInfo, MethodInjector},
    request::Target,
    resolution::Resolver,
};

/// One value to inject: where it goes and how it's resolved.
#[derive(Clone)]
pub struct Argument {
    pub target: Target,
    pub resolver: Arc<dyn Resolver>,
    pub optional: bool,
}

impl Argument {
    #[inline]
    #[must_use]
    pub fn new(target: Target, resolver: Arc<dyn Resolver>) -> Self {
        Self {
            optional: target.optional,
            target,
            resolver,
        }
    }
}

impl Debug for Argument {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Argument")
            .field("target", &format_args!("{}", self.target))
            .field("resolver", &self.resolver.name())
            .field("optional", &self.optional)
            .finish()
    }
}

#[derive(Clone)]
pub struct ConstructorDirective {
    pub constructor: ConstructorInfo,
    pub arguments: Vec<Argument>,
}

/// Injection of a property or a field.
#[derive(Clone)]
pub struct MemberDirective {
    pub member: MemberInfo,
    pub argument: Argument,
}

#[derive(Clone)]
pub struct MethodDirective {
    pub method: MethodInfo,
    pub injector: MethodInjector,
    pub arguments: Vec<Argument>,
}

#[derive(Clone)]
pub enum Directive {
    Constructor(ConstructorDirective),
    Property(MemberDirective),
    Field(MemberDirective),
    Method(MethodDirective),
    /// Presence means the instance is wrapped in a proxy.
    Proxy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DirectiveKey {
    Constructor,
    Property(&'static str),
    Field(&'static str),
    Method(&'static str),
    Proxy,
}

impl Directive {
    #[must_use]
    pub fn key(&self) -> DirectiveKey {
        match self {
            Self::Constructor(_) => DirectiveKey::Constructor,
            Self::Property(directive) => DirectiveKey::Property(directive.member.name),
            Self::Field(directive) => DirectiveKey::Field(directive.member.name),
            Self::Method(directive) => DirectiveKey::Method(directive.method.name),
            Self::Proxy => DirectiveKey::Proxy,
        }
    }
}

/// Directives in insertion order, one per key.
#[derive(Clone, Default)]
pub struct DirectiveCollection {
    items: Vec<Directive>,
}

impl DirectiveCollection {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds the directive, replacing in place the one with the same key.
    pub fn add(&mut self, directive: Directive) {
        let key = directive.key();
        match self.items.iter_mut().find(|existing| existing.key() == key) {
            Some(existing) => *existing = directive,
            None => self.items.push(directive),
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Directive> {
        self.items.iter()
    }

    #[must_use]
    pub fn constructor(&self) -> Option<&ConstructorDirective> {
        self.items.iter().find_map(|directive| match directive {
            Directive::Constructor(constructor) => Some(constructor),
            _ => None,
        })
    }

    pub fn properties(&self) -> impl Iterator<Item = &MemberDirective> {
        self.items.iter().filter_map(|directive| match directive {
            Directive::Property(property) => Some(property),
            _ => None,
        })
    }

    pub fn fields(&self) -> impl Iterator<Item = &MemberDirective> {
        self.items.iter().filter_map(|directive| match directive {
            Directive::Field(field) => Some(field),
            _ => None,
        })
    }

    pub fn methods(&self) -> impl Iterator<Item = &MethodDirective> {
        self.items.iter().filter_map(|directive| match directive {
            Directive::Method(method) => Some(method),
            _ => None,
        })
    }

    #[must_use]
    pub fn has_proxy(&self) -> bool {
        self.items.iter().any(|directive| matches!(directive, Directive::Proxy))
    }
}

#[cfg(test)]
mod tests {
    use super::{Argument, Directive, DirectiveCollection, DirectiveKey, MemberDirective};
    use crate::{
        any::{instance, TypeInfo},
        introspection::MemberInfo,
        request::{Target, TargetKind},
        resolution::ConstantResolver,
    };

    use alloc::sync::Arc;

    struct Samurai;

    fn property(name: &'static str, value: u32) -> Directive {
        let member = MemberInfo::of::<Samurai, u32, _>(name, |_, _| Ok(()));
        let target = Target::from_member(TypeInfo::of::<Samurai>(), TargetKind::Property, &member);
        Directive::Property(MemberDirective {
            argument: Argument::new(target, Arc::new(ConstantResolver::new(instance(value)))),
            member,
        })
    }

    #[test]
    fn test_same_key_replaces_in_place() {
        let mut directives = DirectiveCollection::new();
        directives.add(property("first", 1));
        directives.add(Directive::Proxy);
        directives.add(property("second", 2));
        directives.add(property("first", 3));
        directives.add(Directive::Proxy);

        let keys: alloc::vec::Vec<_> = directives.iter().map(Directive::key).collect();
        assert_eq!(
            keys,
            [
                DirectiveKey::Property("first"),
                DirectiveKey::Proxy,
                DirectiveKey::Property("second")
            ]
        );
        assert!(directives.has_proxy());
        assert!(directives.constructor().is_none());
        assert_eq!(directives.properties().count(), 2);
    }
}
