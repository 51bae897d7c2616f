//! Boundary with the type introspection provider.
//!
//! Rust has no runtime reflection, so a type is described ahead of time by a [`TypeDescriptor`]:
//! its candidate constructors, properties, fields and methods, each with the declarative markers
//! and the injector closures that construct, call or assign them.

use alloc::{collections::BTreeMap, string::String, sync::Arc, vec::Vec};
use core::{any::type_name, marker::PhantomData};
use parking_lot::RwLock;

use crate::{
    any::{instance, instance_type_id, Instance, TypeInfo},
    behavior::BehaviorKind,
    interception::InterceptMarker,
    lifecycle::{Disposable, Initializable, Lifecycle, Startable},
};

pub type ConstructorInjector = Arc<dyn Fn(Arguments) -> anyhow::Result<Instance> + Send + Sync>;
pub type MethodInjector = Arc<dyn Fn(&Instance, Arguments) -> anyhow::Result<()> + Send + Sync>;
pub type MemberSetter = Arc<dyn Fn(&Instance, Instance) -> anyhow::Result<()> + Send + Sync>;

pub trait Introspector: Send + Sync {
    fn describe(&self, ty: &TypeInfo) -> Option<Arc<TypeDescriptor>>;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Public,
    NonPublic,
}

impl Visibility {
    #[inline]
    #[must_use]
    pub const fn is_visible(self, inject_non_public: bool) -> bool {
        matches!(self, Visibility::Public) || inject_non_public
    }
}

/// Declarative markers on a member or a parameter.
#[derive(Clone, Default)]
pub struct Markers {
    pub inject: bool,
    pub optional: bool,
    pub tag: Option<String>,
    pub constant: Option<Instance>,
    pub interceptors: Vec<InterceptMarker>,
}

#[derive(Clone)]
pub struct ParameterInfo {
    pub name: &'static str,
    pub ty: TypeInfo,
    pub markers: Markers,
}

impl ParameterInfo {
    #[inline]
    #[must_use]
    pub fn of<T: ?Sized + 'static>(name: &'static str) -> Self {
        Self {
            name,
            ty: TypeInfo::of::<T>(),
            markers: Markers::default(),
        }
    }

    #[inline]
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.markers.tag = Some(tag.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.markers.optional = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn constant<T: Send + Sync + 'static>(mut self, value: T) -> Self {
        self.markers.constant = Some(instance(value));
        self
    }
}

#[derive(Clone)]
pub struct ConstructorInfo {
    pub parameters: Vec<ParameterInfo>,
    pub visibility: Visibility,
    pub markers: Markers,
    pub injector: ConstructorInjector,
}

impl ConstructorInfo {
    #[inline]
    #[must_use]
    pub fn new(injector: ConstructorInjector) -> Self {
        Self {
            parameters: Vec::new(),
            visibility: Visibility::Public,
            markers: Markers::default(),
            injector,
        }
    }

    /// Constructor producing `T` from the resolved arguments.
    #[must_use]
    pub fn of<T, F>(construct: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&Arguments) -> anyhow::Result<T> + Send + Sync + 'static,
    {
        Self::new(Arc::new(move |arguments: Arguments| construct(&arguments).map(instance)))
    }

    #[inline]
    #[must_use]
    pub fn parameter<T: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.with_parameter(ParameterInfo::of::<T>(name))
    }

    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[inline]
    #[must_use]
    pub fn injectable(mut self) -> Self {
        self.markers.inject = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn non_public(mut self) -> Self {
        self.visibility = Visibility::NonPublic;
        self
    }
}

/// A property or a field.
#[derive(Clone)]
pub struct MemberInfo {
    pub name: &'static str,
    pub ty: TypeInfo,
    pub visibility: Visibility,
    pub markers: Markers,
    pub setter: MemberSetter,
}

impl MemberInfo {
    #[inline]
    #[must_use]
    pub fn new(name: &'static str, ty: TypeInfo, setter: MemberSetter) -> Self {
        Self {
            name,
            ty,
            visibility: Visibility::Public,
            markers: Markers::default(),
            setter,
        }
    }

    /// Member of `Owner` holding a `Value`, assigned through `set`.
    #[must_use]
    pub fn of<Owner, Value, F>(name: &'static str, set: F) -> Self
    where
        Owner: Send + Sync + 'static,
        Value: Send + Sync + 'static,
        F: Fn(&Owner, Arc<Value>) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        Self::new(
            name,
            TypeInfo::of::<Value>(),
            Arc::new(move |owner: &Instance, value: Instance| {
                let owner = owner
                    .downcast_ref::<Owner>()
                    .ok_or_else(|| anyhow::anyhow!("member {name} expects owner {}", type_name::<Owner>()))?;
                let value = value
                    .downcast::<Value>()
                    .map_err(|_| anyhow::anyhow!("member {name} expects value {}", type_name::<Value>()))?;
                set(owner, value)
            }),
        )
    }

    #[inline]
    #[must_use]
    pub fn injectable(mut self) -> Self {
        self.markers.inject = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn tagged(mut self, tag: impl Into<String>) -> Self {
        self.markers.tag = Some(tag.into());
        self
    }

    #[inline]
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.markers.optional = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn non_public(mut self) -> Self {
        self.visibility = Visibility::NonPublic;
        self
    }
}

#[derive(Clone)]
pub struct MethodInfo {
    pub name: &'static str,
    pub parameters: Vec<ParameterInfo>,
    pub visibility: Visibility,
    pub markers: Markers,
    pub injector: Option<MethodInjector>,
}

impl MethodInfo {
    /// A method that can only be intercepted.
    #[inline]
    #[must_use]
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            parameters: Vec::new(),
            visibility: Visibility::Public,
            markers: Markers::default(),
            injector: None,
        }
    }

    /// A method of `Owner` called with the resolved arguments when injected.
    #[must_use]
    pub fn of<Owner, F>(name: &'static str, call: F) -> Self
    where
        Owner: Send + Sync + 'static,
        F: Fn(&Owner, &Arguments) -> anyhow::Result<()> + Send + Sync + 'static,
    {
        let mut method = Self::new(name);
        method.injector = Some(Arc::new(move |owner: &Instance, arguments: Arguments| {
            let owner = owner
                .downcast_ref::<Owner>()
                .ok_or_else(|| anyhow::anyhow!("method {name} expects owner {}", type_name::<Owner>()))?;
            call(owner, &arguments)
        }));
        method
    }

    #[inline]
    #[must_use]
    pub fn parameter<T: ?Sized + 'static>(self, name: &'static str) -> Self {
        self.with_parameter(ParameterInfo::of::<T>(name))
    }

    #[inline]
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParameterInfo) -> Self {
        self.parameters.push(parameter);
        self
    }

    #[inline]
    #[must_use]
    pub fn injectable(mut self) -> Self {
        self.markers.inject = true;
        self
    }

    #[inline]
    #[must_use]
    pub fn intercepted(mut self, marker: InterceptMarker) -> Self {
        self.markers.interceptors.push(marker);
        self
    }
}

/// Everything the kernel knows about a concrete type.
#[derive(Clone)]
pub struct TypeDescriptor {
    pub ty: TypeInfo,
    pub constructors: Vec<ConstructorInfo>,
    pub properties: Vec<MemberInfo>,
    pub fields: Vec<MemberInfo>,
    pub methods: Vec<MethodInfo>,
    pub behavior: Option<BehaviorKind>,
    pub interceptors: Vec<InterceptMarker>,
    pub lifecycle: Lifecycle,
}

impl TypeDescriptor {
    #[inline]
    #[must_use]
    pub fn builder<T: Send + Sync + 'static>() -> DescriptorBuilder<T> {
        DescriptorBuilder {
            descriptor: Self {
                ty: TypeInfo::of::<T>(),
                constructors: Vec::new(),
                properties: Vec::new(),
                fields: Vec::new(),
                methods: Vec::new(),
                behavior: None,
                interceptors: Vec::new(),
                lifecycle: Lifecycle::default(),
            },
            _marker: PhantomData,
        }
    }

    pub fn constructors(&self, inject_non_public: bool) -> impl Iterator<Item = &ConstructorInfo> {
        self.constructors
            .iter()
            .filter(move |constructor| constructor.visibility.is_visible(inject_non_public))
    }

    pub fn properties(&self, inject_non_public: bool) -> impl Iterator<Item = &MemberInfo> {
        self.properties
            .iter()
            .filter(move |property| property.visibility.is_visible(inject_non_public))
    }

    pub fn fields(&self, inject_non_public: bool) -> impl Iterator<Item = &MemberInfo> {
        self.fields
            .iter()
            .filter(move |field| field.visibility.is_visible(inject_non_public))
    }

    pub fn methods(&self, inject_non_public: bool) -> impl Iterator<Item = &MethodInfo> {
        self.methods
            .iter()
            .filter(move |method| method.visibility.is_visible(inject_non_public))
    }

    /// Whether the type or any of its methods declares interception.
    #[must_use]
    pub fn is_intercepted(&self) -> bool {
        !self.interceptors.is_empty() || self.methods.iter().any(|method| !method.markers.interceptors.is_empty())
    }
}

pub struct DescriptorBuilder<T> {
    descriptor: TypeDescriptor,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Send + Sync + 'static> DescriptorBuilder<T> {
    #[inline]
    #[must_use]
    pub fn constructor(mut self, constructor: ConstructorInfo) -> Self {
        self.descriptor.constructors.push(constructor);
        self
    }

    /// Adds a parameterless public constructor.
    #[inline]
    #[must_use]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(ConstructorInfo::of(|_| Ok(T::default())))
    }

    #[inline]
    #[must_use]
    pub fn property(mut self, property: MemberInfo) -> Self {
        self.descriptor.properties.push(property);
        self
    }

    #[inline]
    #[must_use]
    pub fn field(mut self, field: MemberInfo) -> Self {
        self.descriptor.fields.push(field);
        self
    }

    #[inline]
    #[must_use]
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.descriptor.methods.push(method);
        self
    }

    #[inline]
    #[must_use]
    pub fn behavior(mut self, behavior: BehaviorKind) -> Self {
        self.descriptor.behavior = Some(behavior);
        self
    }

    #[inline]
    #[must_use]
    pub fn intercepted(mut self, marker: InterceptMarker) -> Self {
        self.descriptor.interceptors.push(marker);
        self
    }

    #[inline]
    #[must_use]
    pub fn initializable(mut self) -> Self
    where
        T: Initializable,
    {
        self.descriptor.lifecycle.set_initializable::<T>();
        self
    }

    #[inline]
    #[must_use]
    pub fn startable(mut self) -> Self
    where
        T: Startable,
    {
        self.descriptor.lifecycle.set_startable::<T>();
        self
    }

    #[inline]
    #[must_use]
    pub fn disposable(mut self) -> Self
    where
        T: Disposable,
    {
        self.descriptor.lifecycle.set_disposable::<T>();
        self
    }

    #[inline]
    #[must_use]
    pub fn build(self) -> TypeDescriptor {
        self.descriptor
    }
}

/// Resolved values passed to a constructor or a method, in parameter order.
pub struct Arguments {
    values: Vec<Option<Instance>>,
}

impl Arguments {
    #[inline]
    #[must_use]
    pub fn new(values: Vec<Option<Instance>>) -> Self {
        Self { values }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn raw(&self, index: usize) -> Option<&Instance> {
        self.values.get(index).and_then(Option::as_ref)
    }

    /// # Errors
    /// Fails if the argument is absent or has another type.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> anyhow::Result<Arc<T>> {
        self.optional(index)?
            .ok_or_else(|| anyhow::anyhow!("argument {index} of type {} is absent", type_name::<T>()))
    }

    /// # Errors
    /// Fails if the argument is present but has another type.
    pub fn optional<T: Send + Sync + 'static>(&self, index: usize) -> anyhow::Result<Option<Arc<T>>> {
        match self.raw(index) {
            Some(value) => value.clone().downcast::<T>().map(Some).map_err(|value| {
                anyhow::anyhow!(
                    "argument {index} expected {}, got {:?}",
                    type_name::<T>(),
                    instance_type_id(&value)
                )
            }),
            None => Ok(None),
        }
    }

    /// # Errors
    /// Fails if the argument is absent or has another type.
    pub fn cloned<T: Clone + Send + Sync + 'static>(&self, index: usize) -> anyhow::Result<T> {
        self.get::<T>(index).map(|value| (*value).clone())
    }
}

/// Introspector backed by descriptors registered up front.
#[derive(Default)]
pub struct TypeCatalog {
    types: RwLock<BTreeMap<TypeInfo, Arc<TypeDescriptor>>>,
}

impl TypeCatalog {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn with(self, descriptor: TypeDescriptor) -> Self {
        self.register(descriptor);
        self
    }

    pub fn register(&self, descriptor: TypeDescriptor) -> Option<Arc<TypeDescriptor>> {
        self.types.write().insert(descriptor.ty, Arc::new(descriptor))
    }
}

impl Introspector for TypeCatalog {
    fn describe(&self, ty: &TypeInfo) -> Option<Arc<TypeDescriptor>> {
        self.types.read().get(ty).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::{Arguments, ConstructorInfo, Introspector as _, MemberInfo, TypeCatalog, TypeDescriptor};
    use crate::any::{instance, TypeInfo};

    use alloc::{string::String, sync::Arc, vec};
    use parking_lot::Mutex;

    #[derive(Default)]
    struct Dojo {
        name: Mutex<Option<Arc<String>>>,
    }

    #[test]
    fn test_arguments_access() {
        let arguments = Arguments::new(vec![Some(instance(5u32)), None]);

        assert_eq!(*arguments.get::<u32>(0).unwrap(), 5);
        assert!(arguments.get::<u64>(0).is_err());
        assert!(arguments.get::<u32>(1).is_err());
        assert!(arguments.optional::<u32>(1).unwrap().is_none());
        assert_eq!(arguments.cloned::<u32>(0).unwrap(), 5);
    }

    #[test]
    fn test_visibility_filter() {
        let descriptor = TypeDescriptor::builder::<Dojo>()
            .default_constructor()
            .constructor(ConstructorInfo::of(|_| Ok(Dojo::default())).parameter::<u8>("unused").non_public())
            .build();

        assert_eq!(descriptor.constructors(false).count(), 1);
        assert_eq!(descriptor.constructors(true).count(), 2);
        assert!(!descriptor.is_intercepted());
    }

    #[test]
    fn test_member_setter_downcasts() {
        let member = MemberInfo::of::<Dojo, String, _>("name", |dojo, value| {
            *dojo.name.lock() = Some(value);
            Ok(())
        });
        let dojo = instance(Dojo::default());

        (member.setter)(&dojo, instance(String::from("Kyoto"))).unwrap();
        assert!((member.setter)(&dojo, instance(1u8)).is_err());
        assert!((member.setter)(&instance(1u8), instance(String::new())).is_err());
        assert_eq!(
            dojo.downcast_ref::<Dojo>().unwrap().name.lock().as_deref().map(String::as_str),
            Some("Kyoto")
        );
    }

    #[test]
    fn test_catalog_describe() {
        let catalog = TypeCatalog::new().with(TypeDescriptor::builder::<Dojo>().default_constructor().build());

        assert!(catalog.describe(&TypeInfo::of::<Dojo>()).is_some());
        assert!(catalog.describe(&TypeInfo::of::<u8>()).is_none());
    }
}
