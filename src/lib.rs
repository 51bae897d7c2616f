#![cfg_attr(not(test), no_std)]

extern crate alloc;

pub(crate) mod activation;
pub(crate) mod any;
pub(crate) mod behavior;
pub(crate) mod binding;
pub(crate) mod config;
pub(crate) mod context;
pub(crate) mod conversion;
pub(crate) mod errors;
pub(crate) mod interception;
pub(crate) mod introspection;
pub(crate) mod kernel;
pub(crate) mod lifecycle;
pub(crate) mod logger;
pub(crate) mod parameters;
pub(crate) mod planning;
pub(crate) mod provider;
pub(crate) mod proxy;
pub(crate) mod request;
pub(crate) mod resolution;
pub(crate) mod scope;
pub(crate) mod strategy;
pub(crate) mod tracker;

pub use activation::{
    ActivationPhase, ActivationStrategy, Activator, DisposableStrategy, FieldInjectionStrategy, InitializableStrategy,
    MethodInjectionStrategy, PropertyInjectionStrategy, ProviderStrategy, ProxyStrategy, StartableStrategy,
};
pub use any::{instance, Instance, TypeInfo};
pub use behavior::{Behavior, BehaviorKind, SingletonBehavior, TransientBehavior};
pub use binding::{Binding, BindingId, BindingRegistry, BindingSelector, Condition, StandardBindingSelector};
pub use config::Config;
pub use context::Context;
pub use conversion::Conversions;
pub use errors::{ActivationErrorKind, ConfigurationErrorKind, OperationalErrorKind};
pub use interception::{
    AdviceRegistry, CallCondition, CallRequest, InterceptMarker, Interceptor, InterceptorFactory, Invocation, MethodId,
};
pub use introspection::{
    Arguments, ConstructorInfo, ConstructorInjector, DescriptorBuilder, Introspector, Markers, MemberInfo, MemberSetter,
    MethodInfo, MethodInjector, ParameterInfo, TypeCatalog, TypeDescriptor, Visibility,
};
pub use kernel::{Kernel, KernelBuilder, KernelComponents};
pub use lifecycle::{Disposable, Initializable, Lifecycle, Startable};
pub use logger::Logger;
pub use parameters::{Parameter, ParameterKind, ParameterValue, Parameters};
pub use planning::{
    ActivationPlan, Argument, BehaviorSelectionStrategy, ConstructorDirective, ConstructorSelectionStrategy, Directive,
    DirectiveCollection, DirectiveKey, InjectionHeuristic, InterceptorRegistrationStrategy, MemberDirective,
    MemberReflectionStrategy, MethodDirective, PlanDraft, Planner, PlanningPhase, PlanningStrategy,
    StandardInjectionHeuristic,
};
pub use provider::{CallbackProvider, ConstantProvider, GenericProvider, Provider, StandardProvider};
pub use proxy::ProxyFactory;
pub use request::{Request, Target, TargetKind};
pub use resolution::{
    ComponentResolver, ConstantResolver, LoggerResolver, Resolver, ResolverFactory, ServiceResolver,
    StandardResolverFactory,
};
pub use scope::Scope;
pub use strategy::StrategyResult;
pub use tracker::Tracker;
