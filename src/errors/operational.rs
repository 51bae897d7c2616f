use alloc::string::String;

use crate::any::TypeInfo;

#[derive(thiserror::Error, Debug)]
pub enum OperationalErrorKind {
    #[error("Binding {id} for {service} isn't registered")]
    BindingNotRegistered { service: TypeInfo, id: u64 },
    #[error("Scope {id} is disposed")]
    ScopeDisposed { id: u64 },
    #[error("Scope {id} isn't tracked")]
    ScopeNotTracked { id: u64 },
    #[error("No scope is tracked with key {key}")]
    UnknownScopeKey { key: String },
    #[error("A scope is already tracked with key {key}")]
    DuplicateScopeKey { key: String },
    #[error("Instance of {ty} isn't tracked by any scope")]
    InstanceNotTracked { ty: TypeInfo },
    #[error("Kernel is disposed")]
    KernelDisposed,
}
