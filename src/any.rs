use alloc::sync::Arc;
use core::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt::{self, Display, Formatter},
};

/// Type-erased value handed around by the kernel.
pub type Instance = Arc<dyn Any + Send + Sync>;

#[derive(Debug, Clone, Copy)]
pub struct TypeInfo {
    pub name: &'static str,
    pub id: TypeId,
}

impl PartialEq for TypeInfo {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeInfo {}

impl PartialOrd for TypeInfo {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for TypeInfo {
    fn cmp(&self, other: &Self) -> Ordering {
        self.id.cmp(&other.id)
    }
}

impl Display for TypeInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

impl TypeInfo {
    #[inline]
    #[must_use]
    pub fn of<T>() -> Self
    where
        T: ?Sized + 'static,
    {
        Self {
            name: type_name::<T>(),
            id: TypeId::of::<T>(),
        }
    }

    #[inline]
    #[must_use]
    pub fn is<T: ?Sized + 'static>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }

    #[inline]
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit_once("::").map_or(self.name, |(_, name)| name)
    }
}

/// Wraps a value into an [`Instance`].
#[inline]
#[must_use]
pub fn instance<T: Send + Sync + 'static>(value: T) -> Instance {
    Arc::new(value)
}

/// Identity of the value behind an instance, stable for the lifetime of the allocation.
#[inline]
#[must_use]
pub(crate) fn instance_key(instance: &Instance) -> usize {
    Arc::as_ptr(instance).cast::<()>() as usize
}

/// Type id of the value behind an instance, not of the `Arc` itself.
#[inline]
#[must_use]
pub(crate) fn instance_type_id(instance: &Instance) -> TypeId {
    (**instance).type_id()
}

#[cfg(test)]
mod tests {
    use super::{instance, instance_key, instance_type_id, TypeInfo};

    use alloc::{string::String, sync::Arc};
    use core::any::TypeId;

    struct Sword;

    #[test]
    fn test_type_info_short_name() {
        let type_info = TypeInfo::of::<Sword>();
        assert_eq!(type_info.short_name(), "Sword");
        assert!(type_info.is::<Sword>());
        assert!(!type_info.is::<String>());
    }

    #[test]
    fn test_instance_identity() {
        let first = instance(1u8);
        let second = first.clone();
        let third = instance(1u8);

        assert_eq!(instance_key(&first), instance_key(&second));
        assert_ne!(instance_key(&first), instance_key(&third));
        assert_eq!(instance_type_id(&first), TypeId::of::<u8>());
        assert_ne!(instance_type_id(&first), TypeId::of::<Arc<u8>>());
    }
}
