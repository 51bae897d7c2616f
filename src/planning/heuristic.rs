use crate::introspection::{ConstructorInfo, MemberInfo, MethodInfo};

/// Decides which members are injected and breaks ties between constructors.
pub trait InjectionHeuristic: Send + Sync {
    fn should_inject_member(&self, member: &MemberInfo) -> bool;

    fn should_inject_method(&self, method: &MethodInfo) -> bool;

    /// Picks a constructor when several are candidates and none is marked for injection.
    fn select_constructor<'a>(&self, candidates: &[&'a ConstructorInfo]) -> Option<&'a ConstructorInfo> {
        let _ = candidates;
        None
    }
}

/// Injects members and methods marked for injection.
#[derive(Clone, Copy, Debug, Default)]
pub struct StandardInjectionHeuristic;

impl InjectionHeuristic for StandardInjectionHeuristic {
    fn should_inject_member(&self, member: &MemberInfo) -> bool {
        member.markers.inject
    }

    fn should_inject_method(&self, method: &MethodInfo) -> bool {
        method.markers.inject
    }
}
