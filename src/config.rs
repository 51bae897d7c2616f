use crate::behavior::BehaviorKind;

/// Config for a kernel
/// ## Fields
/// - `implicit_self_binding`:
///   If `true`, a concrete type without bindings is bound to itself on first request,
///   provided the introspector knows how to construct it.
/// - `inject_non_public`:
///   If `true`, non-public constructors and members are injection candidates too.
/// - `default_behavior`:
///   Behavior used when neither the binding nor a marker on the type picks one.
/// - `track_transients`:
///   If `true`, disposable and startable transient instances are tracked by the scope they were resolved in,
///   so disposing the scope releases them.
/// - `max_depth`:
///   Maximum depth of a resolution tree.
#[derive(Clone, Copy, Debug)]
pub struct Config {
    pub implicit_self_binding: bool,
    pub inject_non_public: bool,
    pub default_behavior: BehaviorKind,
    pub track_transients: bool,
    pub max_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            implicit_self_binding: true,
            inject_non_public: false,
            default_behavior: BehaviorKind::Transient,
            track_transients: true,
            max_depth: 64,
        }
    }
}
