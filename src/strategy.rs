/// Signal returned by planning and activation strategies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum StrategyResult {
    /// Run the next strategy of the phase.
    #[default]
    Proceed,
    /// Skip the remaining strategies of the current phase only.
    Stop,
}

impl StrategyResult {
    #[inline]
    #[must_use]
    pub const fn is_stop(self) -> bool {
        matches!(self, Self::Stop)
    }
}
