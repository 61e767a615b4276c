use std::time::Duration;

/// Tuning for one work-loop slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkLoopConfig {
    /// The slice yields once the deadline reports less than this much time.
    pub yield_threshold: Duration,
    /// Optional hard cap on units of work per slice.
    pub max_units_per_slice: Option<usize>,
}

impl WorkLoopConfig {
    pub const DEFAULT_YIELD_THRESHOLD: Duration = Duration::from_millis(1);

    pub fn with_yield_threshold(mut self, threshold: Duration) -> Self {
        self.yield_threshold = threshold;
        self
    }

    pub fn with_max_units_per_slice(mut self, units: usize) -> Self {
        self.max_units_per_slice = Some(units.max(1));
        self
    }

    pub(crate) fn slice_exhausted(&self, remaining: Duration, units: usize) -> bool {
        remaining < self.yield_threshold
            || self.max_units_per_slice.is_some_and(|cap| units >= cap)
    }
}

impl Default for WorkLoopConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Self::DEFAULT_YIELD_THRESHOLD,
            max_units_per_slice: None,
        }
    }
}
