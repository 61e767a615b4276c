use std::cell::Cell;
use std::time::Duration;

use fiber_core::{Deadline, IdleScheduler};

#[derive(Debug, Clone, Copy)]
enum Budget {
    Fixed(Duration),
    Units(usize),
}

/// Deterministic [`Deadline`] for driving the work loop in tests.
///
/// The work loop consults the deadline once after every unit of work, so a
/// unit budget translates directly into units performed per slice.
#[derive(Debug)]
pub struct TestDeadline {
    budget: Budget,
    checks: Cell<usize>,
}

impl TestDeadline {
    /// Always reports a fixed amount of time left.
    pub fn fixed(remaining: Duration) -> Self {
        Self {
            budget: Budget::Fixed(remaining),
            checks: Cell::new(0),
        }
    }

    /// Never runs out.
    pub fn unbounded() -> Self {
        Self::fixed(Duration::MAX)
    }

    /// Already spent: the loop performs its single mandatory unit and yields.
    pub fn exhausted() -> Self {
        Self::fixed(Duration::ZERO)
    }

    /// Lets exactly `units` units of work run (at least one).
    pub fn units(units: usize) -> Self {
        Self {
            budget: Budget::Units(units.max(1)),
            checks: Cell::new(0),
        }
    }

    /// How many times the loop asked for the remaining time.
    pub fn checks(&self) -> usize {
        self.checks.get()
    }

    /// Starts the script over for another slice.
    pub fn reset(&self) {
        self.checks.set(0);
    }
}

impl Deadline for TestDeadline {
    fn time_remaining(&self) -> Duration {
        let checks = self.checks.get() + 1;
        self.checks.set(checks);
        match self.budget {
            Budget::Fixed(remaining) => remaining,
            Budget::Units(units) if checks < units => Duration::MAX,
            Budget::Units(_) => Duration::ZERO,
        }
    }
}

/// [`IdleScheduler`] that only counts requests.
#[derive(Debug, Default)]
pub struct CountingScheduler {
    requests: Cell<usize>,
}

impl CountingScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn requests(&self) -> usize {
        self.requests.get()
    }

    /// Returns the count since the last call and resets it.
    pub fn take_requests(&self) -> usize {
        self.requests.replace(0)
    }
}

impl IdleScheduler for CountingScheduler {
    fn request_idle_callback(&self) {
        self.requests.set(self.requests.get() + 1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_budget_runs_out_on_the_last_unit() {
        let deadline = TestDeadline::units(3);
        assert_eq!(deadline.time_remaining(), Duration::MAX);
        assert_eq!(deadline.time_remaining(), Duration::MAX);
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
        deadline.reset();
        assert_eq!(deadline.time_remaining(), Duration::MAX);
    }

    #[test]
    fn zero_units_behaves_like_one() {
        let deadline = TestDeadline::units(0);
        assert_eq!(deadline.time_remaining(), Duration::ZERO);
        assert_eq!(deadline.checks(), 1);
    }

    #[test]
    fn counting_scheduler_resets_on_take() {
        let scheduler = CountingScheduler::new();
        scheduler.request_idle_callback();
        scheduler.request_idle_callback();
        assert_eq!(scheduler.take_requests(), 2);
        assert_eq!(scheduler.requests(), 0);
    }
}
