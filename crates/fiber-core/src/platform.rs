//! Platform abstraction traits for the work loop.
//!
//! The engine never sleeps, spawns or reads a clock on its own. The host
//! decides when spare time exists ([`IdleScheduler`]) and how much of it is
//! left ([`Deadline`]), which keeps the algorithm independent of any concrete
//! event loop.

use std::time::Duration;

/// The host's "call me back when idle" primitive.
pub trait IdleScheduler {
    /// Ask the host to invoke the work loop again when it has spare time.
    fn request_idle_callback(&self);
}

/// Budget handed to one slice of the work loop.
pub trait Deadline {
    /// Time left in the current idle period.
    fn time_remaining(&self) -> Duration;
}

/// A deadline that never runs out, used to flush work synchronously.
#[derive(Debug, Default, Clone, Copy)]
pub struct Unbounded;

impl Deadline for Unbounded {
    fn time_remaining(&self) -> Duration {
        Duration::MAX
    }
}

impl<F> Deadline for F
where
    F: Fn() -> Duration,
{
    fn time_remaining(&self) -> Duration {
        self()
    }
}
