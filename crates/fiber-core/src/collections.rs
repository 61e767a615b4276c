//! Map aliases used by the host arena, fiber garbage collection and update
//! draining.
//!
//! `hashbrown` is the default; the `std-hash` feature falls back to the
//! standard library collections.

#[cfg(feature = "std-hash")]
pub(crate) mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub(crate) mod map {
    pub use hashbrown::{HashMap, HashSet};
}

use crate::element::Listener;
use crate::fiber::FiberId;
use crate::hooks::HookId;

/// Listeners attached to one host node, keyed by event kind.
pub(crate) type ListenerMap = map::HashMap<String, Vec<Listener>>;

/// Fibers reached while marking a generation.
pub(crate) type FiberSet = map::HashSet<FiberId>;

/// Hook cells owned by freshly placed fibers.
pub(crate) type HookSet = map::HashSet<HookId>;
