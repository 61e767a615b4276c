#![doc = r"Fiber reconciler, cooperative work loop and hook store for Fiber-RS."]

mod collections;
pub mod commit;
pub mod config;
pub mod element;
pub mod fiber;
pub mod hooks;
pub mod host;
pub mod memory;
pub mod patch;
pub mod platform;
mod reconciler;
pub mod root;
pub mod runtime;

pub use commit::CommitStats;
pub use config::WorkLoopConfig;
pub use element::{
    create_element, create_text_element, event_kind, is_event_key, Component, ComponentFn,
    Element, ElementType, Event, Listener, PropValue, Props, EVENT_PREFIX, TEXT_VALUE,
};
pub use fiber::{EffectTag, Fiber, FiberId, FiberTree};
pub use hooks::{use_state, HookId, StateSetter};
pub use host::{Host, HostError, NodeId};
pub use memory::{MemoryHost, MemoryNode, MemoryNodeKind, Mutation};
pub use patch::{create_node, update_node};
pub use platform::{Deadline, IdleScheduler, Unbounded};
pub use root::{FiberRoot, WorkStatus};
pub use runtime::{DefaultScheduler, Runtime, RuntimeHandle};

#[cfg(test)]
pub use runtime::TestScheduler;

/// Failure surfaced by [`FiberRoot::work_loop`].
///
/// A failing unit of work abandons the pending tree; the committed tree is
/// left as it was. A failing commit leaves the host partially updated and
/// the pending tree is not promoted.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RenderError {
    #[error("host mutation failed: {0}")]
    HostMutationFailed(#[from] HostError),
    #[error("fiber {0:?} has no host ancestor")]
    DetachedFiber(FiberId),
}
