//! Host node primitives consumed by the engine.
//!
//! The engine never touches a platform tree directly. Everything it needs is
//! expressed through [`Host`], whose nodes are addressed by [`NodeId`]. Any
//! primitive may fail; the failure is reported as a [`HostError`] and surfaces
//! from the work loop as [`crate::RenderError::HostMutationFailed`].

use crate::element::{Listener, PropValue};

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HostError {
    #[error("invalid tag name {tag:?}")]
    InvalidTag { tag: String },
    #[error("host node {id} missing")]
    MissingNode { id: NodeId },
    #[error("host node {child} is not a child of {parent}")]
    NotAChild { parent: NodeId, child: NodeId },
    #[error("host node {id} cannot hold children")]
    NotAnElement { id: NodeId },
}

pub trait Host {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError>;

    fn create_text_node(&mut self, text: &str) -> Result<NodeId, HostError>;

    fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError>;

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), HostError>;

    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: &Listener,
    ) -> Result<(), HostError>;

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError>;
}
