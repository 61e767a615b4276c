//! In-memory host tree.
//!
//! [`MemoryHost`] implements [`Host`] over a plain arena and records every
//! mutation it receives, which makes it the host of choice for tests, the
//! demo app and benchmarks.

use std::fmt::Write as _;

use indexmap::IndexMap;

use crate::collections::ListenerMap;
use crate::element::{Event, Listener, PropValue, TEXT_VALUE};
use crate::host::{Host, HostError, NodeId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryNodeKind {
    Element(String),
    Text(String),
}

#[derive(Debug)]
pub struct MemoryNode {
    kind: MemoryNodeKind,
    attributes: IndexMap<String, String>,
    listeners: ListenerMap,
    children: Vec<NodeId>,
    parent: Option<NodeId>,
}

impl MemoryNode {
    fn new(kind: MemoryNodeKind) -> Self {
        Self {
            kind,
            attributes: IndexMap::new(),
            listeners: ListenerMap::default(),
            children: Vec::new(),
            parent: None,
        }
    }

    pub fn kind(&self) -> &MemoryNodeKind {
        &self.kind
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// One primitive call received by a [`MemoryHost`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    CreateElement { node: NodeId, tag: String },
    CreateText { node: NodeId },
    SetAttribute { node: NodeId, name: String, value: String },
    RemoveAttribute { node: NodeId, name: String },
    AddListener { node: NodeId, kind: String },
    RemoveListener { node: NodeId, kind: String },
    AppendChild { parent: NodeId, child: NodeId },
    RemoveChild { parent: NodeId, child: NodeId },
}

impl Mutation {
    /// True for mutations that change the shape of the tree.
    pub fn is_structural(&self) -> bool {
        matches!(
            self,
            Self::AppendChild { .. } | Self::RemoveChild { .. }
        )
    }
}

#[derive(Debug, Default)]
pub struct MemoryHost {
    nodes: Vec<MemoryNode>,
    mutations: Vec<Mutation>,
}

fn valid_tag(tag: &str) -> bool {
    let mut chars = tag.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => {
            chars.all(|c| c.is_ascii_alphanumeric() || c == '-')
        }
        _ => false,
    }
}

impl MemoryHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a host with a single detached element to render into. The
    /// creation is not kept in the mutation log.
    pub fn with_container(tag: &str) -> Result<(Self, NodeId), HostError> {
        let mut host = Self::new();
        let container = host.create_element(tag)?;
        host.mutations.clear();
        Ok((host, container))
    }

    pub fn node(&self, id: NodeId) -> Option<&MemoryNode> {
        self.nodes.get(id)
    }

    fn node_mut(&mut self, id: NodeId) -> Result<&mut MemoryNode, HostError> {
        self.nodes.get_mut(id).ok_or(HostError::MissingNode { id })
    }

    /// Number of nodes ever created, attached or not.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(MemoryNode::children).unwrap_or(&[])
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(MemoryNode::parent)
    }

    pub fn tag(&self, id: NodeId) -> Option<&str> {
        match &self.node(id)?.kind {
            MemoryNodeKind::Element(tag) => Some(tag),
            MemoryNodeKind::Text(_) => None,
        }
    }

    pub fn attribute(&self, id: NodeId, name: &str) -> Option<&str> {
        self.node(id)?.attributes.get(name).map(String::as_str)
    }

    pub fn listener_count(&self, id: NodeId, kind: &str) -> usize {
        self.node(id)
            .and_then(|node| node.listeners.get(kind))
            .map_or(0, Vec::len)
    }

    /// Concatenated text of `id` and all attached descendants.
    pub fn text_content(&self, id: NodeId) -> String {
        let mut out = String::new();
        self.collect_text(id, &mut out);
        out
    }

    fn collect_text(&self, id: NodeId, out: &mut String) {
        let Some(node) = self.node(id) else {
            return;
        };
        if let MemoryNodeKind::Text(text) = &node.kind {
            out.push_str(text);
        }
        for &child in &node.children {
            self.collect_text(child, out);
        }
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    pub fn take_mutations(&mut self) -> Vec<Mutation> {
        std::mem::take(&mut self.mutations)
    }

    /// Invokes every listener registered on `target` for `kind`, returning
    /// how many ran. Listeners are cloned out first so a handler may freely
    /// schedule state updates.
    pub fn dispatch_event(&self, target: NodeId, kind: &str) -> Result<usize, HostError> {
        let node = self.node(target).ok_or(HostError::MissingNode { id: target })?;
        let listeners: Vec<Listener> = node.listeners.get(kind).cloned().unwrap_or_default();
        let event = Event {
            kind: kind.to_owned(),
            target,
        };
        for listener in &listeners {
            listener.call(&event);
        }
        Ok(listeners.len())
    }

    pub fn dump_tree(&self, root: NodeId) -> String {
        let mut output = String::new();
        self.dump_node(&mut output, root, 0);
        output
    }

    fn dump_node(&self, output: &mut String, id: NodeId, depth: usize) {
        let indent = "  ".repeat(depth);
        let Some(node) = self.node(id) else {
            let _ = writeln!(output, "{indent}[{id}] (missing)");
            return;
        };
        match &node.kind {
            MemoryNodeKind::Text(text) => {
                let _ = writeln!(output, "{indent}[{id}] {text:?}");
            }
            MemoryNodeKind::Element(tag) => {
                let _ = write!(output, "{indent}[{id}] <{tag}");
                for (name, value) in &node.attributes {
                    let _ = write!(output, " {name}={value:?}");
                }
                let mut kinds: Vec<&String> = node
                    .listeners
                    .iter()
                    .filter(|(_, listeners)| !listeners.is_empty())
                    .map(|(kind, _)| kind)
                    .collect();
                kinds.sort();
                for kind in kinds {
                    let _ = write!(output, " @{kind}");
                }
                let _ = writeln!(output, ">");
            }
        }
        for &child in &node.children {
            self.dump_node(output, child, depth + 1);
        }
    }

    fn push(&mut self, node: MemoryNode) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(node);
        id
    }
}

impl Host for MemoryHost {
    fn create_element(&mut self, tag: &str) -> Result<NodeId, HostError> {
        if !valid_tag(tag) {
            return Err(HostError::InvalidTag {
                tag: tag.to_owned(),
            });
        }
        let node = self.push(MemoryNode::new(MemoryNodeKind::Element(tag.to_owned())));
        self.mutations.push(Mutation::CreateElement {
            node,
            tag: tag.to_owned(),
        });
        Ok(node)
    }

    fn create_text_node(&mut self, text: &str) -> Result<NodeId, HostError> {
        let node = self.push(MemoryNode::new(MemoryNodeKind::Text(text.to_owned())));
        self.mutations.push(Mutation::CreateText { node });
        Ok(node)
    }

    fn set_attribute(
        &mut self,
        node: NodeId,
        name: &str,
        value: &PropValue,
    ) -> Result<(), HostError> {
        let rendered = value.to_attribute().unwrap_or_default();
        let entry = self.node_mut(node)?;
        match &mut entry.kind {
            MemoryNodeKind::Text(text) if name == TEXT_VALUE => text.clone_from(&rendered),
            _ => {
                entry.attributes.insert(name.to_owned(), rendered.clone());
            }
        }
        self.mutations.push(Mutation::SetAttribute {
            node,
            name: name.to_owned(),
            value: rendered,
        });
        Ok(())
    }

    fn remove_attribute(&mut self, node: NodeId, name: &str) -> Result<(), HostError> {
        let entry = self.node_mut(node)?;
        match &mut entry.kind {
            MemoryNodeKind::Text(text) if name == TEXT_VALUE => text.clear(),
            _ => {
                entry.attributes.shift_remove(name);
            }
        }
        self.mutations.push(Mutation::RemoveAttribute {
            node,
            name: name.to_owned(),
        });
        Ok(())
    }

    fn add_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let entry = self.node_mut(node)?;
        let listeners = entry.listeners.entry(kind.to_owned()).or_default();
        if !listeners.iter().any(|existing| existing.ptr_eq(listener)) {
            listeners.push(listener.clone());
        }
        self.mutations.push(Mutation::AddListener {
            node,
            kind: kind.to_owned(),
        });
        Ok(())
    }

    fn remove_event_listener(
        &mut self,
        node: NodeId,
        kind: &str,
        listener: &Listener,
    ) -> Result<(), HostError> {
        let entry = self.node_mut(node)?;
        if let Some(listeners) = entry.listeners.get_mut(kind) {
            listeners.retain(|existing| !existing.ptr_eq(listener));
        }
        self.mutations.push(Mutation::RemoveListener {
            node,
            kind: kind.to_owned(),
        });
        Ok(())
    }

    fn append_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        if matches!(self.node_mut(parent)?.kind, MemoryNodeKind::Text(_)) {
            return Err(HostError::NotAnElement { id: parent });
        }
        let previous = self.node_mut(child)?.parent.replace(parent);
        if let Some(previous) = previous {
            self.node_mut(previous)?.children.retain(|&id| id != child);
        }
        self.node_mut(parent)?.children.push(child);
        self.mutations.push(Mutation::AppendChild { parent, child });
        Ok(())
    }

    fn remove_child(&mut self, parent: NodeId, child: NodeId) -> Result<(), HostError> {
        let entry = self.node_mut(parent)?;
        let position = entry
            .children
            .iter()
            .position(|&id| id == child)
            .ok_or(HostError::NotAChild { parent, child })?;
        entry.children.remove(position);
        self.node_mut(child)?.parent = None;
        self.mutations.push(Mutation::RemoveChild { parent, child });
        Ok(())
    }
}
