//! Fiber arena.
//!
//! Fibers are addressed by generational [`FiberId`]s. `child` and `sibling`
//! links decide what a generation owns; `parent` and `alternate` are plain
//! cross references. A fiber that is no longer reachable from a live root is
//! released by [`FiberTree::sweep`], after which any stale id simply resolves
//! to `None`.

use std::ops::{Index, IndexMut};
use std::rc::Rc;

use slotmap::SlotMap;

use crate::collections::FiberSet;
use crate::element::{Element, ElementType, Props};
use crate::hooks::HookId;
use crate::host::NodeId;

slotmap::new_key_type! {
    pub struct FiberId;
}

/// What the commit phase must do for a fiber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EffectTag {
    Placement,
    Update,
    Deletion,
}

#[derive(Debug)]
pub struct Fiber {
    pub(crate) ty: Option<ElementType>,
    pub(crate) props: Rc<Props>,
    pub(crate) dom: Option<NodeId>,
    pub(crate) parent: Option<FiberId>,
    pub(crate) child: Option<FiberId>,
    pub(crate) sibling: Option<FiberId>,
    pub(crate) alternate: Option<FiberId>,
    pub(crate) effect: Option<EffectTag>,
    pub(crate) hooks: Vec<HookId>,
}

impl Fiber {
    /// A root fiber: no type, the container as its host node.
    pub(crate) fn root(container: NodeId, props: Rc<Props>, alternate: Option<FiberId>) -> Self {
        Self {
            ty: None,
            props,
            dom: Some(container),
            parent: None,
            child: None,
            sibling: None,
            alternate,
            effect: None,
            hooks: Vec::new(),
        }
    }

    pub(crate) fn placement(element: &Element, parent: FiberId) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: element.shared_props(),
            dom: None,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: None,
            effect: Some(EffectTag::Placement),
            hooks: Vec::new(),
        }
    }

    pub(crate) fn update(
        element: &Element,
        parent: FiberId,
        old: FiberId,
        dom: Option<NodeId>,
    ) -> Self {
        Self {
            ty: Some(element.ty().clone()),
            props: element.shared_props(),
            dom,
            parent: Some(parent),
            child: None,
            sibling: None,
            alternate: Some(old),
            effect: Some(EffectTag::Update),
            hooks: Vec::new(),
        }
    }

    /// `None` only for a root fiber.
    pub fn ty(&self) -> Option<&ElementType> {
        self.ty.as_ref()
    }

    pub fn props(&self) -> &Props {
        &self.props
    }

    pub fn dom(&self) -> Option<NodeId> {
        self.dom
    }

    pub fn parent(&self) -> Option<FiberId> {
        self.parent
    }

    pub fn child(&self) -> Option<FiberId> {
        self.child
    }

    pub fn sibling(&self) -> Option<FiberId> {
        self.sibling
    }

    pub fn alternate(&self) -> Option<FiberId> {
        self.alternate
    }

    pub fn effect(&self) -> Option<EffectTag> {
        self.effect
    }

    pub fn hooks(&self) -> &[HookId] {
        &self.hooks
    }
}

#[derive(Debug, Default)]
pub struct FiberTree {
    fibers: SlotMap<FiberId, Fiber>,
}

impl FiberTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, fiber: Fiber) -> FiberId {
        self.fibers.insert(fiber)
    }

    pub fn get(&self, id: FiberId) -> Option<&Fiber> {
        self.fibers.get(id)
    }

    pub fn contains(&self, id: FiberId) -> bool {
        self.fibers.contains_key(id)
    }

    /// Live fibers across every generation still held.
    pub fn len(&self) -> usize {
        self.fibers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fibers.is_empty()
    }

    /// Direct children of `id`, in sibling order.
    pub fn children(&self, id: FiberId) -> Vec<FiberId> {
        let mut out = Vec::new();
        let mut cursor = self.get(id).and_then(Fiber::child);
        while let Some(child) = cursor {
            out.push(child);
            cursor = self.get(child).and_then(Fiber::sibling);
        }
        out
    }

    /// Depth-first successor of `id`: its child, else the nearest sibling
    /// found while walking up through the parents.
    pub fn next_unit(&self, id: FiberId) -> Option<FiberId> {
        let fiber = self.get(id)?;
        if let Some(child) = fiber.child {
            return Some(child);
        }
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(sibling) = fiber.sibling {
                return Some(sibling);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Host node of the nearest ancestor that owns one, skipping
    /// components.
    pub fn host_parent(&self, id: FiberId) -> Option<NodeId> {
        let mut cursor = self.get(id)?.parent;
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(dom) = fiber.dom {
                return Some(dom);
            }
            cursor = fiber.parent;
        }
        None
    }

    /// Host node of `id` itself, or of its nearest descendant down the
    /// first-child chain.
    pub fn host_node(&self, id: FiberId) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let fiber = self.get(current)?;
            if let Some(dom) = fiber.dom {
                return Some(dom);
            }
            cursor = fiber.child;
        }
        None
    }

    /// Every fiber reachable from `roots` through child and sibling links.
    pub(crate) fn mark(&self, roots: impl IntoIterator<Item = FiberId>) -> FiberSet {
        let mut reachable = FiberSet::default();
        let mut stack: Vec<FiberId> = roots.into_iter().collect();
        while let Some(id) = stack.pop() {
            let Some(fiber) = self.get(id) else {
                continue;
            };
            if !reachable.insert(id) {
                continue;
            }
            stack.extend(fiber.child);
            stack.extend(fiber.sibling);
        }
        reachable
    }

    /// Removes every fiber outside `keep` and hands them back so their hook
    /// cells can be released.
    pub(crate) fn sweep(&mut self, keep: &FiberSet) -> Vec<Fiber> {
        let doomed: Vec<FiberId> = self
            .fibers
            .keys()
            .filter(|id| !keep.contains(id))
            .collect();
        doomed
            .into_iter()
            .filter_map(|id| self.fibers.remove(id))
            .collect()
    }

    /// Drops `alternate` links that point at released fibers.
    pub(crate) fn prune_alternates(&mut self) {
        let stale: Vec<FiberId> = self
            .fibers
            .iter()
            .filter(|(_, fiber)| fiber.alternate.is_some_and(|alt| !self.fibers.contains_key(alt)))
            .map(|(id, _)| id)
            .collect();
        for id in stale {
            self.fibers[id].alternate = None;
        }
    }
}

impl Index<FiberId> for FiberTree {
    type Output = Fiber;

    fn index(&self, id: FiberId) -> &Fiber {
        &self.fibers[id]
    }
}

impl IndexMut<FiberId> for FiberTree {
    fn index_mut(&mut self, id: FiberId) -> &mut Fiber {
        &mut self.fibers[id]
    }
}
