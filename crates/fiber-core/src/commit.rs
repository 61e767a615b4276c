//! The commit phase: apply every staged effect in one uninterrupted pass.

use crate::fiber::{EffectTag, FiberId, FiberTree};
use crate::host::Host;
use crate::patch::update_node;
use crate::RenderError;

/// Host-visible effects applied by one commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CommitStats {
    /// Host nodes appended for PLACEMENT fibers.
    pub placements: usize,
    /// UPDATE fibers whose attributes or listeners differed and were patched.
    pub updates: usize,
    /// UPDATE fibers with identical attributes; nothing was sent to the host.
    pub unchanged: usize,
    /// Fibers from the deletion list whose host subtree was removed.
    pub deletions: usize,
}

impl CommitStats {
    /// True when the commit changed nothing on the host.
    pub fn is_empty(&self) -> bool {
        self.placements == 0 && self.updates == 0 && self.deletions == 0
    }
}

/// Removes the host subtree of every deleted fiber, then walks the pending
/// tree below `root` depth-first applying placements and updates.
pub(crate) fn commit_root(
    host: &mut dyn Host,
    tree: &FiberTree,
    root: FiberId,
    deletions: &[FiberId],
) -> Result<CommitStats, RenderError> {
    let mut stats = CommitStats::default();
    for &fiber in deletions {
        if commit_deletion(host, tree, fiber)? {
            stats.deletions += 1;
        }
    }

    let mut stack: Vec<FiberId> = tree[root].child.into_iter().collect();
    while let Some(id) = stack.pop() {
        commit_work(host, tree, id, &mut stats)?;
        let fiber = &tree[id];
        stack.extend(fiber.sibling);
        stack.extend(fiber.child);
    }
    Ok(stats)
}

fn commit_work(
    host: &mut dyn Host,
    tree: &FiberTree,
    id: FiberId,
    stats: &mut CommitStats,
) -> Result<(), RenderError> {
    let fiber = &tree[id];
    let Some(dom) = fiber.dom else {
        return Ok(());
    };
    match fiber.effect {
        Some(EffectTag::Placement) => {
            let parent = tree.host_parent(id).ok_or(RenderError::DetachedFiber(id))?;
            host.append_child(parent, dom)?;
            stats.placements += 1;
        }
        Some(EffectTag::Update) => {
            let previous = fiber
                .alternate
                .and_then(|alternate| tree.get(alternate))
                .map(|alternate| &alternate.props);
            match previous {
                Some(previous) if previous.same_attributes(&fiber.props) => stats.unchanged += 1,
                Some(previous) => {
                    update_node(host, dom, previous, &fiber.props)?;
                    stats.updates += 1;
                }
                None => {
                    log::warn!("update for {id:?} lost its alternate; skipping patch");
                }
            }
        }
        Some(EffectTag::Deletion) => {
            log::warn!("deletion tag on {id:?} inside the pending tree; ignored");
        }
        None => {}
    }
    Ok(())
}

/// Detaches the nearest host node at or below `id` from the nearest host
/// ancestor. Returns false when the fiber rendered no host node.
fn commit_deletion(
    host: &mut dyn Host,
    tree: &FiberTree,
    id: FiberId,
) -> Result<bool, RenderError> {
    let Some(node) = tree.host_node(id) else {
        return Ok(false);
    };
    let parent = tree.host_parent(id).ok_or(RenderError::DetachedFiber(id))?;
    host.remove_child(parent, node)?;
    Ok(true)
}
