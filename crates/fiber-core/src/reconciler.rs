//! Positional child diffing.
//!
//! New child descriptors are matched against the previous child fibers by
//! index only. A same-typed pair becomes an UPDATE that keeps the old host
//! node; anything else is a PLACEMENT for the new descriptor plus a DELETION
//! for the old fiber. Reordering a list therefore shows up as updates,
//! placements and deletions rather than moves.

use crate::element::Element;
use crate::fiber::{EffectTag, Fiber, FiberId, FiberTree};

/// Builds the child chain of `wip` from `elements`, diffing against the
/// children of `wip.alternate`. Old fibers with no counterpart are tagged
/// DELETION and pushed onto `deletions`.
pub(crate) fn reconcile_children(
    tree: &mut FiberTree,
    deletions: &mut Vec<FiberId>,
    wip: FiberId,
    elements: &[Element],
) {
    let mut old = tree[wip]
        .alternate
        .and_then(|alternate| tree.get(alternate))
        .and_then(Fiber::child);
    let mut previous: Option<FiberId> = None;
    let mut index = 0;
    tree[wip].child = None;

    while index < elements.len() || old.is_some() {
        let element = elements.get(index);
        let old_fiber = old.and_then(|id| tree.get(id).map(|fiber| (id, fiber)));
        let same_type = match (element, old_fiber) {
            (Some(element), Some((_, fiber))) => fiber.ty.as_ref() == Some(element.ty()),
            _ => false,
        };
        let old_dom = old_fiber.and_then(|(_, fiber)| fiber.dom);
        let next_old = old_fiber.and_then(|(_, fiber)| fiber.sibling);

        let new_fiber = match (element, old) {
            (Some(element), Some(old_id)) if same_type => {
                Some(tree.insert(Fiber::update(element, wip, old_id, old_dom)))
            }
            (Some(element), _) => Some(tree.insert(Fiber::placement(element, wip))),
            (None, _) => None,
        };

        if !same_type {
            if let Some(old_id) = old.filter(|id| tree.contains(*id)) {
                tree[old_id].effect = Some(EffectTag::Deletion);
                deletions.push(old_id);
            }
        }

        if let Some(new_id) = new_fiber {
            match previous {
                Some(previous) => tree[previous].sibling = Some(new_id),
                None => tree[wip].child = Some(new_id),
            }
            previous = Some(new_id);
        }

        old = next_old;
        index += 1;
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::element::{create_element, create_text_element, Props};

    fn root_with(tree: &mut FiberTree, alternate: Option<FiberId>) -> FiberId {
        tree.insert(Fiber::root(0, Rc::new(Props::new()), alternate))
    }

    fn effects(tree: &FiberTree, parent: FiberId) -> Vec<Option<EffectTag>> {
        tree.children(parent)
            .into_iter()
            .map(|id| tree[id].effect)
            .collect()
    }

    fn committed(tree: &mut FiberTree, elements: &[Element]) -> FiberId {
        let root = root_with(tree, None);
        let mut deletions = Vec::new();
        reconcile_children(tree, &mut deletions, root, elements);
        for (offset, child) in tree.children(root).into_iter().enumerate() {
            tree[child].dom = Some(offset + 1);
        }
        root
    }

    #[test]
    fn first_pass_places_everything() {
        let mut tree = FiberTree::new();
        let root = root_with(&mut tree, None);
        let mut deletions = Vec::new();
        let elements = [
            create_element("a", Props::new()),
            create_text_element("b"),
        ];
        reconcile_children(&mut tree, &mut deletions, root, &elements);
        assert_eq!(
            effects(&tree, root),
            vec![Some(EffectTag::Placement), Some(EffectTag::Placement)]
        );
        assert!(deletions.is_empty());
    }

    #[test]
    fn same_type_reuses_host_node_and_links_alternate() {
        let mut tree = FiberTree::new();
        let old_root = committed(&mut tree, &[create_element("p", Props::new())]);
        let old_child = tree.children(old_root)[0];

        let root = root_with(&mut tree, Some(old_root));
        let mut deletions = Vec::new();
        let next = [create_element("p", Props::new().with("id", "x"))];
        reconcile_children(&mut tree, &mut deletions, root, &next);

        let child = tree.children(root)[0];
        assert_eq!(tree[child].effect, Some(EffectTag::Update));
        assert_eq!(tree[child].alternate, Some(old_child));
        assert_eq!(tree[child].dom, Some(1));
        assert!(deletions.is_empty());
    }

    #[test]
    fn type_change_is_placement_plus_deletion() {
        let mut tree = FiberTree::new();
        let old_root = committed(&mut tree, &[create_element("p", Props::new())]);
        let old_child = tree.children(old_root)[0];

        let root = root_with(&mut tree, Some(old_root));
        let mut deletions = Vec::new();
        reconcile_children(
            &mut tree,
            &mut deletions,
            root,
            &[create_element("div", Props::new())],
        );

        assert_eq!(effects(&tree, root), vec![Some(EffectTag::Placement)]);
        assert_eq!(deletions, vec![old_child]);
        assert_eq!(tree[old_child].effect, Some(EffectTag::Deletion));
    }

    #[test]
    fn trailing_removals_only_produce_deletions() {
        let mut tree = FiberTree::new();
        let items: Vec<Element> = (0..5).map(|i| create_text_element(format!("{i}"))).collect();
        let old_root = committed(&mut tree, &items);
        let old_children = tree.children(old_root);

        let root = root_with(&mut tree, Some(old_root));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, &mut deletions, root, &items[..2]);

        assert_eq!(
            effects(&tree, root),
            vec![Some(EffectTag::Update), Some(EffectTag::Update)]
        );
        assert_eq!(deletions, old_children[2..].to_vec());
    }

    #[test]
    fn matching_is_positional_not_by_identity() {
        let mut tree = FiberTree::new();
        let a = create_element("a", Props::new());
        let b = create_element("b", Props::new());
        let old_root = committed(&mut tree, &[a, b.clone()]);
        let old_children = tree.children(old_root);

        let root = root_with(&mut tree, Some(old_root));
        let mut deletions = Vec::new();
        reconcile_children(&mut tree, &mut deletions, root, &[b]);

        assert_eq!(effects(&tree, root), vec![Some(EffectTag::Placement)]);
        assert_eq!(deletions, old_children);
    }
}
