//! Structural invariants over randomly shaped trees.

use bramble_dom::{DomTree, NodeId};
use quickcheck_macros::quickcheck;

/// Build a tree from a list of `(parent pick, is_text)` steps. Each step
/// appends one node under an already created element chosen by `pick`.
fn build(steps: &[(u8, bool)]) -> (DomTree, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let mut elements = vec![NodeId::ROOT];
    let mut all = Vec::new();

    for (i, &(pick, is_text)) in steps.iter().enumerate() {
        let parent = elements[usize::from(pick) % elements.len()];
        let id = if is_text {
            tree.create_text(format!("t{i}"))
        } else {
            let id = tree.create_element(format!("e{i}"));
            elements.push(id);
            id
        };
        tree.append_child(parent, id).unwrap();
        all.push(id);
    }
    (tree, all)
}

/// Every link between live nodes agrees with the parent's child list.
fn links_are_consistent(tree: &DomTree, ids: &[NodeId]) -> bool {
    ids.iter().chain(&[NodeId::ROOT]).filter(|&&id| tree.is_live(id)).all(|&id| {
        let children = tree.children(id);
        let parents_agree = children.iter().all(|&c| tree.parent(c) == Some(id));
        let siblings_agree = children.windows(2).all(|pair| {
            tree.next_sibling(pair[0]) == Some(pair[1]) && tree.prev_sibling(pair[1]) == Some(pair[0])
        });
        let ends_agree = children.first().is_none_or(|&c| tree.prev_sibling(c).is_none())
            && children.last().is_none_or(|&c| tree.next_sibling(c).is_none());
        let no_stale_links = children.iter().all(|&c| tree.is_live(c))
            && tree.parent(id).is_none_or(|p| tree.is_live(p));
        parents_agree && siblings_agree && ends_agree && no_stale_links
    })
}

#[quickcheck]
fn prop_child_parent_round_trips(steps: Vec<(u8, bool)>) -> bool {
    let (tree, ids) = build(&steps);
    ids.iter()
        .chain(&[NodeId::ROOT])
        .all(|&id| tree.first_child(id).is_none_or(|c| tree.parent(c) == Some(id)))
}

#[quickcheck]
fn prop_descendants_visit_every_node_once(steps: Vec<(u8, bool)>) -> bool {
    let (tree, ids) = build(&steps);
    let mut visited: Vec<_> = tree.descendants(NodeId::ROOT).collect();
    visited.sort();
    let mut expected = ids;
    expected.sort();
    visited == expected
}

#[quickcheck]
fn prop_remove_subtree_keeps_links_consistent(steps: Vec<(u8, bool)>, victim: u8) -> bool {
    let (mut tree, ids) = build(&steps);
    if ids.is_empty() {
        return true;
    }
    let target = ids[usize::from(victim) % ids.len()];
    let doomed: Vec<_> = std::iter::once(target).chain(tree.descendants(target)).collect();

    let removed = tree.remove_subtree(target).unwrap();

    removed == doomed.len()
        && doomed.iter().all(|&id| !tree.is_live(id))
        && links_are_consistent(&tree, &ids)
}

#[quickcheck]
fn prop_remove_node_keeps_links_consistent(steps: Vec<(u8, bool)>, victim: u8) -> bool {
    let (mut tree, ids) = build(&steps);
    if ids.is_empty() {
        return true;
    }
    let target = ids[usize::from(victim) % ids.len()];
    let before = tree.len();

    let _ = tree.remove_node(target).unwrap();

    tree.len() == before - 1
        && !tree.is_live(target)
        && tree.descendants(NodeId::ROOT).count() == before - 2
        && links_are_consistent(&tree, &ids)
}
