use crate::node::{Node, NodeId, NodeUpdate, walk};
use log::debug;
use serde::Serialize;
use std::sync::Arc;

/// Tolerance used when comparing a stored rollup against a recomputed mean.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Progress a node should carry: its own value for a leaf, the unweighted mean
/// of its direct children for a branch.
pub fn calculate_progress(node: &Node) -> f64 {
    if node.children.is_empty() {
        return node.progress;
    }
    let total: f64 = node.children.iter().map(|child| child.progress).sum();
    total / node.children.len() as f64
}

/// Pre-order search for the first node carrying `target`.
pub fn find_node_by_id<'a>(root: Option<&'a Arc<Node>>, target: &NodeId) -> Option<&'a Arc<Node>> {
    let root = root?;
    if &root.id == target {
        return Some(root);
    }
    root.children
        .iter()
        .find_map(|child| find_node_by_id(Some(child), target))
}

/// Appends `new_node` under `parent_id`, rebuilding only the path back to the root.
///
/// When no node carries `parent_id` the input root is handed back as the same
/// allocation, so `Arc::ptr_eq(&result, root)` means "parent not found". The
/// caller guarantees that `new_node.id` is not already in the tree.
pub fn add_child(root: &Arc<Node>, parent_id: &NodeId, new_node: Arc<Node>) -> Arc<Node> {
    debug!("add_child(parent={}, child={})", parent_id, new_node.id);
    add_child_inner(root, parent_id, &new_node)
}

fn add_child_inner(node: &Arc<Node>, parent_id: &NodeId, new_node: &Arc<Node>) -> Arc<Node> {
    if &node.id == parent_id {
        let mut children = node.children.clone();
        children.push(Arc::clone(new_node));
        return Arc::new(rebuilt(node, children));
    }
    rebuild_children(node, |child| add_child_inner(child, parent_id, new_node))
}

/// Applies `update` to the node carrying `target`.
///
/// An explicit progress is taken verbatim, branch or not. Without one, a branch
/// recomputes its rollup from its current children. Not-found follows the same
/// identical-root convention as [`add_child`].
pub fn update_node(root: &Arc<Node>, target: &NodeId, update: &NodeUpdate) -> Arc<Node> {
    debug!(
        "update_node(target={}, title={:?}, progress={:?})",
        target, update.title, update.progress
    );
    update_node_inner(root, target, update)
}

fn update_node_inner(node: &Arc<Node>, target: &NodeId, update: &NodeUpdate) -> Arc<Node> {
    if &node.id == target {
        let mut merged = Node::clone(node);
        if let Some(title) = &update.title {
            merged.title = title.clone();
        }
        match update.progress {
            Some(progress) => merged.progress = progress,
            None if !merged.children.is_empty() => {
                merged.progress = calculate_progress(&merged);
            }
            None => {}
        }
        return Arc::new(merged);
    }
    rebuild_children(node, |child| update_node_inner(child, target, update))
}

/// Removes the node carrying `target`, together with its subtree.
///
/// The root itself is never matched here; clearing the whole tree is the
/// container's job. A branch that loses its last child keeps its progress.
pub fn remove_node(root: &Arc<Node>, target: &NodeId) -> Arc<Node> {
    debug!("remove_node(target={})", target);
    remove_node_inner(root, target)
}

fn remove_node_inner(node: &Arc<Node>, target: &NodeId) -> Arc<Node> {
    if node.children.iter().any(|child| &child.id == target) {
        let remaining: Vec<Arc<Node>> = node
            .children
            .iter()
            .filter(|child| &child.id != target)
            .cloned()
            .collect();
        if remaining.is_empty() {
            // Frozen at the last rollup.
            return Arc::new(Node {
                children: remaining,
                ..Node::clone(node)
            });
        }
        return Arc::new(rebuilt(node, remaining));
    }
    rebuild_children(node, |child| remove_node_inner(child, target))
}

/// Re-derives every branch's progress bottom-up. Subtrees that already hold
/// the rollup invariant come back shared.
pub fn recompute_all(root: &Arc<Node>) -> Arc<Node> {
    let next = rebuild_children(root, recompute_all);
    if !Arc::ptr_eq(&next, root) {
        return next;
    }
    let expected = calculate_progress(root);
    if expected == root.progress {
        return next;
    }
    Arc::new(Node {
        progress: expected,
        ..Node::clone(root)
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Violation {
    pub id: NodeId,
    pub title: String,
    pub stored: f64,
    pub expected: f64,
}

/// Branches whose stored progress drifted from the mean of their children.
pub fn rollup_violations(root: &Arc<Node>, tolerance: f64) -> Vec<Violation> {
    walk(root)
        .filter(|(_, node)| !node.is_leaf())
        .filter_map(|(_, node)| {
            let expected = calculate_progress(node);
            if (node.progress - expected).abs() > tolerance {
                Some(Violation {
                    id: node.id.clone(),
                    title: node.title.clone(),
                    stored: node.progress,
                    expected,
                })
            } else {
                None
            }
        })
        .collect()
}

/// Maps `apply` over the children of `node`. If every child comes back as the
/// same allocation, `node` itself is returned; otherwise a new node is built
/// from the new children with its rollup recomputed.
fn rebuild_children<F>(node: &Arc<Node>, mut apply: F) -> Arc<Node>
where
    F: FnMut(&Arc<Node>) -> Arc<Node>,
{
    let mut changed: Option<Vec<Arc<Node>>> = None;
    for (index, child) in node.children.iter().enumerate() {
        let next = apply(child);
        match changed.as_mut() {
            Some(children) => children.push(next),
            None if !Arc::ptr_eq(&next, child) => {
                let mut children = Vec::with_capacity(node.children.len());
                children.extend(node.children[..index].iter().cloned());
                children.push(next);
                changed = Some(children);
            }
            None => {}
        }
    }

    match changed {
        Some(children) => Arc::new(rebuilt(node, children)),
        None => Arc::clone(node),
    }
}

fn rebuilt(node: &Node, children: Vec<Arc<Node>>) -> Node {
    let mut next = Node {
        id: node.id.clone(),
        title: node.title.clone(),
        progress: node.progress,
        children,
    };
    next.progress = calculate_progress(&next);
    next
}
