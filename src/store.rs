use crate::node::{Node, NodeId, NodeUpdate};
use crate::tree;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// What to do with an explicit progress value aimed at a branch node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchProgress {
    /// Store the value verbatim; the next structural change under the branch
    /// overwrites it with the rollup.
    #[default]
    Accept,
    /// Drop the value and keep the rollup.
    Ignore,
}

impl BranchProgress {
    pub fn as_str(&self) -> &'static str {
        match self {
            BranchProgress::Accept => "accept",
            BranchProgress::Ignore => "ignore",
        }
    }
}

impl fmt::Display for BranchProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BranchProgress {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "accept" => Ok(BranchProgress::Accept),
            "ignore" => Ok(BranchProgress::Ignore),
            _ => Err(anyhow::anyhow!("Unknown branch progress policy: {}", value)),
        }
    }
}

/// Step applied by [`TreeStore::increment_progress`] when callers have no
/// preference.
pub const PROGRESS_STEP: f64 = 10.0;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorePolicy {
    pub protect_root: bool,
    pub branch_progress: BranchProgress,
    pub clamp_progress: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationOutcome {
    Applied,
    /// The current root was removed and the store is empty again.
    Cleared,
    NoRoot,
    NotFound(NodeId),
    Rejected(String),
}

impl MutationOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, MutationOutcome::Applied | MutationOutcome::Cleared)
    }
}

impl fmt::Display for MutationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MutationOutcome::Applied => f.write_str("applied"),
            MutationOutcome::Cleared => f.write_str("cleared"),
            MutationOutcome::NoRoot => f.write_str("no root"),
            MutationOutcome::NotFound(id) => write!(f, "not found: {}", id),
            MutationOutcome::Rejected(reason) => write!(f, "rejected: {}", reason),
        }
    }
}

/// Owner of the current tree version.
///
/// Every committed mutation swaps in a new root produced by the engine in
/// [`crate::tree`]. Unknown ids and mutations before a root exists are logged
/// and dropped, never returned as errors.
#[derive(Debug, Default)]
pub struct TreeStore {
    root: Option<Arc<Node>>,
    policy: StorePolicy,
}

impl TreeStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(policy: StorePolicy) -> Self {
        Self { root: None, policy }
    }

    pub fn root(&self) -> Option<&Arc<Node>> {
        self.root.as_ref()
    }

    pub fn set_root(&mut self, node: impl Into<Arc<Node>>) -> MutationOutcome {
        let node = node.into();
        debug!("set_root(id={})", node.id);
        self.root = Some(node);
        MutationOutcome::Applied
    }

    pub fn clear(&mut self) {
        self.root = None;
    }

    pub fn add_node(&mut self, parent_id: &NodeId, node: impl Into<Arc<Node>>) -> MutationOutcome {
        let Some(root) = &self.root else {
            warn!("add_node ignored: no root (parent={})", parent_id);
            return MutationOutcome::NoRoot;
        };
        let node = self.admit(node.into());
        let next = tree::add_child(root, parent_id, node);
        self.commit("add_node", parent_id, next)
    }

    pub fn update_node(&mut self, id: &NodeId, update: NodeUpdate) -> MutationOutcome {
        let Some(root) = &self.root else {
            warn!("update_node ignored: no root (id={})", id);
            return MutationOutcome::NoRoot;
        };
        let requested = !update.is_empty();
        let update = self.screen_update(root, id, update);
        if requested && update.is_empty() {
            warn!("update_node rejected: progress of branch '{}' is derived", id);
            return MutationOutcome::Rejected(format!("branch '{}' progress is derived", id));
        }
        let next = tree::update_node(root, id, &update);
        self.commit("update_node", id, next)
    }

    /// Raises a leaf's progress by `step`, capped at 100. Branches are refused
    /// because their progress comes from their children.
    pub fn increment_progress(&mut self, id: &NodeId, step: f64) -> MutationOutcome {
        let Some(root) = &self.root else {
            warn!("increment_progress ignored: no root (id={})", id);
            return MutationOutcome::NoRoot;
        };
        let Some(node) = tree::find_node_by_id(Some(root), id) else {
            warn!("increment_progress ignored: node '{}' not found", id);
            return MutationOutcome::NotFound(id.clone());
        };
        if !node.is_leaf() {
            warn!("increment_progress rejected: '{}' has children", id);
            return MutationOutcome::Rejected(format!("branch '{}' progress is derived", id));
        }
        let progress = (node.progress + step).min(100.0);
        self.update_node(id, NodeUpdate::progress(progress))
    }

    pub fn remove_node(&mut self, id: &NodeId) -> MutationOutcome {
        let Some(root) = &self.root else {
            warn!("remove_node ignored: no root (id={})", id);
            return MutationOutcome::NoRoot;
        };
        if &root.id == id {
            if self.policy.protect_root {
                warn!("remove_node rejected: '{}' is the root", id);
                return MutationOutcome::Rejected(format!("root '{}' is protected", id));
            }
            debug!("remove_node cleared the tree (root={})", id);
            self.root = None;
            return MutationOutcome::Cleared;
        }
        let next = tree::remove_node(root, id);
        self.commit("remove_node", id, next)
    }

    pub fn get_node_by_id(&self, id: &NodeId) -> Option<&Arc<Node>> {
        tree::find_node_by_id(self.root.as_ref(), id)
    }

    fn commit(&mut self, op: &str, target: &NodeId, next: Arc<Node>) -> MutationOutcome {
        let unchanged = self
            .root
            .as_ref()
            .is_some_and(|root| Arc::ptr_eq(root, &next));
        if unchanged {
            warn!("{} ignored: node '{}' not found", op, target);
            return MutationOutcome::NotFound(target.clone());
        }
        debug!("{} committed (target={})", op, target);
        self.root = Some(next);
        MutationOutcome::Applied
    }

    fn admit(&self, node: Arc<Node>) -> Arc<Node> {
        if !self.policy.clamp_progress {
            return node;
        }
        tree::recompute_all(&clamp_subtree(&node))
    }

    fn screen_update(&self, root: &Arc<Node>, id: &NodeId, mut update: NodeUpdate) -> NodeUpdate {
        if update.progress.is_none() {
            return update;
        }
        if self.policy.branch_progress == BranchProgress::Ignore
            && tree::find_node_by_id(Some(root), id).is_some_and(|node| !node.is_leaf())
        {
            debug!("explicit progress on branch '{}' dropped", id);
            update.progress = None;
        }
        if self.policy.clamp_progress {
            update.progress = update.progress.map(clamp);
        }
        update
    }
}

fn clamp(progress: f64) -> f64 {
    progress.clamp(0.0, 100.0)
}

fn clamp_subtree(node: &Arc<Node>) -> Arc<Node> {
    let children: Vec<Arc<Node>> = node.children.iter().map(clamp_subtree).collect();
    let progress = clamp(node.progress);
    let changed = children
        .iter()
        .zip(&node.children)
        .any(|(next, prev)| !Arc::ptr_eq(next, prev));
    if !changed && progress == node.progress {
        return Arc::clone(node);
    }
    Arc::new(Node {
        id: node.id.clone(),
        title: node.title.clone(),
        progress,
        children,
    })
}
