use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Opaque node identifier. Unique across a tree and never reassigned.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for NodeId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// A unit of work. Leaves carry an assigned progress; branches carry the mean of
/// their direct children.
///
/// Nodes inside a tree are shared through `Arc`, so an unchanged subtree is the
/// same allocation in every tree version that contains it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Node {
    pub id: NodeId,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub children: Vec<Arc<Node>>,
}

impl Node {
    pub fn leaf(id: impl Into<NodeId>, title: impl Into<String>, progress: f64) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            progress,
            children: Vec::new(),
        }
    }

    /// Builds a branch whose progress is already rolled up from `children`.
    pub fn branch(id: impl Into<NodeId>, title: impl Into<String>, children: Vec<Arc<Node>>) -> Self {
        let mut node = Self {
            id: id.into(),
            title: title.into(),
            progress: 0.0,
            children,
        };
        node.progress = crate::tree::calculate_progress(&node);
        node
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Total number of nodes in this subtree, including itself.
    pub fn node_count(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|child| child.node_count())
            .sum::<usize>()
    }
}

/// Partial update for a single node. Only the label and the progress can be
/// changed this way; identity and structure are out of reach.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NodeUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<f64>,
}

impl NodeUpdate {
    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            progress: None,
        }
    }

    pub fn progress(progress: f64) -> Self {
        Self {
            title: None,
            progress: Some(progress),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_progress(mut self, progress: f64) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.progress.is_none()
    }
}

/// Pre-order traversal yielding `(depth, node)` pairs, root at depth 0.
pub fn walk(root: &Arc<Node>) -> Walk<'_> {
    Walk {
        stack: vec![(0, root)],
    }
}

pub struct Walk<'a> {
    stack: Vec<(usize, &'a Arc<Node>)>,
}

impl<'a> Iterator for Walk<'a> {
    type Item = (usize, &'a Arc<Node>);

    fn next(&mut self) -> Option<Self::Item> {
        let (depth, node) = self.stack.pop()?;
        for child in node.children.iter().rev() {
            self.stack.push((depth + 1, child));
        }
        Some((depth, node))
    }
}
