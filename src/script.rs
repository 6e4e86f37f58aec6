use crate::node::{Node, NodeId, NodeUpdate};
use crate::store::{MutationOutcome, PROGRESS_STEP, TreeStore};
use crate::tree;
use anyhow::{Context, Result};
use schemars::JsonSchema;
use schemars::generate::SchemaSettings;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

/// One line of an operation script (JSON Lines, tagged by `op`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum ScriptOp {
    SetRoot {
        node: Node,
    },
    /// Replaces the root with [`sample_project`].
    Seed,
    Add {
        parent: NodeId,
        node: NewNode,
    },
    Update {
        id: NodeId,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        progress: Option<f64>,
    },
    /// Raises a leaf's progress by `step` (default 10), capped at 100.
    Increment {
        id: NodeId,
        #[serde(default = "default_step")]
        step: f64,
    },
    Remove {
        id: NodeId,
    },
    Get {
        id: NodeId,
    },
    Dump,
}

fn default_step() -> f64 {
    PROGRESS_STEP
}

fn default_title() -> String {
    "New task".to_string()
}

/// A node to insert. Without an `id`, a fresh UUID is assigned; without a
/// `title`, it is called "New task".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct NewNode {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<NodeId>,
    #[serde(default = "default_title")]
    pub title: String,
    #[serde(default)]
    pub progress: f64,
    #[serde(default)]
    pub children: Vec<Arc<Node>>,
}

impl NewNode {
    pub fn into_node(self) -> Node {
        Node {
            id: self.id.unwrap_or_else(NodeId::generate),
            title: self.title,
            progress: self.progress,
            children: self.children,
        }
    }
}

/// Starter project: a root with planning, development and testing leaves,
/// all at 0%.
pub fn sample_project() -> Node {
    Node::branch(
        "root",
        "Project",
        vec![
            Arc::new(Node::leaf("plan", "Planning", 0.0)),
            Arc::new(Node::leaf("dev", "Development", 0.0)),
            Arc::new(Node::leaf("test", "Testing", 0.0)),
        ],
    )
}

/// Result of applying one script line to a store.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Mutated(MutationOutcome),
    Lookup {
        id: NodeId,
        node: Option<Arc<Node>>,
    },
    Dump,
}

/// Parses a script, skipping blank lines and `#` comments. Each returned op
/// carries its 1-based line number.
pub fn parse_script(input: &str) -> Result<Vec<(usize, ScriptOp)>> {
    let mut ops = Vec::new();
    for (index, line) in input.lines().enumerate() {
        let line_no = index + 1;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let op = serde_json::from_str::<ScriptOp>(trimmed)
            .with_context(|| format!("Invalid operation on line {}", line_no))?;
        ops.push((line_no, op));
    }
    Ok(ops)
}

/// Seed subtrees are normalised before they enter the store, so a script
/// never introduces a stale rollup.
pub fn apply(store: &mut TreeStore, op: ScriptOp) -> Step {
    match op {
        ScriptOp::SetRoot { node } => {
            let root = tree::recompute_all(&Arc::new(node));
            Step::Mutated(store.set_root(root))
        }
        ScriptOp::Seed => Step::Mutated(store.set_root(sample_project())),
        ScriptOp::Add { parent, node } => {
            let node = tree::recompute_all(&Arc::new(node.into_node()));
            Step::Mutated(store.add_node(&parent, node))
        }
        ScriptOp::Update {
            id,
            title,
            progress,
        } => Step::Mutated(store.update_node(&id, NodeUpdate { title, progress })),
        ScriptOp::Increment { id, step } => Step::Mutated(store.increment_progress(&id, step)),
        ScriptOp::Remove { id } => Step::Mutated(store.remove_node(&id)),
        ScriptOp::Get { id } => {
            let node = store.get_node_by_id(&id).cloned();
            Step::Lookup { id, node }
        }
        ScriptOp::Dump => Step::Dump,
    }
}

pub fn schema() -> Result<Value> {
    let schema = SchemaSettings::draft2020_12()
        .into_generator()
        .into_root_schema_for::<ScriptOp>();
    Ok(serde_json::to_value(schema)?)
}
