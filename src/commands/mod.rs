pub mod check;
pub mod dump;
pub mod run;
pub mod schema;

use crate::node::Node;
use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

/// Reads a tree JSON file as-is, without touching stored rollups.
pub fn read_tree(path: &Path) -> Result<Arc<Node>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read tree: {}", path.display()))?;
    let node: Node = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse tree: {}", path.display()))?;
    Ok(Arc::new(node))
}
