use crate::node::{Node, walk};
use serde_json::{Value, json};
use std::sync::Arc;

pub const DEFAULT_INDENT: usize = 2;

/// Two decimals at most, trailing zeros dropped: `50`, `87.5`, `33.33`.
pub fn format_progress(progress: f64) -> String {
    let text = format!("{:.2}", progress);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

pub fn node_line(node: &Node) -> String {
    format!(
        "{} ({}, {}%)",
        node.title,
        node.id,
        format_progress(node.progress)
    )
}

/// Indented pre-order dump, one `title (id, progress%)` line per node.
pub fn render(root: &Arc<Node>, indent: usize) -> String {
    let mut out = String::new();
    for (depth, node) in walk(root) {
        out.push_str(&" ".repeat(depth * indent));
        out.push_str(&node_line(node));
        out.push('\n');
    }
    out
}

pub fn view_json(root: Option<&Arc<Node>>) -> Value {
    match root {
        Some(node) => view_json_from(node),
        None => Value::Null,
    }
}

fn view_json_from(node: &Node) -> Value {
    let children = node
        .children
        .iter()
        .map(|child| view_json_from(child))
        .collect::<Vec<_>>();
    json!({
        "id": node.id,
        "title": node.title,
        "progress": node.progress,
        "leaf": node.is_leaf(),
        "children": children,
    })
}
