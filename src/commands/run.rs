use crate::context::RollupContext;
use crate::dump;
use crate::script::{self, Step};
use crate::store::TreeStore;
use anyhow::{Context, Result, bail};
use log::{info, warn};
use std::io::Read;
use std::path::Path;

const EMPTY_TREE: &str = "(empty)";

pub fn run(context: &RollupContext, script_path: Option<&Path>, json: bool, strict: bool) -> Result<()> {
    let input = read_script(script_path)?;
    let ops = script::parse_script(&input)?;
    info!("run start (ops={}, json={}, strict={})", ops.len(), json, strict);

    let mut store = context.store();
    let mut ignored = Vec::new();

    for (line_no, op) in ops {
        match script::apply(&mut store, op) {
            Step::Mutated(outcome) => {
                if !outcome.is_applied() {
                    ignored.push((line_no, outcome));
                }
            }
            Step::Lookup { id, node } => {
                let text = match node {
                    Some(node) => dump::node_line(&node),
                    None => format!("not found: {}", id),
                };
                emit(json, &text);
            }
            Step::Dump => {
                emit(json, render(&store, context.indent()).trim_end());
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&dump::view_json(store.root()))?
        );
    } else {
        print!("{}", render(&store, context.indent()));
    }

    if strict && !ignored.is_empty() {
        for (line_no, outcome) in &ignored {
            warn!("line {}: {}", line_no, outcome);
        }
        bail!("{} operation(s) were not applied", ignored.len());
    }
    info!("run finished (ignored={})", ignored.len());
    Ok(())
}

fn read_script(path: Option<&Path>) -> Result<String> {
    match path {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read script: {}", path.display())),
        None => {
            let mut input = String::new();
            std::io::stdin()
                .read_to_string(&mut input)
                .context("Failed to read script from stdin")?;
            Ok(input)
        }
    }
}

fn render(store: &TreeStore, indent: usize) -> String {
    match store.root() {
        Some(root) => dump::render(root, indent),
        None => format!("{}\n", EMPTY_TREE),
    }
}

// Keeps stdout parseable when the final tree is printed as JSON.
fn emit(json: bool, text: &str) {
    if json {
        info!("{}", text);
    } else {
        println!("{}", text);
    }
}
