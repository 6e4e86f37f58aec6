use crate::commands::read_tree;
use crate::context::RollupContext;
use crate::dump;
use crate::tree::recompute_all;
use anyhow::Result;
use std::path::Path;

pub fn run(context: &RollupContext, file: &Path, json: bool) -> Result<()> {
    let root = recompute_all(&read_tree(file)?);
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&dump::view_json(Some(&root)))?
        );
    } else {
        print!("{}", dump::render(&root, context.indent()));
    }
    Ok(())
}
