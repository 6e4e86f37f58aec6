use crate::commands::read_tree;
use crate::context::RollupContext;
use crate::dump::format_progress;
use crate::tree::rollup_violations;
use anyhow::{Result, bail};
use log::{info, warn};
use std::path::Path;

pub fn run(_context: &RollupContext, file: &Path, tolerance: f64) -> Result<()> {
    let root = read_tree(file)?;
    let violations = rollup_violations(&root, tolerance);

    if violations.is_empty() {
        info!("All clear! Every branch matches its children.");
        println!("ok: {} node(s) checked", root.node_count());
        Ok(())
    } else {
        warn!("Found {} stale rollup(s):", violations.len());
        for violation in &violations {
            warn!(
                "  {} ({}) stored {}% expected {}%",
                violation.title,
                violation.id,
                format_progress(violation.stored),
                format_progress(violation.expected)
            );
        }
        bail!(
            "Rollup check failed: {} branch(es) out of date",
            violations.len()
        );
    }
}
