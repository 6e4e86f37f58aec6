#![allow(dead_code)]

use anyhow::{Context, Result};
use serde_json::Value;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use uuid::Uuid;

pub struct TestDir {
    pub path: PathBuf,
}

impl TestDir {
    pub fn new(name: &str) -> Result<Self> {
        let path = temp_dir("rollup_tests", name);
        fs::create_dir_all(&path)?;
        Ok(Self { path })
    }

    /// Copies a file from `tests/fixtures` into the test directory.
    pub fn fixture(&self, name: &str) -> Result<PathBuf> {
        let src = Path::new(env!("CARGO_MANIFEST_DIR"))
            .join("tests")
            .join("fixtures")
            .join(name);
        let dest = self.path.join(name);
        fs::copy(&src, &dest).with_context(|| format!("Missing fixture {}", src.display()))?;
        Ok(dest)
    }

    pub fn write(&self, path: &str, content: &str) -> Result<()> {
        let p = self.path.join(path);
        if let Some(parent) = p.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(p, content)?;
        Ok(())
    }

    pub fn run(&self, args: &[&str]) -> Result<String> {
        let output = build_cmd(&self.path, args).output()?;
        if !output.status.success() {
            anyhow::bail!(
                "rollup failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8(output.stdout)?)
    }

    pub fn run_err(&self, args: &[&str]) -> Result<String> {
        let output = build_cmd(&self.path, args).output()?;
        if output.status.success() {
            anyhow::bail!("rollup succeeded but expected failure");
        }
        Ok(String::from_utf8(output.stderr)?)
    }

    pub fn run_with_stdin(&self, args: &[&str], stdin: &str) -> Result<String> {
        let mut child = build_cmd(&self.path, args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;
        {
            let input = child.stdin.as_mut().context("Failed to open stdin")?;
            input.write_all(stdin.as_bytes())?;
        }
        let output = child.wait_with_output()?;
        if !output.status.success() {
            anyhow::bail!(
                "rollup failed: {}",
                String::from_utf8_lossy(&output.stderr)
            );
        }
        Ok(String::from_utf8(output.stdout)?)
    }
}

// Helpers

fn temp_dir(base: &str, name: &str) -> PathBuf {
    std::env::temp_dir()
        .join(base)
        .join(name)
        .join(Uuid::new_v4().to_string())
}

fn build_cmd(dir: &Path, args: &[&str]) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_rollup"));
    cmd.args(args).current_dir(dir);
    cmd
}

/// Parse CLI JSON output into a serde_json::Value.
pub fn json(output: &str) -> Result<Value> {
    serde_json::from_str(output).with_context(|| format!("Invalid JSON: {}", truncate(output, 200)))
}

pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        format!("{}...", s.chars().take(max).collect::<String>())
    }
}

/// Depth-first search of `--json` tree output for the node with `id`.
pub fn find_node<'a>(node: &'a Value, id: &str) -> Option<&'a Value> {
    if node.get("id").and_then(|value| value.as_str()) == Some(id) {
        return Some(node);
    }
    node.get("children")?
        .as_array()?
        .iter()
        .find_map(|child| find_node(child, id))
}

pub fn progress_of(root: &Value, id: &str) -> Result<f64> {
    find_node(root, id)
        .and_then(|node| node["progress"].as_f64())
        .with_context(|| format!("Node '{id}' not found in output"))
}
