use anyhow::Result;
use std::fs;

mod common;
use common::{TestDir, json, progress_of};

fn project_script(dir: &TestDir, extra: &[&str]) -> Result<String> {
    let path = dir.fixture("project.jsonl")?;
    let mut script = fs::read_to_string(&path)?;
    for line in extra {
        script.push_str(line);
        script.push('\n');
    }
    dir.write("script.jsonl", &script)?;
    Ok("script.jsonl".to_string())
}

#[test]
fn test_run_builds_three_level_rollup() -> Result<()> {
    let dir = TestDir::new("three_level")?;
    let script = project_script(&dir, &[])?;

    let output = dir.run(&["run", &script, "--json"])?;
    let tree = json(&output)?;

    assert_eq!(progress_of(&tree, "a")?, 75.0);
    assert_eq!(progress_of(&tree, "b")?, 100.0);
    assert_eq!(progress_of(&tree, "root")?, 87.5);
    assert_eq!(tree["children"][0]["leaf"], false);
    Ok(())
}

#[test]
fn test_run_update_then_remove() -> Result<()> {
    let dir = TestDir::new("update_remove")?;
    let script = project_script(
        &dir,
        &[r#"{"op": "update", "id": "a1", "progress": 0}"#],
    )?;
    let tree = json(&dir.run(&["run", &script, "--json"])?)?;
    assert_eq!(progress_of(&tree, "a")?, 25.0);
    assert_eq!(progress_of(&tree, "root")?, 62.5);

    let script = project_script(
        &dir,
        &[
            r#"{"op": "update", "id": "a1", "progress": 0}"#,
            r#"{"op": "remove", "id": "a2"}"#,
        ],
    )?;
    let tree = json(&dir.run(&["run", &script, "--json"])?)?;
    assert_eq!(progress_of(&tree, "a")?, 0.0);
    assert_eq!(progress_of(&tree, "root")?, 50.0);
    assert!(common::find_node(&tree, "a2").is_none());
    Ok(())
}

#[test]
fn test_run_text_output_with_lookups() -> Result<()> {
    let dir = TestDir::new("text_output")?;
    let script = project_script(
        &dir,
        &[
            r#"{"op": "get", "id": "a2"}"#,
            r#"{"op": "get", "id": "ghost"}"#,
        ],
    )?;

    let output = dir.run(&["run", &script])?;
    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines[0], "Review (a2, 50%)");
    assert_eq!(lines[1], "not found: ghost");
    assert_eq!(lines[2], "Project (root, 87.5%)");
    assert_eq!(lines[3], "  Design (a, 75%)");
    assert_eq!(lines[4], "    Sketch (a1, 100%)");
    assert_eq!(lines.len(), 7);
    Ok(())
}

#[test]
fn test_run_removing_root_clears_tree() -> Result<()> {
    let dir = TestDir::new("remove_root")?;
    let script = project_script(&dir, &[r#"{"op": "remove", "id": "root"}"#])?;

    let tree = json(&dir.run(&["run", &script, "--json"])?)?;
    assert!(tree.is_null());

    let text = dir.run(&["run", &script])?;
    assert_eq!(text.trim(), "(empty)");
    Ok(())
}

#[test]
fn test_run_ignores_unknown_ids_unless_strict() -> Result<()> {
    let dir = TestDir::new("strict")?;
    let script = project_script(
        &dir,
        &[
            r#"{"op": "add", "parent": "ghost", "node": {"id": "z"}}"#,
            r#"{"op": "update", "id": "ghost", "title": "x"}"#,
            r#"{"op": "remove", "id": "ghost"}"#,
        ],
    )?;

    let tree = json(&dir.run(&["run", &script, "--json"])?)?;
    assert_eq!(progress_of(&tree, "root")?, 87.5);
    assert!(common::find_node(&tree, "z").is_none());

    let stderr = dir.run_err(&["run", &script, "--strict"])?;
    assert!(stderr.contains("3 operation(s) were not applied"), "got: {stderr}");
    Ok(())
}

#[test]
fn test_run_mutations_before_root_are_ignored() -> Result<()> {
    let dir = TestDir::new("no_root")?;
    dir.write(
        "script.jsonl",
        "{\"op\": \"add\", \"parent\": \"root\", \"node\": {\"id\": \"a\"}}\n{\"op\": \"update\", \"id\": \"a\", \"progress\": 5}\n",
    )?;
    let tree = json(&dir.run(&["run", "script.jsonl", "--json"])?)?;
    assert!(tree.is_null());
    Ok(())
}

#[test]
fn test_run_reads_stdin() -> Result<()> {
    let dir = TestDir::new("stdin")?;
    let script = "\
{\"op\": \"set_root\", \"node\": {\"id\": \"root\", \"title\": \"Project\"}}
{\"op\": \"add\", \"parent\": \"root\", \"node\": {\"id\": \"a\", \"progress\": 25}}
{\"op\": \"add\", \"parent\": \"root\", \"node\": {\"id\": \"b\", \"progress\": 50}}
{\"op\": \"add\", \"parent\": \"root\", \"node\": {\"id\": \"c\", \"progress\": 75}}
";
    let tree = json(&dir.run_with_stdin(&["run", "--json"], script)?)?;
    assert_eq!(progress_of(&tree, "root")?, 50.0);
    Ok(())
}

#[test]
fn test_run_rejects_malformed_line() -> Result<()> {
    let dir = TestDir::new("malformed")?;
    dir.write(
        "script.jsonl",
        "{\"op\": \"set_root\", \"node\": {\"id\": \"root\"}}\nnot-json\n",
    )?;
    let stderr = dir.run_err(&["run", "script.jsonl"])?;
    assert!(stderr.contains("line 2"), "got: {stderr}");
    Ok(())
}

#[test]
fn test_run_honours_policy_config() -> Result<()> {
    let dir = TestDir::new("policy_config")?;
    dir.write(
        "rollup.toml",
        "[policy]\nprotect_root = true\nbranch_progress = \"ignore\"\nclamp_progress = true\n",
    )?;
    let script = project_script(
        &dir,
        &[
            r#"{"op": "update", "id": "a", "progress": 5}"#,
            r#"{"op": "update", "id": "b", "progress": 400}"#,
            r#"{"op": "remove", "id": "root"}"#,
        ],
    )?;

    let tree = json(&dir.run(&["run", &script, "--json"])?)?;
    assert_eq!(progress_of(&tree, "a")?, 75.0);
    assert_eq!(progress_of(&tree, "b")?, 100.0);
    assert_eq!(progress_of(&tree, "root")?, 87.5);

    let stderr = dir.run_err(&["run", &script, "--strict"])?;
    assert!(stderr.contains("2 operation(s) were not applied"), "got: {stderr}");
    Ok(())
}

#[test]
fn test_run_seed_and_increment() -> Result<()> {
    let dir = TestDir::new("seed_increment")?;
    dir.write(
        "script.jsonl",
        "\
{\"op\": \"seed\"}
{\"op\": \"increment\", \"id\": \"plan\"}
{\"op\": \"increment\", \"id\": \"dev\", \"step\": 95}
{\"op\": \"increment\", \"id\": \"dev\"}
{\"op\": \"increment\", \"id\": \"root\"}
",
    )?;

    let tree = json(&dir.run(&["run", "script.jsonl", "--json"])?)?;
    assert_eq!(progress_of(&tree, "plan")?, 10.0);
    assert_eq!(progress_of(&tree, "dev")?, 100.0);
    assert_eq!(progress_of(&tree, "test")?, 0.0);
    assert!((progress_of(&tree, "root")? - 110.0 / 3.0).abs() < 1e-9);

    let stderr = dir.run_err(&["run", "script.jsonl", "--strict"])?;
    assert!(stderr.contains("1 operation(s) were not applied"), "got: {stderr}");
    Ok(())
}
