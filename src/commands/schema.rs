use crate::context::RollupContext;
use crate::script;
use anyhow::Result;

pub fn run(_context: &RollupContext) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&script::schema()?)?);
    Ok(())
}
