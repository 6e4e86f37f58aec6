use anyhow::Result;

use crate::cli::Cli;
use crate::config::{self, RollupConfig};
use crate::store::TreeStore;

pub struct RollupContext {
    pub invocation: Cli,
    pub config: RollupConfig,
}

impl RollupContext {
    pub fn new(invocation: Cli) -> Result<Self> {
        let config = config::load()?;
        Ok(Self { invocation, config })
    }

    /// Empty store configured with the `[policy]` section.
    pub fn store(&self) -> TreeStore {
        TreeStore::with_policy(self.config.policy.store_policy())
    }

    pub fn indent(&self) -> usize {
        self.config.dump.indent
    }
}
