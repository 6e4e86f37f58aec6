use anyhow::Result;
use clap::Parser;
use log::info;

use rollup::cli::{Cli, Commands};
use rollup::commands;
use rollup::context::RollupContext;
use rollup::logging;

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logging(cli.logging_mode, cli.debug)?;
    let context = RollupContext::new(cli)?;
    info!("rollup starting");
    info!("logging mode: {:?}", context.invocation.logging_mode);
    info!("args: {:?}", std::env::args().collect::<Vec<_>>());

    match &context.invocation.command {
        Commands::Run {
            script,
            json,
            strict,
        } => commands::run::run(&context, script.as_deref(), *json, *strict),
        Commands::Dump { file, json } => commands::dump::run(&context, file, *json),
        Commands::Check { file, tolerance } => commands::check::run(&context, file, *tolerance),
        Commands::Schema => commands::schema::run(&context),
    }
}
