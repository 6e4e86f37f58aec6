use anyhow::{Context, Result};
use clap::ValueEnum;
use log::{Level, LevelFilter};
use std::fmt::Display;
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::str::FromStr;

/// Overrides the level picked by `--debug` (`error`, `warn`, `info`, `debug`, `trace`, `off`).
pub const LOG_LEVEL_ENV: &str = "ROLLUP_LOG";
/// Overrides the directory used by `--logging-mode file`.
pub const LOG_DIR_ENV: &str = "ROLLUP_LOG_DIR";

#[derive(Copy, Clone, Debug, ValueEnum)]
#[clap(rename_all = "lower")]
pub enum LoggingMode {
    File,
    Stderr,
}

pub fn init_logging(mode: LoggingMode, debug: bool) -> Result<()> {
    let level = level_filter(debug, std::env::var(LOG_LEVEL_ENV).ok().as_deref());

    // Dependencies stay at warn; only the tree engine and store are chatty.
    let mut dispatch = fern::Dispatch::new()
        .level(LevelFilter::Warn)
        .level_for(env!("CARGO_CRATE_NAME"), level)
        .format(|out, message, record| {
            let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
            out.finish(format_args!(
                "{}",
                log_line(
                    record.level(),
                    timestamp,
                    record.module_path().unwrap_or(record.target()),
                    record.line(),
                    message,
                )
            ))
        });

    match mode {
        LoggingMode::Stderr => {
            dispatch = dispatch.chain(std::io::stderr());
        }
        LoggingMode::File => match create_log_file() {
            Ok(log_file) => {
                dispatch = dispatch.chain(log_file);
            }
            Err(err) => {
                eprintln!("Failed to open log file: {:#}", err);
                dispatch = dispatch.chain(std::io::stderr());
            }
        },
    }

    dispatch.apply()?;
    Ok(())
}

fn level_filter(debug: bool, env_level: Option<&str>) -> LevelFilter {
    if let Some(level) = env_level.and_then(|value| LevelFilter::from_str(value.trim()).ok()) {
        return level;
    }
    if debug {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    }
}

fn log_line(
    level: Level,
    timestamp: impl Display,
    module: &str,
    line: Option<u32>,
    message: impl Display,
) -> String {
    let line = line.map_or_else(|| "?".to_string(), |line| line.to_string());
    format!("[{}] [{}] [{}:{}] {}", level, timestamp, module, line, message)
}

fn log_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(LOG_DIR_ENV) {
        return Ok(PathBuf::from(dir));
    }
    let base = dirs::data_local_dir().context("Failed to resolve local data directory")?;
    Ok(base.join("rollup").join("logs"))
}

fn create_log_file() -> Result<File> {
    let log_dir = log_dir()?;
    fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory {}", log_dir.display()))?;

    let date = chrono::Local::now().format("%Y-%m-%d");
    let log_path = log_dir.join(format!("rollup-{}.log", date));

    OpenOptions::new()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))
}
