use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};
use tracing_subscriber::EnvFilter;

pub const LOG_ENV: &str = "CODE_OPENER_LOG";
const LOG_FILE: &str = "code-opener.log";

/// Sends tracing output to a log file in the data dir; the terminal belongs to
/// the picker while it runs.
pub fn init(data_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(data_dir).context("create app data dir")?;
    let path = data_dir.join(LOG_FILE);
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .context("open log file")?;

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|err| anyhow::anyhow!("install log subscriber: {err}"))?;

    Ok(path)
}
