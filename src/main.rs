mod catalog;
mod cli;
mod config;
mod editor;
mod error;
mod launcher;
mod logging;
mod reconcile;
mod selection;
mod ui;

use anyhow::Result;

fn main() -> Result<()> {
    cli::run()
}
