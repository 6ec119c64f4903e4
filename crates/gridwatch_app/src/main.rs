//! `gridwatch` binary: manages tables of monitored searches and refreshes
//! them from the command line.

mod cli;
mod commands;
mod config;
mod logging;

use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use gridwatch_core::TableStore;
use gridwatch_engine::JsonFileStore;
use gridwatch_logging::watch_info;
use log::LevelFilter;

use crate::cli::Cli;
use crate::config::AppConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();
    let file_config = AppConfig::load(&cli.config)?;
    let config = cli.apply_overrides(file_config);

    let level = if config.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    logging::initialize(config.log, level);
    watch_info!(
        "gridwatch {} using data file {:?}",
        env!("CARGO_PKG_VERSION"),
        config.data_file
    );

    let mut store = TableStore::open(JsonFileStore::new(&config.data_file));
    let mut stdout = io::stdout().lock();
    let result = commands::execute(cli.command, &mut store, &config, &mut stdout);

    // Writes the default store on first use and retries a failed save.
    store
        .flush()
        .with_context(|| format!("Failed to save {:?}", config.data_file))?;
    result
}
