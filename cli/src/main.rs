//! ionwf CLI - deploy and operate the ION ED workflow service

#![cfg_attr(test, allow(clippy::expect_used))]

use clap::Parser;

mod cli;
mod command_runner;
mod commands;
mod config_store;
mod output;
mod systemd;

use cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = cli.run().await {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}
