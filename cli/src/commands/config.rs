//! `ionwf config` — show and set configuration values.

use anyhow::Result;
use clap::Subcommand;

use ionwf_common::CONFIG_KEYS;

use crate::config_store::YamlConfigStore;
use crate::output::OutputContext;

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Print a single configuration value
    Get {
        /// Configuration key
        key: String,
    },
    /// Set configuration value
    Set {
        /// Configuration key
        key: String,
        /// Configuration value
        value: String,
    },
}

/// Run the config command.
///
/// # Errors
///
/// Returns an error for unknown keys, invalid values, or store failures.
pub fn run(
    ctx: &OutputContext,
    store: &YamlConfigStore,
    cmd: ConfigCommand,
    json: bool,
) -> Result<()> {
    match cmd {
        ConfigCommand::Show => show(ctx, store, json),
        ConfigCommand::Get { key } => {
            let config = store.load()?;
            println!("{}", config.get(&key)?);
            Ok(())
        }
        ConfigCommand::Set { key, value } => {
            let mut config = store.load()?;
            config.set(&key, &value)?;
            store.save(&config)?;
            ctx.success(&format!("Set {key} = {value}"));
            ctx.info("Run `ionwf install` to apply the change to the service.");
            Ok(())
        }
    }
}

fn show(ctx: &OutputContext, store: &YamlConfigStore, json: bool) -> Result<()> {
    let config = store.load()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }
    ctx.header("Configuration");
    ctx.kv("file", &store.path().display().to_string());
    for key in CONFIG_KEYS {
        ctx.kv(key, &config.get(key)?);
    }
    Ok(())
}
