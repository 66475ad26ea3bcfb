//! `ionwf uninstall` — stop the service and remove its unit.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::command_runner::CommandRunner;
use crate::config_store::YamlConfigStore;
use crate::output::OutputContext;
use crate::systemd::{self, Systemctl};

#[derive(Args)]
pub struct UninstallArgs {
    /// Installation prefix to remove together with the unit
    #[arg(long, default_value = "/opt/ionwf")]
    pub prefix: PathBuf,

    /// Also delete the installed binary and configuration
    #[arg(long)]
    pub purge: bool,
}

/// Entry point for `ionwf uninstall`.
///
/// Uninstalling a service that was never installed is not an error.
///
/// # Errors
///
/// Returns an error if removing files or reloading systemd fails.
pub async fn run(
    ctx: &OutputContext,
    systemctl: &Systemctl<impl CommandRunner>,
    args: &UninstallArgs,
) -> Result<()> {
    let path = systemd::unit_path();

    if path.exists() {
        if let Err(e) = systemctl.disable_now().await {
            ctx.warn(&format!("could not stop service: {e}"));
        }
        std::fs::remove_file(&path)
            .with_context(|| format!("cannot remove {}", path.display()))?;
        systemctl.daemon_reload().await?;
        ctx.success(&format!("Removed {}", path.display()));
    } else {
        ctx.info("Service is not installed.");
    }

    if args.purge {
        if args.prefix.exists() {
            std::fs::remove_dir_all(&args.prefix)
                .with_context(|| format!("cannot remove {}", args.prefix.display()))?;
            ctx.success(&format!("Removed {}", args.prefix.display()));
        }
        let config_path = YamlConfigStore.path();
        if config_path.exists() {
            std::fs::remove_file(&config_path)
                .with_context(|| format!("cannot remove {}", config_path.display()))?;
            ctx.success(&format!("Removed {}", config_path.display()));
        }
    }

    Ok(())
}
