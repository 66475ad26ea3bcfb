//! `ionwf install` — register the service with systemd and start it.
//!
//! Re-running after a config change rewrites the unit and restarts the
//! service, so the new listen address takes effect immediately.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;

use crate::command_runner::CommandRunner;
use crate::config_store::YamlConfigStore;
use crate::output::OutputContext;
use crate::systemd::{self, Systemctl};

#[derive(Args)]
pub struct InstallArgs {
    /// Installation prefix holding the provisioned binary
    #[arg(long, default_value = "/opt/ionwf")]
    pub prefix: PathBuf,

    /// Print the unit file instead of installing it
    #[arg(long)]
    pub dry_run: bool,
}

/// Entry point for `ionwf install`.
///
/// # Errors
///
/// Returns an error if the binary is not provisioned, the unit cannot be
/// written, or any systemctl step fails.
pub async fn run(
    ctx: &OutputContext,
    systemctl: &Systemctl<impl CommandRunner>,
    store: &YamlConfigStore,
    args: &InstallArgs,
) -> Result<()> {
    let binary = args
        .prefix
        .join("bin")
        .join(crate::commands::provision::BINARY_FILENAME);
    anyhow::ensure!(
        binary.is_file(),
        "server binary not found at {} (run `ionwf provision` first)",
        binary.display()
    );

    let config = store.load()?;
    let unit = systemd::render_unit(&binary, &config);

    if args.dry_run {
        print!("{unit}");
        return Ok(());
    }

    let path = systemd::unit_path();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("cannot create {}", parent.display()))?;
    }
    std::fs::write(&path, &unit).with_context(|| format!("cannot write {}", path.display()))?;
    ctx.success(&format!("Wrote {}", path.display()));

    systemctl.daemon_reload().await?;
    systemctl.enable_now().await?;
    systemctl.restart().await?;

    ctx.success(&format!(
        "Service {} enabled and running on {}",
        systemd::UNIT_NAME,
        config.listen_addr()
    ));
    Ok(())
}
