//! systemd unit rendering and `systemctl` plumbing.
//!
//! The unit directory and the `systemctl` binary can both be overridden via
//! environment variables (`IONWF_UNIT_DIR`, `IONWF_SYSTEMCTL`) so the
//! install flow can run against a scratch directory and a scripted
//! systemctl in tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::NaiveDateTime;

use ionwf_common::{ServerConfig, ServiceState};

use crate::command_runner::CommandRunner;

/// Name of the systemd unit managed by this CLI.
pub const UNIT_NAME: &str = "ionwf-server.service";

/// Directory the unit file is written to.
#[must_use]
pub fn unit_dir() -> PathBuf {
    std::env::var("IONWF_UNIT_DIR")
        .map_or_else(|_| PathBuf::from("/etc/systemd/system"), PathBuf::from)
}

/// Full path of the managed unit file.
#[must_use]
pub fn unit_path() -> PathBuf {
    unit_dir().join(UNIT_NAME)
}

/// Render the unit file for the given server binary and configuration.
///
/// The listen address is baked into the unit as an environment variable, so
/// a config change takes effect on the next `ionwf install`.
#[must_use]
pub fn render_unit(binary: &Path, config: &ServerConfig) -> String {
    format!(
        "[Unit]\n\
         Description=ION ED workflow service\n\
         After=network-online.target\n\
         Wants=network-online.target\n\
         \n\
         [Service]\n\
         Type=simple\n\
         ExecStart={binary}\n\
         Environment=IONWF_LISTEN_ADDR={addr}\n\
         Restart=on-failure\n\
         RestartSec=5\n\
         \n\
         [Install]\n\
         WantedBy=multi-user.target\n",
        binary = binary.display(),
        addr = config.listen_addr(),
    )
}

/// Snapshot of the unit as reported by `systemctl show`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitStatus {
    pub state: ServiceState,
    pub enabled: bool,
    pub active_enter: Option<NaiveDateTime>,
}

/// Thin wrapper over the `systemctl` binary.
pub struct Systemctl<R> {
    runner: R,
    program: String,
}

impl<R: CommandRunner> Systemctl<R> {
    #[must_use]
    pub fn new(runner: R) -> Self {
        let program =
            std::env::var("IONWF_SYSTEMCTL").unwrap_or_else(|_| "systemctl".to_string());
        Self { runner, program }
    }

    /// Reload unit files after writing or removing the unit.
    ///
    /// # Errors
    ///
    /// Returns an error if systemctl cannot be spawned or exits non-zero.
    pub async fn daemon_reload(&self) -> Result<()> {
        self.checked(&["daemon-reload"]).await
    }

    /// Enable the unit and start it in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if systemctl cannot be spawned or exits non-zero.
    pub async fn enable_now(&self) -> Result<()> {
        self.checked(&["enable", "--now", UNIT_NAME]).await
    }

    /// Restart the unit so a rewritten unit file takes effect.
    ///
    /// # Errors
    ///
    /// Returns an error if systemctl cannot be spawned or exits non-zero.
    pub async fn restart(&self) -> Result<()> {
        self.checked(&["restart", UNIT_NAME]).await
    }

    /// Stop the unit and disable it in one step.
    ///
    /// # Errors
    ///
    /// Returns an error if systemctl cannot be spawned or exits non-zero.
    pub async fn disable_now(&self) -> Result<()> {
        self.checked(&["disable", "--now", UNIT_NAME]).await
    }

    /// Query the unit state via `systemctl show`.
    ///
    /// # Errors
    ///
    /// Returns an error if systemctl cannot be spawned or exits non-zero.
    pub async fn status(&self) -> Result<UnitStatus> {
        let output = self
            .runner
            .run(
                &self.program,
                &[
                    "show",
                    UNIT_NAME,
                    "--property=ActiveState,UnitFileState,ActiveEnterTimestamp",
                    "--no-pager",
                ],
            )
            .await?;
        anyhow::ensure!(
            output.status.success(),
            "systemctl show failed: {}",
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(parse_show_output(&String::from_utf8_lossy(&output.stdout)))
    }

    async fn checked(&self, args: &[&str]) -> Result<()> {
        let output = self
            .runner
            .run(&self.program, args)
            .await
            .with_context(|| format!("running {} {}", self.program, args.join(" ")))?;
        anyhow::ensure!(
            output.status.success(),
            "{} {} failed: {}",
            self.program,
            args.join(" "),
            String::from_utf8_lossy(&output.stderr).trim()
        );
        Ok(())
    }
}

/// Parse `Key=Value` lines from `systemctl show`.
fn parse_show_output(raw: &str) -> UnitStatus {
    let mut state = ServiceState::Unknown;
    let mut enabled = false;
    let mut active_enter = None;

    for line in raw.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "ActiveState" => state = ServiceState::parse(value),
            "UnitFileState" => enabled = value == "enabled",
            "ActiveEnterTimestamp" => active_enter = parse_enter_timestamp(value),
            _ => {}
        }
    }

    UnitStatus {
        state,
        enabled,
        active_enter,
    }
}

/// Parse an `ActiveEnterTimestamp` value like
/// `Thu 2025-02-01 10:45:00 UTC`. The weekday and timezone fields are
/// dropped; the timestamp is interpreted in the machine's local time, which
/// is what systemd reports on a default install.
fn parse_enter_timestamp(value: &str) -> Option<NaiveDateTime> {
    let fields: Vec<&str> = value.split_whitespace().collect();
    if fields.len() < 3 {
        return None;
    }
    let joined = format!("{} {}", fields[1], fields[2]);
    NaiveDateTime::parse_from_str(&joined, "%Y-%m-%d %H:%M:%S").ok()
}

/// Seconds elapsed since the unit became active, clamped at zero.
#[must_use]
pub fn uptime_seconds(active_enter: NaiveDateTime, now: NaiveDateTime) -> u64 {
    let delta = now.signed_duration_since(active_enter).num_seconds();
    u64::try_from(delta).unwrap_or(0)
}
