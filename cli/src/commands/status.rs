//! Status command implementation.
//!
//! Combines the systemd view of the unit with a direct HTTP health probe of
//! the configured listen address.

use std::time::Duration;

use anyhow::Result;

use ionwf_common::{ServerConfig, ServiceState, StatusReport};

use crate::command_runner::CommandRunner;
use crate::config_store::YamlConfigStore;
use crate::output::OutputContext;
use crate::systemd::{self, Systemctl};

/// Timeout for the health probe request.
const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

/// Format uptime seconds as human-readable string.
///
/// Returns "Xh Ym" if hours > 0, otherwise "Xm".
#[must_use]
pub fn format_uptime(seconds: u64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;

    if hours > 0 {
        format!("{hours}h {minutes}m")
    } else {
        format!("{minutes}m")
    }
}

/// URL probed for liveness. A wildcard bind address is reachable via
/// loopback, so probe that instead.
#[must_use]
pub fn probe_url(config: &ServerConfig) -> String {
    let host = if config.host.is_unspecified() {
        "127.0.0.1".to_string()
    } else {
        config.host.to_string()
    };
    format!("http://{host}:{}/health", config.port)
}

/// GET the health endpoint; `true` means a 2xx answer.
fn probe_health(url: &str) -> bool {
    let agent = ureq::AgentBuilder::new()
        .timeout_connect(PROBE_TIMEOUT)
        .timeout(PROBE_TIMEOUT)
        .build();
    agent.get(url).call().is_ok()
}

/// Entry point for `ionwf status`.
///
/// # Errors
///
/// Returns an error if systemctl cannot be queried or the config cannot be
/// read.
pub async fn run(
    ctx: &OutputContext,
    systemctl: &Systemctl<impl CommandRunner>,
    store: &YamlConfigStore,
    json: bool,
) -> Result<()> {
    let config = store.load()?;
    let unit = systemctl.status().await?;

    let uptime_seconds = match (unit.state, unit.active_enter) {
        (ServiceState::Active, Some(entered)) => Some(systemd::uptime_seconds(
            entered,
            chrono::Local::now().naive_local(),
        )),
        _ => None,
    };

    let health_ok = (unit.state == ServiceState::Active).then(|| probe_health(&probe_url(&config)));

    let report = StatusReport {
        unit: systemd::UNIT_NAME.to_string(),
        enabled: unit.enabled,
        state: unit.state,
        uptime_seconds,
        listen_addr: config.listen_addr(),
        health_ok,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    render(ctx, &report);
    Ok(())
}

fn render(ctx: &OutputContext, report: &StatusReport) {
    ctx.header("Service");
    ctx.kv("unit    ", &report.unit);
    ctx.kv("state   ", report.state.as_str());
    ctx.kv("enabled ", if report.enabled { "yes" } else { "no" });
    if let Some(uptime) = report.uptime_seconds {
        ctx.kv("uptime  ", &format_uptime(uptime));
    }
    ctx.kv("listen  ", &report.listen_addr);
    match report.health_ok {
        Some(true) => ctx.success("health endpoint responding"),
        Some(false) => ctx.warn("health endpoint not responding"),
        None => {}
    }
}
