//! CLI argument parsing with clap derive

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::command_runner::{TokioCommandRunner, DEFAULT_CMD_TIMEOUT};
use crate::commands;
use crate::config_store::YamlConfigStore;
use crate::systemd::Systemctl;

/// Deploy and operate the ION ED workflow service
#[derive(Parser)]
#[command(
    name = "ionwf",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Install the service binary and default configuration
    Provision(commands::provision::ProvisionArgs),

    /// Register the service with systemd and start it
    Install(commands::install::InstallArgs),

    /// Stop the service and remove its systemd unit
    Uninstall(commands::uninstall::UninstallArgs),

    /// Show service state and health
    Status,

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::config::ConfigCommand),

    /// Show version
    Version,
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the command fails.
    pub async fn run(self) -> Result<()> {
        let Cli { no_color, quiet, json, command } = self;
        let ctx = crate::output::OutputContext::new(no_color, quiet);
        match command {
            Command::Version => {
                commands::version::run(json);
                Ok(())
            }
            Command::Provision(args) => commands::provision::run(&ctx, &args),
            Command::Install(args) => {
                let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
                let systemctl = Systemctl::new(runner);
                commands::install::run(&ctx, &systemctl, &YamlConfigStore, &args).await
            }
            Command::Uninstall(args) => {
                let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
                let systemctl = Systemctl::new(runner);
                commands::uninstall::run(&ctx, &systemctl, &args).await
            }
            Command::Status => {
                let runner = TokioCommandRunner::new(DEFAULT_CMD_TIMEOUT);
                let systemctl = Systemctl::new(runner);
                commands::status::run(&ctx, &systemctl, &YamlConfigStore, json).await
            }
            Command::Config(cmd) => commands::config::run(&ctx, &YamlConfigStore, cmd, json),
        }
    }
}
