//! CLI argument parsing with clap derive

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand};

use crate::app::{AppContext, AppFlags, OutputFlags};
use crate::commands;
use crate::infra::ssh::TransportTimeouts;

/// Build, package and ship a project to a remote host over SSH
#[derive(Parser)]
#[command(
    name = "deploy-cli",
    version,
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    /// Config file [default: ./deploy.config.yaml]
    #[arg(long, global = true, env = "DEPLOY_CONFIG", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress non-error output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Disable colored output
    #[arg(
        long,
        global = true,
        env = "NO_COLOR",
        value_parser = clap::builder::FalseyValueParser::new()
    )]
    pub no_color: bool,

    /// Seconds allowed for establishing the SSH session
    #[arg(
        long,
        global = true,
        env = "DEPLOY_CONNECT_TIMEOUT",
        default_value_t = 30,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub connect_timeout: u64,

    /// Seconds allowed for each upload and each remote command
    #[arg(
        long,
        global = true,
        env = "DEPLOY_COMMAND_TIMEOUT",
        default_value_t = 600,
        value_name = "SECS",
        value_parser = clap::value_parser!(u64).range(1..)
    )]
    pub command_timeout: u64,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Build and deploy an environment from the config file
    Deploy(commands::deploy::DeployArgs),

    /// Write a starter config file
    Init(commands::init::InitArgs),
}

impl Cli {
    /// Execute the CLI command.
    ///
    /// # Errors
    ///
    /// Returns an error if the config cannot be loaded or validated, or the
    /// command itself fails before producing an outcome.
    pub async fn run(self) -> Result<ExitCode> {
        let Cli {
            config,
            quiet,
            no_color,
            connect_timeout,
            command_timeout,
            command,
        } = self;
        let ctx = AppContext::new(AppFlags {
            output: OutputFlags { no_color, quiet },
            config,
            timeouts: TransportTimeouts {
                connect: Duration::from_secs(connect_timeout),
                command: Duration::from_secs(command_timeout),
            },
        })?;

        match command {
            Command::Deploy(args) => commands::deploy::run(&ctx, &args).await,
            Command::Init(args) => commands::init::run(&ctx, &args),
        }
    }
}
