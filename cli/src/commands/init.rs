//! `deploy-cli init [--force]` — write a starter config file.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::infra::config::YamlConfigStore;

/// Arguments for the init command.
#[derive(Args)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

/// Run `deploy-cli init`.
///
/// # Errors
///
/// Returns an error if the file exists and `--force` was not given, or the
/// file cannot be written.
pub fn run(ctx: &AppContext, args: &InitArgs) -> Result<ExitCode> {
    let store = YamlConfigStore::resolve(ctx.config_path.clone(), &ctx.workdir);
    store.write_template(args.force)?;
    ctx.output
        .success(&format!("Wrote {}", store.path().display()));
    ctx.output.step("Replace every '/' placeholder before deploying.");
    Ok(ExitCode::SUCCESS)
}
