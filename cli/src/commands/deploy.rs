//! `deploy-cli deploy <ENV>` — build and ship one environment.

use std::process::ExitCode;

use anyhow::Result;
use clap::Args;

use crate::app::AppContext;
use crate::application::services::deploy::deploy;
use crate::domain::PipelineOutcome;
use crate::infra::command_runner::TokioCommandRunner;
use crate::infra::config::YamlConfigStore;
use crate::infra::packager::LocalWorkspace;
use crate::infra::ssh::OpenSshSession;
use crate::output::TerminalReporter;

/// Arguments for the deploy command.
#[derive(Args)]
pub struct DeployArgs {
    /// Environment key in the config file (e.g. `dev`, `prod`)
    pub env: String,
}

/// Run `deploy-cli deploy <ENV>`.
///
/// # Errors
///
/// Returns an error if the config cannot be loaded or validated, or the
/// confirmation prompt fails. Step failures are printed and mapped to exit
/// code 1.
pub async fn run(ctx: &AppContext, args: &DeployArgs) -> Result<ExitCode> {
    let store = YamlConfigStore::resolve(ctx.config_path.clone(), &ctx.workdir);
    let file = store.load()?;
    tracing::debug!(config = %store.path().display(), env = %args.env, "config loaded");

    let workspace = LocalWorkspace::new(ctx.workdir.clone());
    let mut session = OpenSshSession::new(TokioCommandRunner::default(), ctx.timeouts);
    let reporter = TerminalReporter::new(&ctx.output);

    let outcome = deploy(
        &args.env,
        &file,
        ctx,
        &mut session,
        &workspace,
        &workspace,
        &reporter,
    )
    .await?;

    let out = &ctx.output;
    match &outcome {
        PipelineOutcome::Succeeded => {
            let target = file
                .resolve(&args.env)
                .map_or_else(|_| args.env.clone(), |config| config.name);
            out.header(&format!(
                "Project {} deployed to {target}",
                file.project_label(&args.env)
            ));
        }
        PipelineOutcome::Cancelled => out.warn("Deployment cancelled."),
        PipelineOutcome::Failed { step, error } => {
            out.error(&format!("({step}) {error}"));
        }
    }
    Ok(ExitCode::from(outcome.exit_code()))
}
