//! Application service — deploy use-case.
//!
//! Imports only from `crate::domain` and `crate::application`.
//! All I/O is routed through injected port traits.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::{
    Confirmer, LocalArtifacts, Packager, ProgressReporter, TransportSession,
};
use crate::application::services::pipeline::{StepExecutor, run_steps};
use crate::application::services::remote;
use crate::domain::pipeline::MAX_CONCURRENT_UPLOADS;
use crate::domain::{DeployError, DeployFile, DeploymentConfig, PipelineOutcome, Step, task_list};

/// Deploy environment `env` of `file`.
///
/// Validates the environment, asks for confirmation, then runs the step
/// list. Nothing touches the filesystem or network before the user agrees.
///
/// # Errors
///
/// Returns a [`crate::domain::ConfigError`] (wrapped in `anyhow`) when the
/// environment is unknown or invalid, or an error if the prompt fails.
/// Step failures are not errors here; they are reported as
/// [`PipelineOutcome::Failed`].
pub async fn deploy(
    env: &str,
    file: &DeployFile,
    confirmer: &impl Confirmer,
    session: &mut impl TransportSession,
    packager: &impl Packager,
    local: &impl LocalArtifacts,
    reporter: &impl ProgressReporter,
) -> Result<PipelineOutcome> {
    let config = file.resolve(env)?;

    let prompt = format!(
        "Deploy project {} to {}?",
        file.project_label(env),
        config.name
    );
    if !confirmer.confirm(&prompt)? {
        tracing::info!(env, "deployment declined");
        return Ok(PipelineOutcome::Cancelled);
    }

    let steps = task_list(&config);
    let mut executor = DeployExecutor::new(&config, session, packager, local, reporter);
    Ok(run_steps(&steps, &mut executor).await)
}

/// Real [`StepExecutor`]: maps each step onto the ports.
pub struct DeployExecutor<'a, S, P, L, R> {
    config: &'a DeploymentConfig,
    session: &'a mut S,
    packager: &'a P,
    local: &'a L,
    reporter: &'a R,
    archive: Option<PathBuf>,
}

impl<'a, S, P, L, R> DeployExecutor<'a, S, P, L, R>
where
    S: TransportSession,
    P: Packager,
    L: LocalArtifacts,
    R: ProgressReporter,
{
    pub fn new(
        config: &'a DeploymentConfig,
        session: &'a mut S,
        packager: &'a P,
        local: &'a L,
        reporter: &'a R,
    ) -> Self {
        Self {
            config,
            session,
            packager,
            local,
            reporter,
            archive: None,
        }
    }

    async fn build(&self) -> Result<(), DeployError> {
        let script = &self.config.build_script;
        self.reporter.begin_activity("building...");
        let result = self.packager.run_build(script).await;
        self.reporter.end_activity();
        result.map_err(|e| DeployError::Build {
            script: script.clone(),
            reason: format!("{e:#}"),
        })?;
        self.reporter.success("build finished");
        Ok(())
    }

    async fn archive(&mut self) -> Result<(), DeployError> {
        let path = self
            .packager
            .archive(&self.config.dist_path)
            .await
            .map_err(|e| DeployError::Packaging {
                path: self.config.archive_name(),
                reason: format!("{e:#}"),
            })?;
        self.reporter
            .success(&format!("{} created", self.config.archive_name()));
        self.archive = Some(path);
        Ok(())
    }

    async fn connect(&mut self) -> Result<(), DeployError> {
        self.session
            .connect(self.config)
            .await
            .map_err(|e| DeployError::Connection {
                host: self.config.host.clone(),
                reason: format!("{e:#}"),
            })?;
        self.reporter.success("connected");
        Ok(())
    }

    async fn upload(&self) -> Result<(), DeployError> {
        let Some(archive) = self.archive.as_deref() else {
            return Err(DeployError::Packaging {
                path: self.config.archive_name(),
                reason: "archive step has not run".to_string(),
            });
        };
        self.reporter.begin_activity("uploading...");
        let result = remote::upload_all(
            &*self.session,
            archive,
            &self.config.web_dirs,
            MAX_CONCURRENT_UPLOADS,
        )
        .await;
        self.reporter.end_activity();
        result?;
        self.reporter.success("upload finished");
        Ok(())
    }

    async fn remove_local(&self) -> Result<(), DeployError> {
        self.local
            .remove_artifacts(&self.config.dist_path)
            .await
            .map_err(|e| DeployError::LocalCleanup {
                reason: format!("{e:#}"),
            })?;
        self.reporter.success("local build output removed");
        Ok(())
    }

    async fn disconnect(&mut self) {
        if let Err(e) = self.session.disconnect().await {
            self.reporter
                .warn(&format!("closing the SSH session failed: {e:#}"));
        }
    }

    fn announce(&self, step: Step, index: usize) {
        let config = self.config;
        let targets = config.web_dirs.join(", ");
        let message = match step {
            Step::Build => config.build_script.clone(),
            Step::Archive => format!(
                "packaging {} into {}",
                config.dist_path,
                config.archive_name()
            ),
            Step::Connect => format!(
                "connecting to {}@{}:{}",
                config.username, config.host, config.port
            ),
            Step::Upload => format!("uploading {} to {targets}", config.archive_name()),
            Step::RemoveStaleRemote => format!("removing remote {targets}"),
            Step::UnzipRemote => format!("unpacking remote archives into {targets}"),
            Step::RemoveLocal => format!(
                "removing local {} and {}",
                config.dist_path,
                config.archive_name()
            ),
            Step::Disconnect => "closing the SSH session".to_string(),
        };
        self.reporter.step(&format!("({index}) {message}"));
    }
}

impl<S, P, L, R> StepExecutor for DeployExecutor<'_, S, P, L, R>
where
    S: TransportSession,
    P: Packager,
    L: LocalArtifacts,
    R: ProgressReporter,
{
    async fn execute(&mut self, step: Step, index: usize) -> Result<(), DeployError> {
        self.announce(step, index);
        let config = self.config;
        match step {
            Step::Build => self.build().await,
            Step::Archive => self.archive().await,
            Step::Connect => self.connect().await,
            Step::Upload => self.upload().await,
            Step::RemoveStaleRemote => {
                remote::remove_stale(&*self.session, &config.web_dirs, config.is_windows).await?;
                self.reporter.success("remote directories removed");
                Ok(())
            }
            Step::UnzipRemote => {
                remote::unzip_and_clean(&*self.session, &config.web_dirs, config.is_windows)
                    .await?;
                self.reporter.success("remote archives unpacked");
                Ok(())
            }
            Step::RemoveLocal => self.remove_local().await,
            Step::Disconnect => {
                self.disconnect().await;
                Ok(())
            }
        }
    }

    async fn release(&mut self) {
        self.reporter.end_activity();
        if self.session.is_connected() {
            tracing::info!(host = %self.config.host, "releasing SSH session after aborted run");
            self.disconnect().await;
        }
    }
}
