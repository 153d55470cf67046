//! Port trait definitions for the Application layer.
//!
//! Ports are the interfaces (contracts) that infrastructure must fulfill.
//! This file imports only from `crate::domain`, never from `crate::infra`,
//! `crate::commands`, or `crate::output`.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::Result;

use crate::domain::DeploymentConfig;

// ── Command Runner Port ───────────────────────────────────────────────────────

/// Abstracts process execution so infrastructure can be swapped or mocked.
#[allow(async_fn_in_trait)]
pub trait CommandRunner {
    /// Run a program and capture its output.
    ///
    /// Implementations should delegate to `run_with_timeout` using the
    /// instance's configured default timeout.
    async fn run(&self, program: &str, args: &[&str]) -> Result<Output>;
    /// Run a program with a custom timeout override.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned or exceeds `timeout`.
    /// On timeout, the child process must be killed (not left orphaned).
    async fn run_with_timeout(
        &self,
        program: &str,
        args: &[&str],
        timeout: Duration,
    ) -> Result<Output>;
    /// Spawn a long-lived program without waiting for it to finish.
    ///
    /// stdin and stdout are closed, stderr is piped. The child is killed
    /// when its handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the process cannot be spawned.
    fn spawn(
        &self,
        program: &str,
        args: &[&str],
        envs: &[(&str, &str)],
    ) -> Result<tokio::process::Child>;
}

// ── Progress Reporting Port ───────────────────────────────────────────────────

/// Abstracts progress reporting so services can emit events without
/// depending on the Presentation layer. Sync trait.
pub trait ProgressReporter {
    /// Emit an in-progress step message.
    fn step(&self, message: &str);
    /// Emit a success message.
    fn success(&self, message: &str);
    /// Emit a warning message.
    fn warn(&self, message: &str);
    /// Show an activity indicator until [`ProgressReporter::end_activity`].
    fn begin_activity(&self, message: &str);
    /// Clear the activity indicator, if any.
    fn end_activity(&self);
}

// ── Confirmation Port ─────────────────────────────────────────────────────────

/// Interactive yes/no gate in front of every destructive run.
pub trait Confirmer {
    /// Ask the user; `Ok(false)` means the run must not start.
    ///
    /// # Errors
    ///
    /// Returns an error if the prompt cannot be shown (e.g. no TTY).
    fn confirm(&self, prompt: &str) -> Result<bool>;
}

// ── Transport Port ────────────────────────────────────────────────────────────

/// One remote connection, owned by a single pipeline run.
///
/// Starts disconnected. `upload` and `exec` require a prior `connect`.
#[allow(async_fn_in_trait)]
pub trait TransportSession {
    /// Authenticate and open the connection described by `config`.
    async fn connect(&mut self, config: &DeploymentConfig) -> Result<()>;
    /// Copy `local` to the remote path `remote`.
    ///
    /// Takes `&self` so several uploads can be in flight at once.
    async fn upload(&self, local: &Path, remote: &str) -> Result<()>;
    /// Run a shell command on the remote host; non-zero exit is an error.
    async fn exec(&self, command: &str) -> Result<()>;
    /// Release the connection. Idempotent.
    async fn disconnect(&mut self) -> Result<()>;
    /// Whether `connect` succeeded and `disconnect` has not run since.
    fn is_connected(&self) -> bool;
}

// ── Local Build Ports ─────────────────────────────────────────────────────────

/// Local build and packaging.
#[allow(async_fn_in_trait)]
pub trait Packager {
    /// Run the build command in the working directory; succeeds on exit 0.
    async fn run_build(&self, script: &str) -> Result<()>;
    /// Compress `dist_path` into `<dist_path>.zip` and return the archive path.
    ///
    /// The archive is fully written and closed when this returns.
    async fn archive(&self, dist_path: &str) -> Result<PathBuf>;
}

/// Removal of local build output after a successful install.
#[allow(async_fn_in_trait)]
pub trait LocalArtifacts {
    /// Delete the `dist_path` tree, then `<dist_path>.zip`.
    async fn remove_artifacts(&self, dist_path: &str) -> Result<()>;
}
