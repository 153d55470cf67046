//! Deployment steps, their order, and the remote commands they issue.
//!
//! Pure functions only; the I/O behind each step lives behind the
//! application ports.

use std::fmt;

use crate::domain::config::DeploymentConfig;
use crate::domain::error::{DeployError, FailureKind};

/// Upper bound on simultaneous archive transfers during fan-out.
pub const MAX_CONCURRENT_UPLOADS: usize = 10;

/// One unit of deployment work.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// Run the configured build command locally.
    Build,
    /// Compress `distPath` into `<distPath>.zip`.
    Archive,
    /// Open the transport session.
    Connect,
    /// Copy the archive to every remote target.
    Upload,
    /// Delete leftover remote directories.
    RemoveStaleRemote,
    /// Expand each remote archive in place, then delete it.
    UnzipRemote,
    /// Delete the local build output and archive.
    RemoveLocal,
    /// Close the transport session.
    Disconnect,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Build => "build",
            Self::Archive => "archive",
            Self::Connect => "connect",
            Self::Upload => "upload",
            Self::RemoveStaleRemote => "remove-stale-remote",
            Self::UnzipRemote => "unzip-remote",
            Self::RemoveLocal => "remove-local",
            Self::Disconnect => "disconnect",
        };
        f.write_str(label)
    }
}

/// Build the ordered step list for one run.
///
/// `RemoveStaleRemote` is present only when the config enables it.
#[must_use]
pub fn task_list(config: &DeploymentConfig) -> Vec<Step> {
    let mut steps = vec![Step::Build, Step::Archive, Step::Connect, Step::Upload];
    if config.remove_remote_files {
        steps.push(Step::RemoveStaleRemote);
    }
    steps.extend([Step::UnzipRemote, Step::RemoveLocal, Step::Disconnect]);
    steps
}

/// Terminal state of a run. Exactly one per run.
#[derive(Debug)]
pub enum PipelineOutcome {
    Succeeded,
    /// The user declined the confirmation prompt; nothing ran.
    Cancelled,
    /// `step` is the 1-based position of the step that failed.
    Failed { step: usize, error: DeployError },
}

impl PipelineOutcome {
    /// Process exit code for this outcome.
    #[must_use]
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Succeeded => 0,
            Self::Cancelled | Self::Failed { .. } => 1,
        }
    }

    /// Failure kind and step index, if the run failed.
    #[must_use]
    pub fn failure(&self) -> Option<(FailureKind, usize)> {
        match self {
            Self::Failed { step, error } => Some((error.kind(), *step)),
            _ => None,
        }
    }
}

// ── Remote commands ──────────────────────────────────────────────────────────

/// Remote archive path for a target directory.
#[must_use]
pub fn remote_archive(dir: &str) -> String {
    format!("{dir}.zip")
}

/// Recursive delete in the remote host's shell dialect.
#[must_use]
pub fn remove_command(path: &str, is_windows: bool) -> String {
    if is_windows {
        format!("DEL /Q /S /F {path}")
    } else {
        format!("rm -rf {path}")
    }
}

/// Expand `<dir>.zip` into `dir`, overwriting existing files.
#[must_use]
pub fn unzip_command(dir: &str) -> String {
    format!("unzip -o {} -d {dir}", remote_archive(dir))
}
