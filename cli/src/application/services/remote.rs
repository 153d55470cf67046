//! Application service — remote-side work over an open session.
//!
//! Upload fans out with bounded concurrency; deletes and unzips walk the
//! target list one entry at a time and stop at the first failure.

use std::path::Path;

use futures_util::stream::{self, StreamExt as _};

use crate::application::ports::TransportSession;
use crate::domain::pipeline::{remote_archive, remove_command, unzip_command};
use crate::domain::{DeployError, UploadFailure};

/// Copy `local` to `<dir>.zip` for every `dir` in `targets`.
///
/// At most `limit` transfers run at once. Every transfer is awaited before
/// returning; targets that succeeded are left in place even if others fail.
///
/// # Errors
///
/// Returns `DeployError::Upload` listing every target that failed.
pub async fn upload_all(
    session: &impl TransportSession,
    local: &Path,
    targets: &[String],
    limit: usize,
) -> Result<(), DeployError> {
    let archives = targets.iter().map(|dir| remote_archive(dir));
    let mut failures: Vec<UploadFailure> = stream::iter(archives)
        .map(|target| async move {
            session
                .upload(local, &target)
                .await
                .err()
                .map(|e| UploadFailure {
                    target,
                    reason: format!("{e:#}"),
                })
        })
        .buffer_unordered(limit.max(1))
        .filter_map(|failure| async move { failure })
        .collect()
        .await;

    if failures.is_empty() {
        return Ok(());
    }
    failures.sort_by(|a, b| a.target.cmp(&b.target));
    Err(DeployError::Upload { failures })
}

/// Delete every remote target directory, sequentially.
///
/// # Errors
///
/// Returns `DeployError::RemoteExec` for the first delete that fails.
pub async fn remove_stale(
    session: &impl TransportSession,
    targets: &[String],
    is_windows: bool,
) -> Result<(), DeployError> {
    for dir in targets {
        exec(session, &remove_command(dir, is_windows)).await?;
    }
    Ok(())
}

/// For each target: expand `<dir>.zip` into `dir`, then delete the archive.
///
/// Targets after a failing one are left untouched.
///
/// # Errors
///
/// Returns `DeployError::RemoteExec` for the first command that fails.
pub async fn unzip_and_clean(
    session: &impl TransportSession,
    targets: &[String],
    is_windows: bool,
) -> Result<(), DeployError> {
    for dir in targets {
        exec(session, &unzip_command(dir)).await?;
        exec(session, &remove_command(&remote_archive(dir), is_windows)).await?;
    }
    Ok(())
}

async fn exec(session: &impl TransportSession, command: &str) -> Result<(), DeployError> {
    session
        .exec(command)
        .await
        .map_err(|e| DeployError::RemoteExec {
            command: command.to_string(),
            reason: format!("{e:#}"),
        })
}
