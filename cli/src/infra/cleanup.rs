//! Local artifact removal — implements the `LocalArtifacts` port.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::application::ports::LocalArtifacts;
use crate::infra::packager::LocalWorkspace;

impl LocalArtifacts for LocalWorkspace {
    async fn remove_artifacts(&self, dist_path: &str) -> Result<()> {
        let tree = self.workdir().join(dist_path);
        let archive = self.archive_path(dist_path);
        tokio::task::spawn_blocking(move || {
            remove_tree(&tree).with_context(|| format!("removing {}", tree.display()))?;
            fs::remove_file(&archive)
                .with_context(|| format!("removing {}", archive.display()))?;
            Ok::<(), anyhow::Error>(())
        })
        .await
        .context("spawn_blocking for remove_artifacts")?
    }
}

/// Delete `root` depth-first: a directory's files go before the directory,
/// and subdirectories before their parent. Missing `root` is not an error.
///
/// Symlinks are removed, never followed.
///
/// # Errors
///
/// Returns the first I/O error; entries already removed stay removed.
pub fn remove_tree(root: &Path) -> io::Result<()> {
    match fs::symlink_metadata(root) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
        Ok(meta) if !meta.is_dir() => return fs::remove_file(root),
        Ok(_) => {}
    }

    // (dir, children_done)
    let mut stack: Vec<(PathBuf, bool)> = vec![(root.to_path_buf(), false)];
    while let Some((dir, children_done)) = stack.pop() {
        if children_done {
            fs::remove_dir(&dir)?;
            continue;
        }
        stack.push((dir.clone(), true));
        for entry in fs::read_dir(&dir)? {
            let entry = entry?;
            if entry.file_type()?.is_dir() {
                stack.push((entry.path(), false));
            } else {
                fs::remove_file(entry.path())?;
            }
        }
    }
    Ok(())
}
