//! Local build and packaging — implements the `Packager` port.

use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::{AsyncRead, AsyncReadExt};
use zip::CompressionMethod;
use zip::write::{SimpleFileOptions, ZipWriter};

use crate::application::ports::Packager;

/// Cap on captured build output (stdout + stderr combined).
pub const MAX_BUILD_OUTPUT: usize = 5000 * 1024;

/// Lines of build output quoted in a failure message.
const FAILURE_TAIL_LINES: usize = 20;

/// The directory a deployment is run from.
///
/// Build commands run here, and `distPath` and `<distPath>.zip` resolve
/// against it.
pub struct LocalWorkspace {
    workdir: PathBuf,
    output_limit: usize,
}

impl LocalWorkspace {
    #[must_use]
    pub fn new(workdir: PathBuf) -> Self {
        Self {
            workdir,
            output_limit: MAX_BUILD_OUTPUT,
        }
    }

    /// Override the build output cap.
    #[must_use]
    pub fn with_output_limit(mut self, limit: usize) -> Self {
        self.output_limit = limit;
        self
    }

    #[must_use]
    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    pub(crate) fn archive_path(&self, dist_path: &str) -> PathBuf {
        self.workdir.join(format!("{dist_path}.zip"))
    }
}

impl Packager for LocalWorkspace {
    async fn run_build(&self, script: &str) -> Result<()> {
        tracing::info!(script, workdir = %self.workdir.display(), "running build");
        let mut child = shell(script)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .with_context(|| format!("failed to spawn `{script}`"))?;

        let mut stdout = child.stdout.take();
        let mut stderr = child.stderr.take();
        let mut captured = Vec::new();
        let mut out_buf = [0u8; 8192];
        let mut err_buf = [0u8; 8192];

        while stdout.is_some() || stderr.is_some() {
            let (read, from_stdout) = tokio::select! {
                r = read_some(&mut stdout, &mut out_buf) => (r, true),
                r = read_some(&mut stderr, &mut err_buf) => (r, false),
            };
            let n = read.context("reading build output")?;
            if n == 0 {
                if from_stdout {
                    stdout = None;
                } else {
                    stderr = None;
                }
                continue;
            }
            if captured.len() + n > self.output_limit {
                let _ = child.kill().await;
                anyhow::bail!("build output exceeded {} bytes", self.output_limit);
            }
            let chunk = if from_stdout { &out_buf[..n] } else { &err_buf[..n] };
            captured.extend_from_slice(chunk);
        }

        let status = child.wait().await.context("waiting for build")?;
        tracing::debug!(%status, bytes = captured.len(), "build exited");
        if !status.success() {
            anyhow::bail!("{status}{}", tail(&captured));
        }
        Ok(())
    }

    async fn archive(&self, dist_path: &str) -> Result<PathBuf> {
        let source = self.workdir.join(dist_path);
        let target = self.archive_path(dist_path);
        tokio::task::spawn_blocking(move || {
            write_zip(&source, &target)?;
            Ok::<PathBuf, anyhow::Error>(target)
        })
        .await
        .context("spawn_blocking for archive")?
    }
}

#[cfg(unix)]
fn shell(script: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("sh");
    cmd.arg("-c").arg(script);
    cmd
}

#[cfg(windows)]
fn shell(script: &str) -> tokio::process::Command {
    let mut cmd = tokio::process::Command::new("cmd");
    cmd.arg("/C").arg(script);
    cmd
}

/// Read from `stream`; never resolves once the stream is closed.
async fn read_some<R: AsyncRead + Unpin>(
    stream: &mut Option<R>,
    buf: &mut [u8],
) -> io::Result<usize> {
    match stream {
        Some(s) => s.read(buf).await,
        None => std::future::pending().await,
    }
}

fn tail(output: &[u8]) -> String {
    let text = String::from_utf8_lossy(output);
    let lines: Vec<&str> = text.lines().collect();
    if lines.is_empty() {
        return String::new();
    }
    let start = lines.len().saturating_sub(FAILURE_TAIL_LINES);
    format!("\n{}", lines[start..].join("\n"))
}

/// Zip the contents of `source` into `target` at maximum compression.
///
/// Entry names are relative to `source`; the directory's own name is not
/// part of them. The file is flushed to disk before returning.
///
/// # Errors
///
/// Returns an error if `source` is not a directory or any read/write fails.
pub fn write_zip(source: &Path, target: &Path) -> Result<()> {
    anyhow::ensure!(
        source.is_dir(),
        "{} is not a directory",
        source.display()
    );
    let file =
        File::create(target).with_context(|| format!("creating {}", target.display()))?;
    let mut zip = ZipWriter::new(file);
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(9));

    let mut pending = vec![PathBuf::new()];
    while let Some(relative) = pending.pop() {
        let dir = source.join(&relative);
        let mut entries = std::fs::read_dir(&dir)
            .with_context(|| format!("reading {}", dir.display()))?
            .collect::<io::Result<Vec<_>>>()
            .with_context(|| format!("reading {}", dir.display()))?;
        entries.sort_by_key(std::fs::DirEntry::file_name);

        for entry in entries {
            let path = relative.join(entry.file_name());
            let name = entry_name(&path);
            if entry.file_type()?.is_dir() {
                zip.add_directory(format!("{name}/"), options)?;
                pending.push(path);
            } else {
                zip.start_file(name, options)?;
                let mut input = File::open(entry.path())
                    .with_context(|| format!("opening {}", entry.path().display()))?;
                io::copy(&mut input, &mut zip)
                    .with_context(|| format!("compressing {}", entry.path().display()))?;
            }
        }
    }

    let file = zip.finish().context("finishing archive")?;
    file.sync_all()
        .with_context(|| format!("flushing {}", target.display()))?;
    Ok(())
}

fn entry_name(relative: &Path) -> String {
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
