//! Shared fakes for the application ports.
//!
//! Each fake records what it was asked to do so tests can assert on the
//! exact sequence of side effects.

#![allow(clippy::expect_used, dead_code)]

use std::path::Path;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anyhow::Result;
use deploy_cli::application::ports::{
    Confirmer, LocalArtifacts, ProgressReporter, TransportSession,
};
use deploy_cli::domain::{DeployFile, DeploymentConfig};

// ── Config fixtures ───────────────────────────────────────────────────────────

/// One environment `prod` deploying `dist` to `/srv/app`.
pub const SINGLE_TARGET: &str = r"
projectName: shop
prod:
  name: production
  script: echo build
  host: 203.0.113.7
  port: 22
  username: deploy
  privateKey: ~/.ssh/id_ed25519
  distPath: dist
  webDir: /srv/app
";

pub fn deploy_file(yaml: &str) -> DeployFile {
    serde_yaml::from_str(yaml).expect("fixture parses")
}

/// `SINGLE_TARGET` with the build script replaced.
pub fn with_script(script: &str) -> DeployFile {
    let mut file = deploy_file(SINGLE_TARGET);
    file.environments
        .get_mut("prod")
        .expect("prod")
        .script = Some(script.to_string());
    file
}

// ── Confirmer ─────────────────────────────────────────────────────────────────

/// Answers every prompt with a fixed value and keeps the prompts.
pub struct FixedAnswer {
    answer: bool,
    pub prompts: Mutex<Vec<String>>,
}

impl FixedAnswer {
    pub fn yes() -> Self {
        Self {
            answer: true,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn no() -> Self {
        Self {
            answer: false,
            prompts: Mutex::new(Vec::new()),
        }
    }
}

impl Confirmer for FixedAnswer {
    fn confirm(&self, prompt: &str) -> Result<bool> {
        self.prompts
            .lock()
            .expect("lock")
            .push(prompt.to_string());
        Ok(self.answer)
    }
}

// ── Reporter ──────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingReporter {
    pub lines: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().expect("lock").clone()
    }

    fn push(&self, line: String) {
        self.lines.lock().expect("lock").push(line);
    }
}

impl ProgressReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.push(format!("step: {message}"));
    }
    fn success(&self, message: &str) {
        self.push(format!("ok: {message}"));
    }
    fn warn(&self, message: &str) {
        self.push(format!("warn: {message}"));
    }
    fn begin_activity(&self, _: &str) {}
    fn end_activity(&self) {}
}

// ── Transport ─────────────────────────────────────────────────────────────────

/// In-memory `TransportSession`.
///
/// Events are recorded as `connect <host>`, `upload <file> -> <remote>`,
/// `exec <command>` and `disconnect`. Uploaded bytes are kept per remote
/// path.
#[derive(Default)]
pub struct FakeSession {
    events: Mutex<Vec<String>>,
    received: Mutex<Vec<(String, Vec<u8>)>>,
    connected: bool,
    refuse_connect: bool,
    failing_uploads: Vec<String>,
    failing_commands: Vec<String>,
    upload_delay: Duration,
    in_flight: AtomicUsize,
    peak: AtomicUsize,
}

impl FakeSession {
    /// A session whose `connect` fails.
    pub fn refusing_connect() -> Self {
        Self {
            refuse_connect: true,
            ..Self::default()
        }
    }

    /// Uploads to these remote archive paths fail.
    pub fn with_failing_uploads<I, S>(mut self, remotes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_uploads = remotes.into_iter().map(Into::into).collect();
        self
    }

    /// These remote commands exit non-zero.
    pub fn with_failing_commands<I, S>(mut self, commands: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.failing_commands = commands.into_iter().map(Into::into).collect();
        self
    }

    /// Each upload takes `delay`.
    pub fn with_upload_delay(mut self, delay: Duration) -> Self {
        self.upload_delay = delay;
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().expect("lock").clone()
    }

    pub fn uploads(&self) -> Vec<String> {
        let mut uploads: Vec<String> = self
            .events()
            .into_iter()
            .filter(|e| e.starts_with("upload "))
            .collect();
        uploads.sort();
        uploads
    }

    /// Bytes received per remote path, sorted by path.
    pub fn received(&self) -> Vec<(String, Vec<u8>)> {
        let mut received = self.received.lock().expect("lock").clone();
        received.sort_by(|a, b| a.0.cmp(&b.0));
        received
    }

    pub fn commands(&self) -> Vec<String> {
        self.events()
            .into_iter()
            .filter_map(|e| e.strip_prefix("exec ").map(str::to_string))
            .collect()
    }

    /// Highest number of uploads that were in flight at the same time.
    pub fn peak_uploads(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn record(&self, event: String) {
        self.events.lock().expect("lock").push(event);
    }
}

impl TransportSession for FakeSession {
    async fn connect(&mut self, config: &DeploymentConfig) -> Result<()> {
        self.record(format!("connect {}", config.host));
        if self.refuse_connect {
            anyhow::bail!("Connection refused");
        }
        self.connected = true;
        Ok(())
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        anyhow::ensure!(self.connected, "upload before connect");
        anyhow::ensure!(local.is_file(), "{} does not exist", local.display());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        if !self.upload_delay.is_zero() {
            tokio::time::sleep(self.upload_delay).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        let file = local
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        self.record(format!("upload {file} -> {remote}"));
        if self.failing_uploads.iter().any(|t| t == remote) {
            anyhow::bail!("scp: {remote}: Permission denied");
        }
        let bytes = std::fs::read(local)?;
        self.received
            .lock()
            .expect("lock")
            .push((remote.to_string(), bytes));
        Ok(())
    }

    async fn exec(&self, command: &str) -> Result<()> {
        anyhow::ensure!(self.connected, "exec before connect");
        self.record(format!("exec {command}"));
        if self.failing_commands.iter().any(|c| c == command) {
            anyhow::bail!("exit status: 1");
        }
        Ok(())
    }

    async fn disconnect(&mut self) -> Result<()> {
        if self.connected {
            self.record("disconnect".to_string());
            self.connected = false;
        }
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── Local artifacts ───────────────────────────────────────────────────────────

/// `LocalArtifacts` whose removal always fails, leaving the files in place.
pub struct StuckArtifacts;

impl LocalArtifacts for StuckArtifacts {
    async fn remove_artifacts(&self, dist_path: &str) -> Result<()> {
        anyhow::bail!("cannot remove {dist_path}: Permission denied")
    }
}
