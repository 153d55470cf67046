//! OpenSSH-backed `TransportSession`.
//!
//! `connect` starts an `ssh -M` control master on a private socket; uploads
//! (`scp`) and remote commands (`ssh`) are multiplexed over it, so the host
//! authenticates once per run. The master is spawned kill-on-drop, so the
//! connection dies with the session even if `disconnect` never runs.
//!
//! Password and key-passphrase authentication go through `sshpass`, which
//! must be installed when either is configured. Control sockets require a
//! Unix-like local host.

use std::path::{Path, PathBuf};
use std::process::Output;
use std::time::Duration;

use anyhow::{Context, Result};
use tempfile::TempDir;
use tokio::io::AsyncReadExt;
use tokio::process::Child;
use tokio::time::Instant;

use crate::application::ports::{CommandRunner, TransportSession};
use crate::domain::{Credential, DeploymentConfig};

const CONTROL_SOCKET: &str = "ssh.sock";
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Time limits for remote operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransportTimeouts {
    /// Bound on session establishment, including authentication.
    pub connect: Duration,
    /// Bound on each upload and each remote command.
    pub command: Duration,
}

impl Default for TransportTimeouts {
    fn default() -> Self {
        Self {
            connect: Duration::from_secs(30),
            command: Duration::from_secs(600),
        }
    }
}

/// A program, its arguments, and extra environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
}

/// Build the control-master invocation for `config`.
#[must_use]
pub fn master_invocation(
    config: &DeploymentConfig,
    control_path: &Path,
    connect_timeout: Duration,
) -> Invocation {
    let control = control_path.display().to_string();
    let timeout = format!("ConnectTimeout={}", connect_timeout.as_secs().max(1));
    let port = config.port.to_string();
    let mut ssh: Vec<String> = [
        "-M",
        "-N",
        "-S",
        control.as_str(),
        "-o",
        "ControlPersist=no",
        "-o",
        "StrictHostKeyChecking=accept-new",
        "-o",
        timeout.as_str(),
        "-o",
        "ServerAliveInterval=15",
        "-p",
        port.as_str(),
    ]
    .iter()
    .map(ToString::to_string)
    .collect();

    let (secret, prompt) = match &config.credential {
        Credential::PrivateKey { path, passphrase } => {
            let key = expand_home(path);
            ssh.extend(["-i", key.as_str(), "-o", "IdentitiesOnly=yes"].map(String::from));
            (passphrase.clone(), Some("passphrase"))
        }
        Credential::Password(password) => {
            ssh.extend(
                [
                    "-o",
                    "PubkeyAuthentication=no",
                    "-o",
                    "PreferredAuthentications=password,keyboard-interactive",
                ]
                .map(String::from),
            );
            (Some(password.clone()), None)
        }
    };
    ssh.push(destination(config));

    match secret {
        Some(secret) => {
            let mut args = Vec::new();
            if let Some(prompt) = prompt {
                args.extend(["-P".to_string(), prompt.to_string()]);
            }
            args.extend(["-e".to_string(), "ssh".to_string()]);
            args.extend(ssh);
            Invocation {
                program: "sshpass".to_string(),
                args,
                envs: vec![("SSHPASS".to_string(), secret)],
            }
        }
        None => {
            ssh.splice(0..0, ["-o".to_string(), "BatchMode=yes".to_string()]);
            Invocation {
                program: "ssh".to_string(),
                args: ssh,
                envs: Vec::new(),
            }
        }
    }
}

/// `user@host` for `config`.
#[must_use]
pub fn destination(config: &DeploymentConfig) -> String {
    format!("{}@{}", config.username, config.host)
}

/// Expand a leading `~/` to the home directory.
#[must_use]
pub fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/")
        && let Some(home) = dirs::home_dir()
    {
        return home.join(rest).display().to_string();
    }
    path.to_string()
}

/// `ssh -O <operation>` arguments against a running control master.
fn control_args(control_path: &Path, destination: &str, operation: &str) -> Vec<String> {
    vec![
        "-S".to_string(),
        control_path.display().to_string(),
        "-O".to_string(),
        operation.to_string(),
        destination.to_string(),
    ]
}

struct Connection {
    destination: String,
    port: String,
    control_dir: TempDir,
    master: Child,
}

impl Connection {
    fn control_path(&self) -> PathBuf {
        self.control_dir.path().join(CONTROL_SOCKET)
    }

    fn control_args(&self, operation: &str) -> Vec<String> {
        control_args(&self.control_path(), &self.destination, operation)
    }

    fn exec_args(&self, command: &str) -> Vec<String> {
        vec![
            "-S".to_string(),
            self.control_path().display().to_string(),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-p".to_string(),
            self.port.clone(),
            self.destination.clone(),
            command.to_string(),
        ]
    }

    fn scp_args(&self, local: &Path, remote: &str) -> Vec<String> {
        vec![
            "-q".to_string(),
            "-o".to_string(),
            format!("ControlPath={}", self.control_path().display()),
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-P".to_string(),
            self.port.clone(),
            local.display().to_string(),
            format!("{}:{remote}", self.destination),
        ]
    }
}

/// Production `TransportSession` built on the OpenSSH client binaries.
pub struct OpenSshSession<R: CommandRunner> {
    runner: R,
    timeouts: TransportTimeouts,
    connection: Option<Connection>,
}

impl<R: CommandRunner> OpenSshSession<R> {
    /// A disconnected session. Nothing is spawned until `connect`.
    #[must_use]
    pub fn new(runner: R, timeouts: TransportTimeouts) -> Self {
        Self {
            runner,
            timeouts,
            connection: None,
        }
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| anyhow::anyhow!("SSH session is not connected"))
    }

    async fn wait_for_master(
        &self,
        master: &mut Child,
        control_path: &Path,
        check_args: &[&str],
    ) -> Result<()> {
        let deadline = Instant::now() + self.timeouts.connect;
        loop {
            if let Some(status) = master.try_wait().context("polling ssh master")? {
                let stderr = read_stderr(master).await;
                anyhow::bail!("ssh exited with {status}: {}", stderr.trim());
            }
            if control_path.exists() {
                let out = self.runner.run("ssh", check_args).await?;
                if out.status.success() {
                    return Ok(());
                }
            }
            if Instant::now() >= deadline {
                let _ = master.kill().await;
                anyhow::bail!(
                    "timed out after {}s waiting for the SSH session",
                    self.timeouts.connect.as_secs()
                );
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }
}

impl<R: CommandRunner> TransportSession for OpenSshSession<R> {
    async fn connect(&mut self, config: &DeploymentConfig) -> Result<()> {
        if self.connection.is_some() {
            return Ok(());
        }
        let control_dir = tempfile::Builder::new()
            .prefix("deploy-cli-")
            .tempdir()
            .context("creating control socket directory")?;
        let control_path = control_dir.path().join(CONTROL_SOCKET);

        let invocation = master_invocation(config, &control_path, self.timeouts.connect);
        let args = as_strs(&invocation.args);
        let envs: Vec<(&str, &str)> = invocation
            .envs
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let mut master = self.runner.spawn(&invocation.program, &args, &envs)?;

        let destination = destination(config);
        let check_args = control_args(&control_path, &destination, "check");
        self.wait_for_master(&mut master, &control_path, &as_strs(&check_args))
            .await?;

        tracing::info!(%destination, "SSH session established");
        self.connection = Some(Connection {
            destination,
            port: config.port.to_string(),
            control_dir,
            master,
        });
        Ok(())
    }

    async fn upload(&self, local: &Path, remote: &str) -> Result<()> {
        let conn = self.connection()?;
        let args = conn.scp_args(local, remote);
        let out = self
            .runner
            .run_with_timeout("scp", &as_strs(&args), self.timeouts.command)
            .await?;
        ensure_success(&out, &format!("scp to {remote}"))
    }

    async fn exec(&self, command: &str) -> Result<()> {
        let conn = self.connection()?;
        let args = conn.exec_args(command);
        tracing::debug!(command, "remote exec");
        let out = self
            .runner
            .run_with_timeout("ssh", &as_strs(&args), self.timeouts.command)
            .await?;
        ensure_success(&out, command)
    }

    async fn disconnect(&mut self) -> Result<()> {
        let Some(mut conn) = self.connection.take() else {
            return Ok(());
        };
        let result = self.runner.run("ssh", &as_strs(&conn.control_args("exit"))).await;
        // The master normally exits on `-O exit`; kill covers the rest.
        let _ = conn.master.kill().await;
        tracing::info!(destination = %conn.destination, "SSH session closed");
        ensure_success(&result?, "ssh -O exit")
    }

    fn is_connected(&self) -> bool {
        self.connection.is_some()
    }
}

fn as_strs(args: &[String]) -> Vec<&str> {
    args.iter().map(String::as_str).collect()
}

fn ensure_success(out: &Output, what: &str) -> Result<()> {
    if out.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&out.stderr);
    anyhow::bail!("{what} exited with {}: {}", out.status, stderr.trim())
}

async fn read_stderr(child: &mut Child) -> String {
    let mut buf = String::new();
    if let Some(mut stderr) = child.stderr.take() {
        let _ = stderr.read_to_string(&mut buf).await;
    }
    buf
}
