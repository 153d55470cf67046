//! Typed domain error enums.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All error types implement `thiserror::Error` and convert to `anyhow::Error`
//! via the `?` operator.

use std::fmt;

use thiserror::Error;

// ── Config errors ─────────────────────────────────────────────────────────────

/// Errors raised while resolving and validating an environment configuration.
///
/// Every variant is fatal and is raised before any build, network, or
/// filesystem side effect.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("Config file not found: {path}\n\nCreate one with: deploy-cli init")]
    NotFound { path: String },

    #[error("Environment '{0}' is not defined in the config file.")]
    UnknownEnvironment(String),

    #[error("Config error: environment '{env}' needs either 'privateKey' or 'password'.")]
    MissingCredential { env: String },

    #[error("Config error: '{key}' of environment '{env}' is missing or still a placeholder.")]
    InvalidField { key: String, env: String },
}

// ── Deploy errors ─────────────────────────────────────────────────────────────

/// One destination that did not receive the archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadFailure {
    /// Remote archive path, e.g. `/srv/app.zip`.
    pub target: String,
    /// Underlying cause, rendered with its context chain.
    pub reason: String,
}

impl fmt::Display for UploadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.target, self.reason)
    }
}

/// A fatal failure inside one pipeline step.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeployError {
    #[error("Build command `{script}` failed: {reason}")]
    Build { script: String, reason: String },

    #[error("Packaging {path} failed: {reason}")]
    Packaging { path: String, reason: String },

    #[error("SSH connection to {host} failed: {reason}")]
    Connection { host: String, reason: String },

    #[error("Upload failed for {}", join_failures(.failures))]
    Upload { failures: Vec<UploadFailure> },

    #[error("Remote command `{command}` failed: {reason}")]
    RemoteExec { command: String, reason: String },

    #[error("Removing local artifacts failed: {reason}")]
    LocalCleanup { reason: String },
}

fn join_failures(failures: &[UploadFailure]) -> String {
    failures
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Failure category of a [`DeployError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Build,
    Packaging,
    Connection,
    Upload,
    RemoteExec,
    LocalCleanup,
}

impl DeployError {
    /// Category of this error.
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Build { .. } => FailureKind::Build,
            Self::Packaging { .. } => FailureKind::Packaging,
            Self::Connection { .. } => FailureKind::Connection,
            Self::Upload { .. } => FailureKind::Upload,
            Self::RemoteExec { .. } => FailureKind::RemoteExec,
            Self::LocalCleanup { .. } => FailureKind::LocalCleanup,
        }
    }
}
