//! Domain layer — pure business logic, types, and validation.
//!
//! This module has zero imports from `crate::infra`, `crate::commands`,
//! `crate::application`, `tokio`, `std::fs`, `std::process`, or `std::net`.
//! All functions are synchronous and take data in, returning data out.

pub mod config;
pub mod error;
pub mod pipeline;

pub use config::{Credential, DeployFile, DeploymentConfig, RawEnvConfig, WebDir, validate};
pub use error::{ConfigError, DeployError, FailureKind, UploadFailure};
pub use pipeline::{PipelineOutcome, Step, task_list};
