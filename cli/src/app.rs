//! Application context — unified state passed to every command handler.
//!
//! Built once in `Cli::run()` from the global flags. Adding a new
//! cross-cutting concern requires only one field change here.

use std::path::PathBuf;

use anyhow::Result;

use crate::application::ports::Confirmer;
use crate::infra::ssh::TransportTimeouts;
use crate::output::OutputContext;

/// Output rendering flags.
pub struct OutputFlags {
    /// Disable ANSI color output.
    pub no_color: bool,
    /// Suppress non-error output.
    pub quiet: bool,
}

/// Flags passed from the top-level CLI to `AppContext::new`.
pub struct AppFlags {
    /// Output rendering options.
    pub output: OutputFlags,
    /// Explicit config file; `None` means `deploy.config.yaml` in the working directory.
    pub config: Option<PathBuf>,
    /// Limits for the SSH transport.
    pub timeouts: TransportTimeouts,
}

/// Unified application context passed to every command handler.
pub struct AppContext {
    /// Terminal output context (colors, quiet mode).
    pub output: OutputContext,
    /// Explicit config file path, if one was given.
    pub config_path: Option<PathBuf>,
    /// Limits for the SSH transport.
    pub timeouts: TransportTimeouts,
    /// Directory the build runs in and artifacts are written to.
    pub workdir: PathBuf,
}

impl AppContext {
    /// Construct an `AppContext` from top-level CLI flags.
    ///
    /// # Errors
    ///
    /// Returns an error if the current directory cannot be determined.
    pub fn new(flags: AppFlags) -> Result<Self> {
        Ok(Self {
            output: OutputContext::new(flags.output.no_color, flags.output.quiet),
            config_path: flags.config,
            timeouts: flags.timeouts,
            workdir: std::env::current_dir()?,
        })
    }
}

impl Confirmer for AppContext {
    /// Ask the user on the terminal. Defaults to "no".
    fn confirm(&self, prompt: &str) -> Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}
