//! `TerminalReporter` — Presentation-layer implementation of `ProgressReporter`.
//!
//! Wraps `&OutputContext` and implements the `application::ports::ProgressReporter`
//! trait so application services can emit progress events without depending on
//! any presentation type directly.

use std::cell::RefCell;

use indicatif::ProgressBar;

use crate::application::ports::ProgressReporter;
use crate::output::{OutputContext, progress};

/// Terminal progress reporter that wraps an `OutputContext`.
///
/// - `step()` prints `"  → {message}"` (suppressed when `ctx.quiet`)
/// - `success()` prints `"  ✓ {message}"` (suppressed when `ctx.quiet`)
/// - `warn()` prints `"  ! {message}"` (suppressed when `ctx.quiet`)
/// - `begin_activity()` shows a spinner, only on a TTY
pub struct TerminalReporter<'a> {
    ctx: &'a OutputContext,
    spinner: RefCell<Option<ProgressBar>>,
}

impl<'a> TerminalReporter<'a> {
    /// Create a new `TerminalReporter` wrapping the given output context.
    #[must_use]
    pub fn new(ctx: &'a OutputContext) -> Self {
        Self {
            ctx,
            spinner: RefCell::new(None),
        }
    }

    fn suspend(&self, f: impl FnOnce()) {
        match self.spinner.borrow().as_ref() {
            Some(pb) => pb.suspend(f),
            None => f(),
        }
    }
}

impl ProgressReporter for TerminalReporter<'_> {
    fn step(&self, message: &str) {
        self.suspend(|| self.ctx.step(message));
    }

    fn success(&self, message: &str) {
        self.suspend(|| self.ctx.success(message));
    }

    fn warn(&self, message: &str) {
        self.suspend(|| self.ctx.warn(message));
    }

    fn begin_activity(&self, message: &str) {
        if !self.ctx.show_progress() {
            return;
        }
        let previous = self.spinner.replace(Some(progress::spinner(message)));
        if let Some(pb) = previous {
            progress::clear(&pb);
        }
    }

    fn end_activity(&self) {
        if let Some(pb) = self.spinner.take() {
            progress::clear(&pb);
        }
    }
}
