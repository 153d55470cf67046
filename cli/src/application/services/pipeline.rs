//! Application service — fail-fast step runner.
//!
//! Runs an ordered step list against a [`StepExecutor`]. Step `i + 1` starts
//! only after step `i` succeeded; the first failure ends the run. Whatever
//! the outcome, the executor is asked to release held resources before the
//! runner returns.

use crate::domain::{DeployError, PipelineOutcome, Step};

/// Performs the work behind each [`Step`].
#[allow(async_fn_in_trait)]
pub trait StepExecutor {
    /// Execute `step`; `index` is its 1-based position, for progress output.
    async fn execute(&mut self, step: Step, index: usize) -> Result<(), DeployError>;

    /// Release anything still held (e.g. an open session).
    ///
    /// Called exactly once per run, on success and on failure. Must be a
    /// no-op when nothing is held.
    async fn release(&mut self);
}

/// Run `steps` in order, stopping at the first failure.
pub async fn run_steps(steps: &[Step], executor: &mut impl StepExecutor) -> PipelineOutcome {
    let mut outcome = PipelineOutcome::Succeeded;
    for (position, step) in steps.iter().copied().enumerate() {
        let index = position + 1;
        tracing::debug!(%step, index, "step started");
        if let Err(error) = executor.execute(step, index).await {
            tracing::warn!(%step, index, %error, "step failed, aborting run");
            outcome = PipelineOutcome::Failed { step: index, error };
            break;
        }
        tracing::debug!(%step, index, "step finished");
    }
    executor.release().await;
    outcome
}
