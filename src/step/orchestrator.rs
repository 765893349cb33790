//! Sequential step execution with fail-fast aggregation.

use anyhow::anyhow;

use super::{BuildContext, BuildResult, BuildStatus, Step, StepOutputs};
use crate::debug;

/// Runs an ordered list of steps against one [`BuildContext`].
///
/// Emitted files and warnings of completed steps are concatenated in step
/// order. The first failing step sets the aggregated error and stops the
/// remaining steps; the aggregation of the steps that did run is kept.
pub struct Orchestrator {
    steps: Vec<Box<dyn Step>>,
    state: RunState,
    last: Option<BuildResult>,
}

/// Execution state. `Done` is terminal: a finished orchestrator keeps its
/// aggregated result for later inspection and never re-executes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunState {
    Idle,
    Running(usize),
    Done(BuildStatus),
}

impl Orchestrator {
    pub fn new(steps: Vec<Box<dyn Step>>) -> Self {
        Self {
            steps,
            state: RunState::Idle,
            last: None,
        }
    }

    /// Execute the steps in order and return the aggregated result.
    ///
    /// Calling `run` again after termination returns the stored result
    /// without re-executing any step.
    pub async fn run(&mut self, ctx: &BuildContext) -> &BuildResult {
        if matches!(self.state, RunState::Done(_)) {
            debug!("step"; "orchestrator already finished, returning last result");
        } else {
            let aggregated = self.execute(ctx).await;
            self.state = RunState::Done(aggregated.status);
            self.last = Some(aggregated);
        }

        match &self.last {
            Some(result) => result,
            // Done is only ever entered after storing a result
            None => unreachable!("orchestrator terminated without a stored result"),
        }
    }

    async fn execute(&mut self, ctx: &BuildContext) -> BuildResult {
        let mut aggregated = BuildResult::success();
        let mut outputs = StepOutputs::default();
        let total = self.steps.len();

        for (i, step) in self.steps.iter().enumerate() {
            self.state = RunState::Running(i);
            debug!("step"; "running `{}` ({}/{})", step.name(), i + 1, total);

            match step.run(ctx, &outputs).await {
                Ok(outcome) => {
                    let result = outcome.result;
                    aggregated.emitted_files.extend(result.emitted_files);
                    aggregated.warnings.extend(result.warnings);

                    if result.status == BuildStatus::Error {
                        aggregated.status = BuildStatus::Error;
                        aggregated.error = Some(result.error.unwrap_or_else(|| {
                            anyhow!("step `{}` failed without reporting an error", step.name())
                        }));
                        break;
                    }

                    outputs.record(outcome.output);
                }
                Err(error) => {
                    aggregated.status = BuildStatus::Error;
                    aggregated.error =
                        Some(error.context(format!("step `{}` failed", step.name())));
                    break;
                }
            }
        }

        aggregated
    }

    /// Result of the most recent run, if the orchestrator has terminated.
    pub fn last_result(&self) -> Option<&BuildResult> {
        self.last.as_ref()
    }
}
